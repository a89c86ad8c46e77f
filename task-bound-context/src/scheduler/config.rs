//! Configuration for the event loop.

/// Settings used to build an [`EventLoop`](super::EventLoop).
///
/// The loop runs on whichever thread calls `run_until_complete`, so there is
/// no worker thread to name or size.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Whether the tokio timer driver is enabled.
    pub enable_time: bool,
    /// Whether context inheritance is installed at construction.
    pub inherit_context: bool,
    /// Number of scheduler ticks between polls for external events.
    pub event_interval: Option<u32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enable_time: true,
            inherit_context: true,
            event_interval: None,
        }
    }
}

impl SchedulerConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the timer driver.
    #[must_use]
    pub fn with_time(mut self, enable: bool) -> Self {
        self.enable_time = enable;
        self
    }

    /// Controls whether context inheritance is installed up front.
    #[must_use]
    pub fn with_inherit_context(mut self, inherit: bool) -> Self {
        self.inherit_context = inherit;
        self
    }

    /// Sets the event interval.
    #[must_use]
    pub fn with_event_interval(mut self, ticks: u32) -> Self {
        self.event_interval = Some(ticks);
        self
    }
}
