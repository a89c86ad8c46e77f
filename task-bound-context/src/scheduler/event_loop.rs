//! Single-threaded event loop and its spawning handle.

use super::{current_task, SchedulerConfig, TaskFactory, TaskId};
use crate::errors::ContextError;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::debug;

/// Owns a current-thread tokio runtime.
///
/// All tasks spawned through its [`Scheduler`] run on the thread that calls
/// [`EventLoop::run_until_complete`], interleaving only at `.await` points.
pub struct EventLoop {
    runtime: Runtime,
    scheduler: Scheduler,
}

impl EventLoop {
    /// Creates an event loop with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::Runtime` if the runtime cannot be built.
    pub fn new() -> Result<Self, ContextError> {
        Self::with_config(SchedulerConfig::default())
    }

    /// Creates an event loop from a configuration.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::Runtime` if the runtime cannot be built.
    pub fn with_config(config: SchedulerConfig) -> Result<Self, ContextError> {
        let mut builder = Builder::new_current_thread();
        if config.enable_time {
            builder.enable_time();
        }
        if let Some(ticks) = config.event_interval {
            builder.event_interval(ticks);
        }
        let runtime = builder.build()?;

        let scheduler = Scheduler::new(runtime.handle().clone());
        if config.inherit_context {
            crate::context::install_task_factory(&scheduler);
        }

        debug!(
            enable_time = config.enable_time,
            inherit_context = config.inherit_context,
            "Event loop created"
        );

        Ok(Self { runtime, scheduler })
    }

    /// Returns a handle for spawning tasks onto this loop.
    #[must_use]
    pub fn scheduler(&self) -> Scheduler {
        self.scheduler.clone()
    }

    /// Runs `future` as a task and blocks until it completes.
    ///
    /// The future is spawned through the scheduler, so it has its own task
    /// identity and starts with empty context stacks.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::Join` if the task panics or is cancelled.
    pub fn run_until_complete<F>(&self, future: F) -> Result<F::Output, ContextError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let handle = self.scheduler.spawn(future);
        Ok(self.runtime.block_on(handle)?)
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

/// Cloneable handle that creates tasks and runs the installed [`TaskFactory`].
#[derive(Clone)]
pub struct Scheduler {
    handle: Handle,
    factory: Arc<RwLock<Option<Arc<dyn TaskFactory>>>>,
}

impl Scheduler {
    /// Wraps the handle of a current-thread runtime with no factory
    /// installed.
    ///
    /// `spawn` relies on the child not being polled before the factory has
    /// run, which only a current-thread runtime guarantees.
    pub(crate) fn new(handle: Handle) -> Self {
        Self {
            handle,
            factory: Arc::new(RwLock::new(None)),
        }
    }

    /// Installs `factory`, replacing any previous one. `None` restores
    /// plain task creation.
    pub fn set_task_factory(&self, factory: Option<Arc<dyn TaskFactory>>) {
        debug!(installed = factory.is_some(), "Task factory replaced");
        *self.factory.write() = factory;
    }

    /// Returns the installed factory, if any.
    #[must_use]
    pub fn task_factory(&self) -> Option<Arc<dyn TaskFactory>> {
        self.factory.read().clone()
    }

    /// Creates a task running `future`.
    ///
    /// The installed factory is told about the new task before this returns,
    /// which on a current-thread runtime is before the task is first polled.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let factory = self.task_factory();
        let parent = current_task();
        let child_id = Arc::new(OnceLock::new());

        let notice = CompletionNotice {
            factory: factory.clone(),
            task: Arc::clone(&child_id),
        };
        let handle = self.handle.spawn(async move {
            let _notice = notice;
            future.await
        });

        let _ = child_id.set(handle.id());
        if let Some(factory) = factory {
            factory.task_created(parent, handle.id());
        }
        handle
    }

    /// Spawns every future as its own task and waits for all of them.
    ///
    /// Outputs are returned in input order.
    ///
    /// # Errors
    ///
    /// Returns the first `ContextError::Join` if any task panicked or was
    /// cancelled. All tasks are still awaited.
    pub async fn gather<I, F>(&self, futures: I) -> Result<Vec<F::Output>, ContextError>
    where
        I: IntoIterator<Item = F>,
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let handles: Vec<_> = futures.into_iter().map(|f| self.spawn(f)).collect();
        futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|result| result.map_err(ContextError::from))
            .collect()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("factory_installed", &self.factory.read().is_some())
            .finish()
    }
}

/// Reports task completion to the factory when the task's future is dropped.
struct CompletionNotice {
    factory: Option<Arc<dyn TaskFactory>>,
    task: Arc<OnceLock<TaskId>>,
}

impl Drop for CompletionNotice {
    fn drop(&mut self) {
        if let (Some(factory), Some(task)) = (&self.factory, self.task.get()) {
            factory.task_finished(*task);
        }
    }
}
