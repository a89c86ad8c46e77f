//! Error types for task-bound contexts.
//!
//! The only failure a context query can produce is [`NoActiveContextError`].
//! The remaining variants come from the scheduler wrapper.

use thiserror::Error;

/// The main error type for task-bound context operations.
#[derive(Debug, Error)]
pub enum ContextError {
    /// A `current` query found an empty stack.
    #[error("{0}")]
    NoActiveContext(#[from] NoActiveContextError),

    /// The top context is still deriving its value asynchronously.
    ///
    /// Only reachable while that instance's own `enter_async` is running,
    /// from code its derivation calls or tasks spawned meanwhile. Every
    /// other empty lookup is `NoActiveContext`.
    #[error("Context value for {kind} is still being resolved")]
    ValueUnresolved {
        /// Name of the context kind.
        kind: &'static str,
    },

    /// A spawned task panicked or was cancelled.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The runtime could not be built.
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl ContextError {
    /// Returns true if this is a "no active context" failure.
    #[must_use]
    pub fn is_no_active_context(&self) -> bool {
        matches!(self, Self::NoActiveContext(_))
    }
}

/// Error raised when a context kind has nothing pushed in the calling task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No context active for {kind} in {task}")]
pub struct NoActiveContextError {
    /// Name of the context kind that was queried.
    pub kind: &'static str,
    /// The task the query ran in.
    pub task: String,
}

impl NoActiveContextError {
    /// Creates a new error for the given kind and task description.
    #[must_use]
    pub fn new(kind: &'static str, task: impl Into<String>) -> Self {
        Self {
            kind,
            task: task.into(),
        }
    }
}
