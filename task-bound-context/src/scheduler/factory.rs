//! The task-creation seam.

/// Opaque identity of a running or suspended task.
pub type TaskId = tokio::task::Id;

/// Returns the identity of the task currently being polled, if any.
///
/// `None` means the caller is the outermost driver rather than a task.
#[must_use]
pub fn current_task() -> Option<TaskId> {
    tokio::task::try_id()
}

/// Hook invoked by the [`Scheduler`](super::Scheduler) around task creation.
///
/// The scheduler creates the task itself and then reports the identities
/// involved, so implementations never need to know how tasks are built.
pub trait TaskFactory: Send + Sync {
    /// Called after `child` has been created, before it is first polled.
    ///
    /// `parent` is the task that requested the spawn, or `None` when the
    /// spawn came from outside any task.
    fn task_created(&self, parent: Option<TaskId>, child: TaskId);

    /// Called once `task` has finished, been cancelled, or panicked.
    fn task_finished(&self, _task: TaskId) {}
}
