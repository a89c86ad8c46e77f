//! Task factory that hands each new task a copy of its parent's stacks.

use super::registry;
use crate::scheduler::{Scheduler, TaskFactory, TaskId};
use std::sync::Arc;
use tracing::debug;

/// Copies the spawning task's context stacks into every new task.
///
/// Tasks spawned from outside any task start empty. A task's stacks are
/// released once it finishes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextInheritance;

impl ContextInheritance {
    /// Creates the factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TaskFactory for ContextInheritance {
    fn task_created(&self, parent: Option<TaskId>, child: TaskId) {
        if let Some(parent) = parent {
            registry::inherit(parent, child);
        }
    }

    fn task_finished(&self, task: TaskId) {
        registry::release(task);
    }
}

/// Installs [`ContextInheritance`] on `scheduler`, replacing any prior hook.
pub fn install_task_factory(scheduler: &Scheduler) {
    scheduler.set_task_factory(Some(Arc::new(ContextInheritance::new())));
    debug!("Context inheritance installed");
}

/// Removes any task factory, so new tasks start with empty stacks.
pub fn uninstall_task_factory(scheduler: &Scheduler) {
    scheduler.set_task_factory(None);
    debug!("Context inheritance removed");
}
