//! Task-bound context stacks.
//!
//! This module provides:
//! - Context kind traits with synchronous and asynchronous value derivation
//! - Guards that push on entry and pop on drop
//! - The task factory that copies stacks into newly spawned tasks
//! - Snapshots of a task's stacks for diagnostics

mod guard;
mod inherit;
mod kind;
mod registry;
mod snapshot;

pub use guard::ContextGuard;
pub use inherit::{install_task_factory, uninstall_task_factory, ContextInheritance};
pub use kind::{AsyncContextValue, ContextValue, InstanceContext, TaskBoundContext};
pub use registry::TaskKey;
pub use snapshot::{is_tracked, KindDepth, StackSnapshot};
