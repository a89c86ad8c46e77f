//! # Task Bound Context
//!
//! Per-task, per-kind context stacks for programs running on a
//! single-threaded cooperative scheduler.
//!
//! A context kind is pushed for the current task and read back from anywhere
//! in the call graph without threading it through arguments. Tasks spawned
//! while a context is active start with a copy of every stack as it stood at
//! spawn time, so siblings never see each other's changes:
//!
//! - **Scoped acquisition**: entering returns a guard that pops on drop
//! - **Value derivation**: the instance itself (`InstanceContext`), or a
//!   value derived synchronously or by a future
//! - **Inheritance**: a task factory copies stacks into each new task
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use task_bound_context::prelude::*;
//!
//! struct RequestId(String);
//!
//! impl TaskBoundContext for RequestId {}
//!
//! impl ContextValue for RequestId {
//!     type Value = String;
//!     fn value(&self) -> String {
//!         self.0.clone()
//!     }
//! }
//!
//! let event_loop = EventLoop::new()?;
//! let scheduler = event_loop.scheduler();
//! event_loop.run_until_complete(async move {
//!     let _request = RequestId("req-1".into()).enter_value();
//!     let child = scheduler.spawn(async { RequestId::current_value() });
//!     assert_eq!(child.await.unwrap()?, "req-1");
//!     Ok::<_, ContextError>(())
//! })??;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod context;
pub mod errors;
pub mod observability;
pub mod scheduler;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{
        install_task_factory, uninstall_task_factory, AsyncContextValue, ContextGuard,
        ContextInheritance, ContextValue, InstanceContext, StackSnapshot, TaskBoundContext,
        TaskKey,
    };
    pub use crate::errors::{ContextError, NoActiveContextError};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::scheduler::{EventLoop, Scheduler, SchedulerConfig, TaskFactory, TaskId};
}
