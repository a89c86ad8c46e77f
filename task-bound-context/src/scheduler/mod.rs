//! Cooperative scheduler wrapper.
//!
//! This module provides:
//! - EventLoop, a current-thread tokio runtime that runs futures as tasks
//! - Scheduler, a cloneable spawning handle with an installable task factory
//! - TaskFactory, the seam invoked on task creation and completion

mod config;
mod event_loop;
mod factory;

pub use config::SchedulerConfig;
pub use event_loop::{EventLoop, Scheduler};
pub use factory::{current_task, TaskFactory, TaskId};
