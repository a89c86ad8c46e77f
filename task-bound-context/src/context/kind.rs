//! Context kinds and their scoped acquisition.
//!
//! A context kind is any type implementing [`TaskBoundContext`]. Each kind
//! gets its own stack per task. The value handed out on entry and by
//! `current` is chosen by which trait the kind implements:
//!
//! - [`InstanceContext`]: the instance itself, as `Arc<Self>`.
//! - [`ContextValue`]: the result of a synchronous `value()`.
//! - [`AsyncContextValue`]: the result of an `async` `value()`, derived
//!   once on entry.
//!
//! A kind should implement exactly one of these. Each one carries its own
//! entry methods, so a kind with a derived value cannot be entered without
//! deriving it.

use super::guard::ContextGuard;
use super::registry;
use crate::errors::{ContextError, NoActiveContextError};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Base trait for every context kind.
pub trait TaskBoundContext: Send + Sync + Sized + 'static {
    /// Name used in errors and logs.
    fn kind_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the innermost instance entered by the calling task.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::NoActiveContext` if the calling task has no
    /// instance of this kind, either pushed or inherited.
    fn current() -> Result<Arc<Self>, ContextError> {
        let frame = registry::top::<Self>(Self::kind_name())?;
        frame.context::<Self>().ok_or_else(|| {
            NoActiveContextError::new(Self::kind_name(), registry::TaskKey::current().to_string())
                .into()
        })
    }

    /// Returns how many instances of this kind the calling task holds.
    fn depth() -> usize {
        registry::depth::<Self>()
    }

    /// Returns true if the calling task holds at least one instance.
    fn is_active() -> bool {
        Self::depth() > 0
    }
}

/// A context kind whose value is the instance itself.
///
/// Kinds that derive a value implement [`ContextValue`] or
/// [`AsyncContextValue`] instead, and have no `enter`:
///
/// ```compile_fail
/// use task_bound_context::prelude::*;
///
/// struct Derived;
/// impl TaskBoundContext for Derived {}
/// impl ContextValue for Derived {
///     type Value = u8;
///     fn value(&self) -> u8 {
///         1
///     }
/// }
///
/// let _guard = Derived.enter();
/// ```
pub trait InstanceContext: TaskBoundContext {
    /// Pushes `self` onto the calling task's stack for this kind.
    ///
    /// The guard pops it again when dropped.
    fn enter(self) -> ContextGuard<Self, Arc<Self>> {
        let context = Arc::new(self);
        let (token, _) = registry::push(Self::kind_name(), Arc::clone(&context));
        ContextGuard::new(token, Arc::clone(&context), context)
    }

    /// Runs `f` with `self` entered, exiting afterwards.
    fn scope<R, F>(self, f: F) -> R
    where
        F: FnOnce(&Arc<Self>) -> R,
    {
        let guard = self.enter();
        f(guard.value())
    }
}

/// A context kind whose value is derived synchronously.
pub trait ContextValue: TaskBoundContext {
    /// The derived value.
    type Value: Clone + Send + Sync + 'static;

    /// Derives the value from this instance.
    fn value(&self) -> Self::Value;

    /// Pushes `self` and returns a guard holding the derived value.
    fn enter_value(self) -> ContextGuard<Self, Self::Value> {
        let context = Arc::new(self);
        let (token, _) = registry::push(Self::kind_name(), Arc::clone(&context));
        let value = context.value();
        ContextGuard::new(token, context, value)
    }

    /// Runs `f` with the derived value while `self` is entered.
    fn scope_value<R, F>(self, f: F) -> R
    where
        F: FnOnce(&Self::Value) -> R,
    {
        let guard = self.enter_value();
        f(guard.value())
    }

    /// Derives the value of the innermost instance for the calling task.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::NoActiveContext` if nothing is entered.
    fn current_value() -> Result<Self::Value, ContextError> {
        Ok(Self::current()?.value())
    }
}

/// A context kind whose value is derived by a future.
///
/// The instance is pushed before the derivation starts, so anything running
/// while it is suspended already sees it via [`TaskBoundContext::current`].
#[async_trait]
pub trait AsyncContextValue: TaskBoundContext {
    /// The derived value.
    type Value: Clone + Send + Sync + 'static;

    /// Derives the value from this instance.
    async fn value(&self) -> Self::Value;

    /// Pushes `self`, awaits its value and returns a guard holding it.
    ///
    /// If this future is dropped before the value is ready, the push is
    /// undone, and tasks spawned in the meantime stop seeing the instance.
    async fn enter_async(self) -> ContextGuard<Self, Self::Value> {
        let context = Arc::new(self);
        let (token, frame) = registry::push_deferred(Self::kind_name(), Arc::clone(&context));
        let value = context.value().await;
        frame.resolve(value.clone());
        ContextGuard::new(token, context, value)
    }

    /// Awaits `f` with the derived value while `self` is entered.
    async fn scope_async<R, F, Fut>(self, f: F) -> R
    where
        F: FnOnce(Self::Value) -> Fut + Send,
        Fut: Future<Output = R> + Send,
        R: Send,
    {
        let guard = self.enter_async().await;
        let result = f(guard.value().clone()).await;
        drop(guard);
        result
    }

    /// Returns the value derived on entry by the innermost instance.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::NoActiveContext` if nothing is entered.
    ///
    /// Returns `ContextError::ValueUnresolved` only while the innermost
    /// instance's own `value()` is still running, which is observable from
    /// code that `value()` itself calls or from tasks it spawns. Once
    /// `enter_async` returns the value is always resolved; if it is dropped
    /// first, the instance disappears and lookups fall through to the
    /// instance beneath it.
    fn current_value() -> Result<Self::Value, ContextError> {
        registry::top::<Self>(Self::kind_name())?
            .resolved::<Self::Value>()
            .ok_or(ContextError::ValueUnresolved {
                kind: Self::kind_name(),
            })
    }
}
