//! Scoped acquisition guard.

use super::registry::{FrameToken, TaskKey};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Keeps a context pushed for as long as it lives.
///
/// Dropping the guard pops the context from the stack of the task that
/// entered it. This happens on every exit path: normal scope end, early
/// return, `?`, panic unwinding, and cancellation of the owning task.
///
/// The guard dereferences to the value produced on entry.
#[must_use = "the context is exited as soon as the guard is dropped"]
pub struct ContextGuard<C, V> {
    context: Arc<C>,
    value: V,
    token: FrameToken,
}

impl<C, V> ContextGuard<C, V> {
    pub(crate) fn new(token: FrameToken, context: Arc<C>, value: V) -> Self {
        Self {
            context,
            value,
            token,
        }
    }

    /// Returns the value produced on entry.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the pushed context instance.
    pub fn context(&self) -> &Arc<C> {
        &self.context
    }

    /// Returns the task whose stack holds this context.
    pub fn task(&self) -> TaskKey {
        self.token.key()
    }

    /// Exits the context now, returning the entry value.
    pub fn exit(self) -> V {
        let Self { value, token, .. } = self;
        drop(token);
        value
    }
}

impl<C, V> Deref for ContextGuard<C, V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.value
    }
}

impl<C, V: fmt::Debug> fmt::Debug for ContextGuard<C, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextGuard")
            .field("kind", &std::any::type_name::<C>())
            .field("task", &self.token.key())
            .field("value", &self.value)
            .finish()
    }
}
