//! Process-wide stack registry keyed by task identity and context kind.

use crate::errors::{ContextError, NoActiveContextError};
use crate::scheduler::{current_task, TaskId};
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::ThreadId;
use tracing::{debug, trace, warn};

/// Identifies whose stacks a registry operation touches.
///
/// Code running outside any task is keyed by its thread, so drivers on
/// different threads never share stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    /// A task created by the scheduler.
    Task(TaskId),
    /// The outermost driver on a thread.
    Driver(ThreadId),
}

impl TaskKey {
    /// Returns the key for the caller.
    #[must_use]
    pub fn current() -> Self {
        current_task().map_or_else(|| Self::Driver(std::thread::current().id()), Self::Task)
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(id) => write!(f, "task {id}"),
            Self::Driver(_) => write!(f, "root"),
        }
    }
}

/// One pushed context instance.
pub(crate) struct Frame {
    kind: &'static str,
    context: Arc<dyn Any + Send + Sync>,
    resolved: OnceLock<Arc<dyn Any + Send + Sync>>,
    /// Set for frames whose value is derived after the push.
    deferred: bool,
    /// Set when a deferred frame was exited before its value was ready.
    abandoned: AtomicBool,
}

impl Frame {
    fn new(kind: &'static str, context: Arc<dyn Any + Send + Sync>, deferred: bool) -> Self {
        Self {
            kind,
            context,
            resolved: OnceLock::new(),
            deferred,
            abandoned: AtomicBool::new(false),
        }
    }

    pub(crate) fn context<C: Any + Send + Sync>(&self) -> Option<Arc<C>> {
        Arc::clone(&self.context).downcast::<C>().ok()
    }

    /// Records the asynchronously derived value. Only the first call sticks.
    pub(crate) fn resolve<V: Any + Send + Sync>(&self, value: V) {
        let _ = self.resolved.set(Arc::new(value));
    }

    pub(crate) fn resolved<V: Any + Clone>(&self) -> Option<V> {
        self.resolved.get()?.downcast_ref::<V>().cloned()
    }

    /// False once the instance can no longer become active anywhere.
    ///
    /// Tasks that inherited a deferred frame keep their copy after the
    /// entering task gives up on it; lookups skip such copies.
    fn is_live(&self) -> bool {
        !self.abandoned.load(Ordering::Acquire)
    }

    fn abandon_if_unresolved(&self) {
        if self.deferred && self.resolved.get().is_none() {
            self.abandoned.store(true, Ordering::Release);
        }
    }
}

/// Stacks belonging to one task, one per kind.
type TaskStacks = HashMap<TypeId, Vec<Arc<Frame>>>;

fn registry() -> &'static Mutex<HashMap<TaskKey, TaskStacks>> {
    static REGISTRY: OnceLock<Mutex<HashMap<TaskKey, TaskStacks>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Pops its frame when dropped.
///
/// The owning task is captured at push time so the pop lands on the right
/// stack even if the drop happens during cancellation.
pub(crate) struct FrameToken {
    key: TaskKey,
    kind: TypeId,
    kind_name: &'static str,
    frame: Arc<Frame>,
}

impl FrameToken {
    pub(crate) fn key(&self) -> TaskKey {
        self.key
    }
}

impl Drop for FrameToken {
    fn drop(&mut self) {
        self.frame.abandon_if_unresolved();
        let popped = pop(self.key, self.kind);
        match popped {
            Some(_) => trace!(kind = self.kind_name, task = %self.key, "Context exited"),
            None => warn!(
                kind = self.kind_name,
                task = %self.key,
                "Context exit found no stack to pop"
            ),
        }
    }
}

/// Pushes `context` onto the caller's stack for kind `C`.
pub(crate) fn push<C: Any + Send + Sync>(
    kind_name: &'static str,
    context: Arc<C>,
) -> (FrameToken, Arc<Frame>) {
    push_frame(kind_name, context, false)
}

/// Like [`push`], for an instance whose value is resolved later.
///
/// If the token drops before [`Frame::resolve`] is called, copies of the
/// frame inherited by other tasks stop counting as active.
pub(crate) fn push_deferred<C: Any + Send + Sync>(
    kind_name: &'static str,
    context: Arc<C>,
) -> (FrameToken, Arc<Frame>) {
    push_frame(kind_name, context, true)
}

fn push_frame<C: Any + Send + Sync>(
    kind_name: &'static str,
    context: Arc<C>,
    deferred: bool,
) -> (FrameToken, Arc<Frame>) {
    let key = TaskKey::current();
    let kind = TypeId::of::<C>();
    let frame = Arc::new(Frame::new(kind_name, context, deferred));

    let depth = {
        let mut tasks = registry().lock();
        let stack = tasks.entry(key).or_default().entry(kind).or_default();
        stack.push(Arc::clone(&frame));
        stack.len()
    };
    trace!(kind = kind_name, task = %key, depth, deferred, "Context entered");

    (
        FrameToken {
            key,
            kind,
            kind_name,
            frame: Arc::clone(&frame),
        },
        frame,
    )
}

fn pop(key: TaskKey, kind: TypeId) -> Option<Arc<Frame>> {
    let mut tasks = registry().lock();
    let stacks = tasks.get_mut(&key)?;
    let stack = stacks.get_mut(&kind)?;
    let frame = stack.pop();
    if stack.is_empty() {
        stacks.remove(&kind);
    }
    if stacks.is_empty() {
        tasks.remove(&key);
    }
    frame
}

/// Returns the caller's top frame for kind `C`.
pub(crate) fn top<C: Any>(kind_name: &'static str) -> Result<Arc<Frame>, ContextError> {
    let key = TaskKey::current();
    registry()
        .lock()
        .get(&key)
        .and_then(|stacks| stacks.get(&TypeId::of::<C>()))
        .and_then(|stack| stack.iter().rev().find(|frame| frame.is_live()).cloned())
        .ok_or_else(|| NoActiveContextError::new(kind_name, key.to_string()).into())
}

/// Returns how many frames of kind `C` the caller has.
pub(crate) fn depth<C: Any>() -> usize {
    let key = TaskKey::current();
    registry()
        .lock()
        .get(&key)
        .and_then(|stacks| stacks.get(&TypeId::of::<C>()))
        .map_or(0, |stack| live_len(stack))
}

fn live_len(stack: &[Arc<Frame>]) -> usize {
    stack.iter().filter(|frame| frame.is_live()).count()
}

/// Copies every stack of `parent` under `child`.
///
/// Frames are shared, the vectors are not, so later pushes and pops on
/// either side stay invisible to the other. Abandoned frames are left out.
pub(crate) fn inherit(parent: TaskId, child: TaskId) {
    let mut tasks = registry().lock();
    let Some(stacks) = tasks.get(&TaskKey::Task(parent)) else {
        return;
    };
    let copy: TaskStacks = stacks
        .iter()
        .map(|(kind, stack)| {
            let live: Vec<_> = stack.iter().filter(|frame| frame.is_live()).cloned().collect();
            (*kind, live)
        })
        .filter(|(_, stack)| !stack.is_empty())
        .collect();
    if copy.is_empty() {
        return;
    }
    let kinds = copy.len();
    tasks.insert(TaskKey::Task(child), copy);
    drop(tasks);

    debug!(parent = %parent, child = %child, kinds, "Context stacks inherited");
}

/// Drops every stack held for `task`.
pub(crate) fn release(task: TaskId) {
    let removed = registry().lock().remove(&TaskKey::Task(task));
    if let Some(stacks) = removed {
        let frames: usize = stacks.values().map(Vec::len).sum();
        debug!(task = %task, frames, "Context stacks released");
    }
}

/// Lists `(kind name, depth)` for every stack of `key`, sorted by name.
pub(crate) fn stack_depths(key: TaskKey) -> Vec<(&'static str, usize)> {
    let mut depths: Vec<_> = registry()
        .lock()
        .get(&key)
        .map(|stacks| {
            stacks
                .values()
                .filter_map(|stack| {
                    let depth = live_len(stack);
                    let frame = stack.first()?;
                    (depth > 0).then_some((frame.kind, depth))
                })
                .collect()
        })
        .unwrap_or_default();
    depths.sort_unstable();
    depths
}

/// Returns true if the registry holds anything for `key`.
pub(crate) fn is_tracked(key: TaskKey) -> bool {
    registry().lock().contains_key(&key)
}
