//! Serialisable view of a task's context stacks, for diagnostics.

use super::registry::{self, TaskKey};
use serde::{Deserialize, Serialize};

/// Depth of one kind's stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindDepth {
    /// The context kind's name.
    pub kind: String,
    /// Number of entered instances.
    pub depth: usize,
}

/// The stacks held by one task at the time of capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StackSnapshot {
    /// The task the snapshot was taken in.
    pub task: String,
    /// Non-empty stacks, sorted by kind name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stacks: Vec<KindDepth>,
}

impl StackSnapshot {
    /// Captures the calling task's stacks.
    #[must_use]
    pub fn capture() -> Self {
        Self::capture_for(TaskKey::current())
    }

    /// Captures the stacks held for `key`.
    #[must_use]
    pub fn capture_for(key: TaskKey) -> Self {
        let stacks = registry::stack_depths(key)
            .into_iter()
            .map(|(kind, depth)| KindDepth {
                kind: kind.to_string(),
                depth,
            })
            .collect();
        Self {
            task: key.to_string(),
            stacks,
        }
    }

    /// Returns the depth recorded for `kind`, or 0.
    #[must_use]
    pub fn depth_of(&self, kind: &str) -> usize {
        self.stacks
            .iter()
            .find(|entry| entry.kind == kind)
            .map_or(0, |entry| entry.depth)
    }

    /// Returns true if no kind has anything entered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Serialises the snapshot as JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Returns true if the registry still holds stacks for `key`.
#[must_use]
pub fn is_tracked(key: TaskKey) -> bool {
    registry::is_tracked(key)
}
