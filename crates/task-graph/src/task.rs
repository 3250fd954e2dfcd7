//! Task records stored in the dependency graph.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique, immutable task identifier.
///
/// Identifiers order lexicographically, which is the default tie-break for
/// critical path selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Create an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One unit of work.
///
/// The graph never mutates a registered task. Re-estimating a cost means
/// removing the task and adding it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier.
    pub id: TaskId,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Estimated execution cost in seconds.
    pub cost: f64,
    /// Task this one was decomposed from. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TaskId>,
}

impl Task {
    /// Create a task with an empty description and no parent.
    #[must_use]
    pub fn new(id: impl Into<TaskId>, cost: f64) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            cost,
            parent: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the parent task.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<TaskId>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Whether a cost or weight is usable: finite and non-negative.
pub(crate) fn is_valid_cost(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_task_id_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(TaskId::from("build"), 1);
        assert_eq!(map.get("build"), Some(&1));
    }

    #[test]
    fn test_task_id_ordering_is_lexicographic() {
        let mut ids = vec![TaskId::from("b"), TaskId::from("a10"), TaskId::from("a2")];
        ids.sort();
        assert_eq!(ids, vec![TaskId::from("a10"), TaskId::from("a2"), TaskId::from("b")]);
    }

    #[test]
    fn test_builder() {
        let task = Task::new("compile", 3.0)
            .with_description("Compile sources")
            .with_parent("build");
        assert_eq!(task.id.as_str(), "compile");
        assert_eq!(task.description, "Compile sources");
        assert_eq!(task.parent, Some(TaskId::from("build")));
    }

    #[test]
    fn test_deserialize_defaults() {
        let task: Task = serde_json::from_str(r#"{"id": "lint", "cost": 0.5}"#).unwrap();
        assert_eq!(task, Task::new("lint", 0.5));
    }

    #[test]
    fn test_cost_validity() {
        assert!(is_valid_cost(0.0));
        assert!(is_valid_cost(-0.0));
        assert!(is_valid_cost(12.5));
        assert!(!is_valid_cost(-0.1));
        assert!(!is_valid_cost(f64::NAN));
        assert!(!is_valid_cost(f64::INFINITY));
    }
}
