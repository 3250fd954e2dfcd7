//! Event type definitions for the taskweave audit trail.
//!
//! Graph mutations are described by [`GraphEvent`]. Sinks wrap them in an
//! [`AuditRecord`] carrying an identifier, timestamp and correlation ID.

use crate::metadata::correlation_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded graph event with full metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// Correlation ID shared by all records of this process.
    pub correlation_id: Uuid,
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// The event itself.
    pub event: GraphEvent,
}

impl AuditRecord {
    /// Wrap an event using the process-wide correlation ID.
    #[must_use]
    pub fn new(event: GraphEvent) -> Self {
        Self::with_correlation_id(correlation_id(), event)
    }

    /// Wrap an event with an explicit correlation ID.
    #[must_use]
    pub fn with_correlation_id(correlation_id: Uuid, event: GraphEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            correlation_id,
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Mutations of a dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum GraphEvent {
    /// A task was registered.
    TaskAdded {
        /// Task identifier.
        id: String,
        /// Estimated cost in seconds.
        cost: f64,
        /// Parent task, if the task came from a decomposition.
        parent: Option<String>,
    },
    /// A task and its incident edges were removed.
    TaskRemoved {
        /// Task identifier.
        id: String,
    },
    /// A dependency edge was declared (or its weight replaced).
    DependencyAdded {
        /// Task that must complete first.
        from: String,
        /// Task that waits on `from`.
        to: String,
        /// Edge weight used by critical path analysis.
        weight: f64,
    },
    /// A dependency edge was dropped.
    DependencyRemoved {
        /// Source task.
        from: String,
        /// Target task.
        to: String,
    },
    /// A decomposition was accepted for a parent task.
    TaskDecomposed {
        /// The decomposed task.
        parent: String,
        /// Accepted subtasks, in proposal order.
        subtasks: Vec<String>,
    },
}

impl GraphEvent {
    /// Stable dotted name used as the `event_type` field when logging.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::TaskAdded { .. } => "graph.task_added",
            Self::TaskRemoved { .. } => "graph.task_removed",
            Self::DependencyAdded { .. } => "graph.dependency_added",
            Self::DependencyRemoved { .. } => "graph.dependency_removed",
            Self::TaskDecomposed { .. } => "graph.task_decomposed",
        }
    }
}
