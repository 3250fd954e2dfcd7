//! Audit events and logging setup for taskweave.
//!
//! The dependency graph itself keeps no history. Instead it reports every
//! mutation as a [`GraphEvent`] to an optional [`EventSink`]; what happens to
//! the event is up to the sink:
//!
//! - [`TracingSink`] logs it under the `taskweave::graph` target
//! - [`MemorySink`] keeps an in-memory [`AuditRecord`] log
//! - [`ChannelSink`] forwards it to a tokio channel for another component
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taskweave_events::{MemorySink, logging::{init_tracing, TracingConfig}};
//!
//! init_tracing(TracingConfig::default())?;
//! let history = Arc::new(MemorySink::new());
//! let graph = DependencyGraph::new().with_event_sink(history.clone());
//! ```

pub mod error;
pub mod event;
pub mod logging;
pub mod metadata;
pub mod sink;

pub use error::{Error, Result};
pub use event::{AuditRecord, GraphEvent};
pub use metadata::{correlation_id, set_correlation_id};
pub use sink::{ChannelSink, EventSink, MemorySink, TracingSink};

// ============================================================================
// Emit Macros
// ============================================================================

/// Emit a task added event.
///
/// # Example
/// ```rust,ignore
/// emit_task_added!("build", 2.5_f64, None::<String>);
/// ```
#[macro_export]
macro_rules! emit_task_added {
    ($id:expr, $cost:expr, $parent:expr) => {
        ::tracing::info!(
            target: "taskweave::graph",
            event_type = "graph.task_added",
            task_id = %$id,
            cost = $cost,
            parent = ?$parent,
        )
    };
}

/// Emit a task removed event.
#[macro_export]
macro_rules! emit_task_removed {
    ($id:expr) => {
        ::tracing::info!(
            target: "taskweave::graph",
            event_type = "graph.task_removed",
            task_id = %$id,
        )
    };
}

/// Emit a dependency added event.
///
/// # Example
/// ```rust,ignore
/// emit_dependency_added!("build", "test", 2.5_f64);
/// ```
#[macro_export]
macro_rules! emit_dependency_added {
    ($from:expr, $to:expr, $weight:expr) => {
        ::tracing::info!(
            target: "taskweave::graph",
            event_type = "graph.dependency_added",
            from = %$from,
            to = %$to,
            weight = $weight,
        )
    };
}

/// Emit a dependency removed event.
#[macro_export]
macro_rules! emit_dependency_removed {
    ($from:expr, $to:expr) => {
        ::tracing::info!(
            target: "taskweave::graph",
            event_type = "graph.dependency_removed",
            from = %$from,
            to = %$to,
        )
    };
}

/// Emit a task decomposed event.
#[macro_export]
macro_rules! emit_task_decomposed {
    ($parent:expr, $subtasks:expr) => {
        ::tracing::info!(
            target: "taskweave::graph",
            event_type = "graph.task_decomposed",
            parent = %$parent,
            subtasks = ?$subtasks,
        )
    };
}
