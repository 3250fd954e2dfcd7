//! Error types for task graph operations.

use crate::TaskId;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for task graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during task graph operations.
///
/// None of these are retried or corrected by the graph; the caller decides
/// how to recover (for example by dropping the edge that closed a cycle).
#[derive(Error, Debug, Clone, PartialEq, Diagnostic)]
pub enum Error {
    /// A task with this identifier is already registered.
    #[error("Task '{id}' is already registered")]
    #[diagnostic(
        code(taskweave::graph::duplicate_task),
        help("Remove the existing task first if it needs to be re-estimated")
    )]
    DuplicateTask {
        /// The duplicated identifier.
        id: TaskId,
    },

    /// An operation referenced a task that is not registered.
    #[error("Task '{id}' is not registered")]
    #[diagnostic(
        code(taskweave::graph::unknown_task),
        help("Register every task with add_task before declaring dependencies on it")
    )]
    UnknownTask {
        /// The unknown identifier.
        id: TaskId,
    },

    /// A task was declared to depend on itself.
    #[error("Task '{id}' cannot depend on itself")]
    #[diagnostic(code(taskweave::graph::self_dependency))]
    SelfDependency {
        /// The offending identifier.
        id: TaskId,
    },

    /// An ordering operation was invoked on a graph containing a cycle.
    #[error("Cycle detected in task graph: {}", format_cycle(cycle))]
    #[diagnostic(
        code(taskweave::graph::cyclic_graph),
        help("Remove one of the dependencies along the cycle and retry")
    )]
    CyclicGraph {
        /// Task identifiers along the cycle; the last one depends back on the first.
        cycle: Vec<TaskId>,
    },

    /// A cost or edge weight was negative or not a finite number.
    #[error("Invalid cost {value} for task '{id}': costs must be finite and non-negative")]
    #[diagnostic(code(taskweave::graph::invalid_cost))]
    InvalidCost {
        /// The task the cost belongs to (the source task for edge weights).
        id: TaskId,
        /// The rejected value.
        value: f64,
    },

    /// A configuration value could not be parsed.
    #[error("Invalid value '{value}' for {key}")]
    #[diagnostic(
        code(taskweave::graph::invalid_config),
        help(
            "Cost models: on-exit, inclusive. Tie-breaks: lexicographic, insertion-order"
        )
    )]
    InvalidConfig {
        /// Configuration key (environment variable name).
        key: String,
        /// The rejected value.
        value: String,
    },

    /// A shared graph lock was poisoned by a panicking writer.
    #[error("Shared task graph lock is poisoned")]
    #[diagnostic(code(taskweave::graph::lock_poisoned))]
    LockPoisoned,
}

fn format_cycle(cycle: &[TaskId]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(TaskId::as_str).collect();
    if let Some(first) = cycle.first() {
        parts.push(first.as_str());
    }
    parts.join(" -> ")
}
