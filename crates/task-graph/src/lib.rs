//! Task dependency graph with level scheduling and critical path analysis.
//!
//! This crate keeps a directed acyclic graph of cost-annotated tasks and
//! answers the questions a planner asks of it: is it acyclic, in what order
//! can the tasks run, which tasks can run in parallel, and which chain of
//! dependencies bounds the total duration.
//!
//! # Key Types
//!
//! - [`DependencyGraph`]: Task registry and dependency edges, plus every analysis
//! - [`Task`] / [`TaskId`]: The unit of work and its identifier
//! - [`ExecutionPlan`]: Tasks grouped into levels that can run in parallel
//! - [`CriticalPath`] / [`Schedule`]: The costliest chain and per-task slack
//! - [`Decomposer`]: Source of subtasks, validated before they are accepted
//! - [`SharedGraph`]: Lock-guarded handle for concurrent construction
//!
//! # Example
//!
//! ```ignore
//! use taskweave_task_graph::{DependencyGraph, Task};
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_task(Task::new("fetch", 2.0))?;
//! graph.add_task(Task::new("build", 3.0))?;
//! graph.add_task(Task::new("lint", 1.0))?;
//! graph.add_dependency("fetch", "build", None)?;
//! graph.add_dependency("fetch", "lint", None)?;
//!
//! // [["fetch"], ["build", "lint"]]
//! let levels = graph.levels()?;
//!
//! // fetch -> build, total 2.0 (edge weights default to the source cost)
//! let path = graph.critical_path()?;
//! ```

mod config;
mod critical_path;
mod decompose;
mod error;
mod graph;
mod levels;
mod shared;
mod task;
mod validation;

pub use config::{AnalysisOptions, COST_MODEL_ENV, CostModel, TIE_BREAK_ENV, TieBreak};
pub use critical_path::{CriticalPath, SLACK_EPSILON, Schedule, TaskTiming};
pub use decompose::{Decomposer, Decomposition, DependencySpec};
pub use error::{Error, Result};
pub use graph::{Dependency, DependencyGraph};
pub use levels::{ExecutionPlan, Levels};
pub use shared::SharedGraph;
pub use task::{Task, TaskId};
pub use validation::ValidationResult;

pub use taskweave_events::{EventSink, GraphEvent};
