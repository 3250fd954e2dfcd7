//! Intake of task decompositions proposed by an external collaborator.
//!
//! This module provides the [`Decomposer`] trait and the [`Decomposition`]
//! proposal it returns. Proposals are validated against the graph invariants
//! and committed all at once, or not at all.

use crate::{DependencyGraph, Error, Result, Task, TaskId};
use std::sync::Arc;
use taskweave_events::{GraphEvent, MemorySink};
use tracing::debug;

/// A dependency edge inside a decomposition proposal.
///
/// Either end may name a proposed subtask or a task already in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencySpec {
    /// Task that must complete first.
    pub from: TaskId,
    /// Task that waits on `from`.
    pub to: TaskId,
    /// Explicit weight; defaults to the cost of `from`.
    pub weight: Option<f64>,
}

impl DependencySpec {
    /// Edge with the default weight.
    #[must_use]
    pub fn new(from: impl Into<TaskId>, to: impl Into<TaskId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            weight: None,
        }
    }

    /// Set an explicit weight.
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// Subtasks and dependencies proposed for one parent task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decomposition {
    /// New tasks. Their `parent` is overwritten with the decomposed task.
    pub subtasks: Vec<Task>,
    /// Edges among subtasks and existing tasks.
    pub dependencies: Vec<DependencySpec>,
}

impl Decomposition {
    /// Create an empty proposal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subtask.
    #[must_use]
    pub fn subtask(mut self, task: Task) -> Self {
        self.subtasks.push(task);
        self
    }

    /// Add a dependency.
    #[must_use]
    pub fn dependency(mut self, spec: DependencySpec) -> Self {
        self.dependencies.push(spec);
        self
    }

    /// Check if the proposal adds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subtasks.is_empty() && self.dependencies.is_empty()
    }
}

/// Source of candidate subtasks for a task.
///
/// Implementations are opaque to the graph: their output is checked like any
/// other caller input before it is accepted.
///
/// # Example
///
/// ```ignore
/// struct SplitInHalves;
///
/// impl Decomposer for SplitInHalves {
///     fn decompose(&self, task: &Task) -> Decomposition {
///         let half = task.cost / 2.0;
///         let first = format!("{}.1", task.id);
///         let second = format!("{}.2", task.id);
///         Decomposition::new()
///             .subtask(Task::new(first.as_str(), half))
///             .subtask(Task::new(second.as_str(), half))
///             .dependency(DependencySpec::new(first.as_str(), second.as_str()))
///     }
/// }
/// ```
pub trait Decomposer {
    /// Propose zero or more subtasks for `task`.
    fn decompose(&self, task: &Task) -> Decomposition;
}

impl<F> Decomposer for F
where
    F: Fn(&Task) -> Decomposition,
{
    fn decompose(&self, task: &Task) -> Decomposition {
        self(task)
    }
}

impl DependencyGraph {
    /// Validate and commit a decomposition of `parent`.
    ///
    /// Subtasks are registered with `parent` as their parent, then the
    /// dependencies are declared, then every newly added edge is checked for
    /// closing a cycle. Cycles already present in the graph are left to the
    /// ordering operations and [`validate`](Self::validate). On any failure
    /// the graph is left exactly as it was.
    ///
    /// On success the sink sees the individual task and dependency events
    /// followed by one [`GraphEvent::TaskDecomposed`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] if `parent` or an edge endpoint is not
    /// registered, [`Error::DuplicateTask`], [`Error::SelfDependency`] and
    /// [`Error::InvalidCost`] as for the individual operations, and
    /// [`Error::CyclicGraph`] naming the new cycle if the proposal would
    /// introduce one.
    pub fn apply_decomposition(
        &mut self,
        parent: &str,
        decomposition: Decomposition,
    ) -> Result<Vec<TaskId>> {
        let parent_id = self.node_task(self.node(parent)?).id.clone();

        let staged_events = Arc::new(MemorySink::new());
        let mut staged = self.clone();
        staged.set_event_sink(Some(staged_events.clone()));

        let mut accepted = Vec::with_capacity(decomposition.subtasks.len());
        for mut task in decomposition.subtasks {
            task.parent = Some(parent_id.clone());
            accepted.push(task.id.clone());
            staged.add_task(task)?;
        }
        let mut added = Vec::new();
        for spec in decomposition.dependencies {
            if !staged.has_dependency(spec.from.as_str(), spec.to.as_str()) {
                added.push((spec.from.clone(), spec.to.clone()));
            }
            staged.add_dependency(spec.from.as_str(), spec.to.as_str(), spec.weight)?;
        }
        // A new cycle has to run through at least one added edge.
        for (from, to) in &added {
            if let Some(cycle) = staged.cycle_through(from.as_str(), to.as_str()) {
                return Err(Error::CyclicGraph { cycle });
            }
        }

        let sink = self.take_event_sink();
        staged.set_event_sink(sink);
        *self = staged;

        for event in staged_events.events() {
            self.emit(event);
        }
        self.emit(GraphEvent::TaskDecomposed {
            parent: parent_id.to_string(),
            subtasks: accepted.iter().map(ToString::to_string).collect(),
        });
        debug!(
            parent = %parent_id,
            subtasks = accepted.len(),
            "Accepted decomposition"
        );

        Ok(accepted)
    }

    /// Ask `decomposer` for subtasks of `parent` and apply them.
    ///
    /// # Errors
    ///
    /// Same as [`apply_decomposition`](Self::apply_decomposition).
    pub fn decompose_with<D>(&mut self, parent: &str, decomposer: &D) -> Result<Vec<TaskId>>
    where
        D: Decomposer + ?Sized,
    {
        let task = self
            .task(parent)
            .cloned()
            .ok_or_else(|| Error::UnknownTask {
                id: TaskId::from(parent),
            })?;
        let proposal = decomposer.decompose(&task);
        self.apply_decomposition(parent, proposal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<TaskId> {
        names.iter().map(|n| TaskId::from(*n)).collect()
    }

    fn release_graph() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph.add_task(Task::new("build", 2.0)).unwrap();
        graph.add_task(Task::new("release", 3.0)).unwrap();
        graph.add_dependency("build", "release", None).unwrap();
        graph
    }

    #[test]
    fn test_apply_sets_parent_and_edges() {
        let mut graph = release_graph();
        let proposal = Decomposition::new()
            .subtask(Task::new("release.tag", 1.0))
            .subtask(Task::new("release.publish", 2.0).with_parent("bogus"))
            .dependency(DependencySpec::new("build", "release.tag"))
            .dependency(DependencySpec::new("release.tag", "release.publish").with_weight(0.5));

        let accepted = graph.apply_decomposition("release", proposal).unwrap();

        assert_eq!(accepted, ids(&["release.tag", "release.publish"]));
        assert_eq!(
            graph.task("release.publish").unwrap().parent,
            Some(TaskId::from("release"))
        );
        assert_eq!(
            graph.dependencies_of("release.publish").unwrap(),
            ids(&["release.tag"])
        );
        assert_eq!(graph.task_count(), 4);
    }

    #[test]
    fn test_cycle_rolls_back() {
        let mut graph = release_graph();
        let proposal = Decomposition::new()
            .subtask(Task::new("release.prepare", 1.0))
            .dependency(DependencySpec::new("release", "release.prepare"))
            .dependency(DependencySpec::new("release.prepare", "build"));

        let err = graph.apply_decomposition("release", proposal).unwrap_err();

        assert!(matches!(err, Error::CyclicGraph { .. }));
        assert_eq!(graph.task_count(), 2);
        assert_eq!(graph.dependency_count(), 1);
        assert!(!graph.has_cycle());
    }

    #[test]
    fn test_existing_cycle_does_not_block_unrelated_proposal() {
        let mut graph = release_graph();
        graph.add_task(Task::new("x", 1.0)).unwrap();
        graph.add_task(Task::new("y", 1.0)).unwrap();
        graph.add_dependency("x", "y", None).unwrap();
        graph.add_dependency("y", "x", None).unwrap();

        let proposal = Decomposition::new()
            .subtask(Task::new("release.notes", 1.0))
            .dependency(DependencySpec::new("build", "release.notes"));
        let accepted = graph.apply_decomposition("release", proposal).unwrap();

        assert_eq!(accepted, ids(&["release.notes"]));
        assert!(graph.contains_task("release.notes"));
        assert!(graph.has_cycle());
    }

    #[test]
    fn test_new_cycle_is_reported_next_to_existing_one() {
        let mut graph = release_graph();
        graph.add_task(Task::new("x", 1.0)).unwrap();
        graph.add_task(Task::new("y", 1.0)).unwrap();
        graph.add_dependency("x", "y", None).unwrap();
        graph.add_dependency("y", "x", None).unwrap();

        let proposal = Decomposition::new()
            .subtask(Task::new("release.check", 1.0))
            .dependency(DependencySpec::new("release", "release.check"))
            .dependency(DependencySpec::new("release.check", "build"));

        assert_eq!(
            graph.apply_decomposition("release", proposal).unwrap_err(),
            Error::CyclicGraph {
                cycle: ids(&["release", "release.check", "build"]),
            }
        );
        assert!(!graph.contains_task("release.check"));
    }

    #[test]
    fn test_redeclared_edge_is_not_blamed_for_old_cycle() {
        let mut graph = release_graph();
        graph.add_dependency("release", "build", None).unwrap();

        let proposal = Decomposition::new()
            .subtask(Task::new("build.fetch", 1.0))
            .dependency(DependencySpec::new("build", "release").with_weight(4.0))
            .dependency(DependencySpec::new("build.fetch", "build"));

        assert!(graph.apply_decomposition("build", proposal).is_ok());
        assert_eq!(graph.task_count(), 3);
    }

    #[test]
    fn test_invalid_subtasks_roll_back() {
        let mut graph = release_graph();

        let duplicate = Decomposition::new()
            .subtask(Task::new("release.a", 1.0))
            .subtask(Task::new("build", 1.0));
        assert_eq!(
            graph.apply_decomposition("release", duplicate).unwrap_err(),
            Error::DuplicateTask { id: "build".into() }
        );

        let dangling = Decomposition::new()
            .subtask(Task::new("release.a", 1.0))
            .dependency(DependencySpec::new("release.a", "release.missing"));
        assert_eq!(
            graph.apply_decomposition("release", dangling).unwrap_err(),
            Error::UnknownTask {
                id: "release.missing".into()
            }
        );

        let self_loop = Decomposition::new()
            .subtask(Task::new("release.a", 1.0))
            .dependency(DependencySpec::new("release.a", "release.a"));
        assert_eq!(
            graph.apply_decomposition("release", self_loop).unwrap_err(),
            Error::SelfDependency {
                id: "release.a".into()
            }
        );

        assert!(!graph.contains_task("release.a"));
    }

    #[test]
    fn test_unknown_parent() {
        let mut graph = release_graph();
        assert_eq!(
            graph
                .apply_decomposition("deploy", Decomposition::new())
                .unwrap_err(),
            Error::UnknownTask {
                id: "deploy".into()
            }
        );
    }

    #[test]
    fn test_events_only_after_commit() {
        let sink = Arc::new(MemorySink::new());
        let mut graph = release_graph().with_event_sink(sink.clone());

        let rejected = Decomposition::new()
            .subtask(Task::new("release.a", 1.0))
            .dependency(DependencySpec::new("release.a", "nope"));
        assert!(graph.apply_decomposition("release", rejected).is_err());
        assert!(sink.is_empty());

        let proposal = Decomposition::new()
            .subtask(Task::new("release.a", 1.0))
            .dependency(DependencySpec::new("release.a", "release"));
        graph.apply_decomposition("release", proposal).unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            GraphEvent::TaskAdded {
                id: "release.a".to_string(),
                cost: 1.0,
                parent: Some("release".to_string()),
            }
        );
        assert_eq!(
            events[2],
            GraphEvent::TaskDecomposed {
                parent: "release".to_string(),
                subtasks: vec!["release.a".to_string()],
            }
        );
    }

    #[test]
    fn test_decompose_with_closure() {
        let mut graph = release_graph();
        let halves = |task: &Task| {
            let first = format!("{}.1", task.id);
            let second = format!("{}.2", task.id);
            Decomposition::new()
                .subtask(Task::new(first.as_str(), task.cost / 2.0))
                .subtask(Task::new(second.as_str(), task.cost / 2.0))
                .dependency(DependencySpec::new(first.as_str(), second.as_str()))
        };

        let accepted = graph.decompose_with("build", &halves).unwrap();

        assert_eq!(accepted, ids(&["build.1", "build.2"]));
        assert_eq!(graph.task("build.2").unwrap().cost, 1.0);
        assert!(graph.decompose_with("missing", &halves).is_err());
    }

    #[test]
    fn test_empty_proposal_is_accepted() {
        let mut graph = release_graph();
        assert!(Decomposition::new().is_empty());
        assert!(
            graph
                .apply_decomposition("build", Decomposition::new())
                .unwrap()
                .is_empty()
        );
        assert_eq!(graph.task_count(), 2);
    }
}
