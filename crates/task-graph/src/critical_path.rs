//! Critical path analysis.
//!
//! Longest weighted path over the DAG by dynamic programming in topological
//! order. `distance[t]` is the earliest time `t` can start when every edge
//! `u -> v` costs its weight (by default the cost of `u`).

use crate::{AnalysisOptions, CostModel, DependencyGraph, Result, TaskId, TieBreak};
use petgraph::stable_graph::NodeIndex;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Slack at or below this is treated as zero.
pub const SLACK_EPSILON: f64 = 1e-9;

/// The longest chain of dependent tasks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriticalPath {
    /// Tasks along the path, from a source task to a sink task.
    pub path: Vec<TaskId>,
    /// Accumulated weight along the path (plus the end task's cost under
    /// [`CostModel::Inclusive`]).
    pub total: f64,
}

impl CriticalPath {
    /// Number of tasks on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// Check if the path is empty (only for an empty graph).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// The last task on the path.
    #[must_use]
    pub fn end(&self) -> Option<&TaskId> {
        self.path.last()
    }
}

/// Timing bounds of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskTiming {
    /// Task identifier.
    pub id: TaskId,
    /// Earliest start under unlimited parallelism.
    pub earliest_start: f64,
    /// `earliest_start` plus the task's own cost.
    pub earliest_finish: f64,
    /// Latest start that does not delay the makespan.
    pub latest_start: f64,
    /// `latest_start - earliest_start`.
    pub slack: f64,
}

impl TaskTiming {
    /// Whether delaying this task delays the whole graph.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.slack <= SLACK_EPSILON
    }
}

/// Per-task timing bounds, in topological order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    /// Largest earliest finish over all tasks.
    pub makespan: f64,
    /// One entry per task.
    pub timings: Vec<TaskTiming>,
}

impl Schedule {
    /// Timing of one task.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TaskTiming> {
        self.timings.iter().find(|t| t.id.as_str() == id)
    }

    /// Tasks with zero slack, in topological order.
    #[must_use]
    pub fn critical_tasks(&self) -> Vec<TaskId> {
        self.timings
            .iter()
            .filter(|t| t.is_critical())
            .map(|t| t.id.clone())
            .collect()
    }
}

/// Longest distances from any source, indexed by `NodeIndex::index()`.
struct Distances {
    distance: Vec<f64>,
    predecessor: Vec<Option<NodeIndex>>,
}

impl DependencyGraph {
    /// Critical path using the graph's configured [`AnalysisOptions`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicGraph`](crate::Error::CyclicGraph) if the graph
    /// contains a cycle.
    pub fn critical_path(&self) -> Result<CriticalPath> {
        self.critical_path_with(self.options())
    }

    /// Critical path using explicit options.
    ///
    /// The end task maximizes its distance (plus its own cost under
    /// [`CostModel::Inclusive`]). On a tie a task without dependents beats
    /// one with dependents, so the path always ends at a sink; remaining ties
    /// go to the task preferred by the configured [`TieBreak`]. An empty graph
    /// yields an empty path with a total of zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicGraph`](crate::Error::CyclicGraph) if the graph
    /// contains a cycle.
    pub fn critical_path_with(&self, options: &AnalysisOptions) -> Result<CriticalPath> {
        let sorted = self.sorted_nodes()?;
        let ranks = self.ranks();
        let distances = self.longest_distances(&sorted, options.tie_break, &ranks);

        let score = |node: NodeIndex| match options.cost_model {
            CostModel::OnExit => distances.distance[node.index()],
            CostModel::Inclusive => {
                distances.distance[node.index()] + self.node_task(node).cost
            }
        };

        let mut end: Option<NodeIndex> = None;
        for &node in self.node_order() {
            let better = match end {
                None => true,
                Some(current) => match score(node).partial_cmp(&score(current)) {
                    Some(Ordering::Greater) => true,
                    Some(Ordering::Equal) => match (self.is_sink(node), self.is_sink(current)) {
                        (true, false) => true,
                        (false, true) => false,
                        _ => self.prefers(node, current, options.tie_break, &ranks),
                    },
                    _ => false,
                },
            };
            if better {
                end = Some(node);
            }
        }

        let Some(end) = end else {
            return Ok(CriticalPath::default());
        };

        let mut path = vec![end];
        let mut current = end;
        while let Some(previous) = distances.predecessor[current.index()] {
            path.push(previous);
            current = previous;
        }
        path.reverse();

        let critical = CriticalPath {
            path: path
                .into_iter()
                .map(|node| self.node_task(node).id.clone())
                .collect(),
            total: score(end),
        };
        debug!(
            tasks = self.task_count(),
            path_len = critical.len(),
            total = critical.total,
            "Computed critical path"
        );
        Ok(critical)
    }

    /// Earliest and latest start times plus slack for every task.
    ///
    /// Every edge `u -> v` delays `v` by its weight; each task then takes its
    /// own cost to finish. The makespan is the largest earliest finish.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicGraph`](crate::Error::CyclicGraph) if the graph
    /// contains a cycle.
    pub fn schedule(&self) -> Result<Schedule> {
        let sorted = self.sorted_nodes()?;
        let ranks = self.ranks();
        let distances = self.longest_distances(&sorted, self.options().tie_break, &ranks);

        let makespan = sorted
            .iter()
            .map(|&node| distances.distance[node.index()] + self.node_task(node).cost)
            .fold(0.0_f64, f64::max);

        let mut latest_start = vec![0.0; self.node_bound()];
        for &node in sorted.iter().rev() {
            let mut latest = makespan - self.node_task(node).cost;
            for (_, target, weight) in self.outgoing(node) {
                latest = latest.min(latest_start[target.index()] - weight);
            }
            latest_start[node.index()] = latest;
        }

        let timings = sorted
            .iter()
            .map(|&node| {
                let task = self.node_task(node);
                let earliest_start = distances.distance[node.index()];
                let latest = latest_start[node.index()];
                TaskTiming {
                    id: task.id.clone(),
                    earliest_start,
                    earliest_finish: earliest_start + task.cost,
                    latest_start: latest,
                    slack: (latest - earliest_start).max(0.0),
                }
            })
            .collect();

        debug!(tasks = self.task_count(), makespan, "Computed schedule");
        Ok(Schedule { makespan, timings })
    }

    /// Relax every edge in topological order.
    ///
    /// An equal candidate replaces the predecessor when the target has none
    /// yet or the new source is preferred by `tie_break`, so every task with
    /// an incoming edge ends up with a predecessor.
    fn longest_distances(
        &self,
        sorted: &[NodeIndex],
        tie_break: TieBreak,
        ranks: &HashMap<NodeIndex, usize>,
    ) -> Distances {
        let mut distances = Distances {
            distance: vec![0.0; self.node_bound()],
            predecessor: vec![None; self.node_bound()],
        };

        for &node in sorted {
            let base = distances.distance[node.index()];
            for (_, target, weight) in self.outgoing(node) {
                let candidate = base + weight;
                let slot = target.index();
                let replace = match candidate.partial_cmp(&distances.distance[slot]) {
                    Some(Ordering::Greater) => true,
                    Some(Ordering::Equal) => distances.predecessor[slot]
                        .is_none_or(|current| self.prefers(node, current, tie_break, ranks)),
                    _ => false,
                };
                if replace {
                    distances.distance[slot] = candidate;
                    distances.predecessor[slot] = Some(node);
                }
            }
        }

        distances
    }

    fn is_sink(&self, node: NodeIndex) -> bool {
        self.outgoing(node).next().is_none()
    }

    /// Whether `a` wins a tie against `b`.
    fn prefers(
        &self,
        a: NodeIndex,
        b: NodeIndex,
        tie_break: TieBreak,
        ranks: &HashMap<NodeIndex, usize>,
    ) -> bool {
        match tie_break {
            TieBreak::Lexicographic => self.node_task(a).id < self.node_task(b).id,
            TieBreak::InsertionOrder => ranks.get(&a) < ranks.get(&b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Task};

    fn ids(names: &[&str]) -> Vec<TaskId> {
        names.iter().map(|n| TaskId::from(*n)).collect()
    }

    fn graph(tasks: &[(&str, f64)], edges: &[(&str, &str)]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (id, cost) in tasks {
            graph.add_task(Task::new(*id, *cost)).unwrap();
        }
        for (from, to) in edges {
            graph.add_dependency(from, to, None).unwrap();
        }
        graph
    }

    #[test]
    fn test_chain_accumulates_source_costs() {
        let graph = graph(
            &[("a", 3.0), ("b", 2.0), ("c", 4.0)],
            &[("a", "b"), ("b", "c")],
        );

        let critical = graph.critical_path().unwrap();
        assert_eq!(critical.path, ids(&["a", "b", "c"]));
        assert_eq!(critical.total, 5.0);
        assert_eq!(critical.end(), Some(&TaskId::from("c")));

        let inclusive = graph
            .critical_path_with(&AnalysisOptions::default().with_cost_model(CostModel::Inclusive))
            .unwrap();
        assert_eq!(inclusive.path, ids(&["a", "b", "c"]));
        assert_eq!(inclusive.total, 9.0);
    }

    #[test]
    fn test_longer_branch_wins() {
        //   a(1) -> b(10) -> d
        //   a(1) -> c(2)  -> d
        let graph = graph(
            &[("a", 1.0), ("b", 10.0), ("c", 2.0), ("d", 1.0)],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );

        let critical = graph.critical_path().unwrap();
        assert_eq!(critical.path, ids(&["a", "b", "d"]));
        assert_eq!(critical.total, 11.0);
    }

    #[test]
    fn test_tie_break_lexicographic_vs_insertion() {
        // "b" registered before "a"; both reach "c" with the same distance.
        let graph = graph(&[("b", 1.0), ("a", 1.0), ("c", 0.0)], &[("b", "c"), ("a", "c")]);

        let lexicographic = graph.critical_path().unwrap();
        assert_eq!(lexicographic.path, ids(&["a", "c"]));

        let insertion = graph
            .critical_path_with(
                &AnalysisOptions::default().with_tie_break(TieBreak::InsertionOrder),
            )
            .unwrap();
        assert_eq!(insertion.path, ids(&["b", "c"]));
    }

    #[test]
    fn test_end_tie_break_between_sinks() {
        // Two disjoint chains of equal length.
        let graph = graph(
            &[("y", 2.0), ("z", 0.0), ("w", 2.0), ("x", 0.0)],
            &[("y", "z"), ("w", "x")],
        );

        let critical = graph.critical_path().unwrap();
        assert_eq!(critical.path, ids(&["w", "x"]));
        assert_eq!(critical.total, 2.0);
    }

    #[test]
    fn test_zero_cost_edges_still_form_a_path() {
        // Every distance is zero, so "b" wins the end tie and its
        // predecessor is still recorded through the zero-weight edge.
        let graph = graph(&[("x", 0.0), ("b", 0.0)], &[("x", "b")]);

        let critical = graph.critical_path().unwrap();
        assert_eq!(critical.path, ids(&["x", "b"]));
        assert_eq!(critical.total, 0.0);
    }

    #[test]
    fn test_zero_weight_tie_ends_at_sink() {
        // "a" wins the lexicographic tie but still has a dependent.
        let graph = graph(&[("a", 0.0), ("b", 0.0)], &[("a", "b")]);

        let critical = graph.critical_path().unwrap();
        assert_eq!(critical.path, ids(&["a", "b"]));
        assert_eq!(critical.total, 0.0);

        let insertion = graph
            .critical_path_with(
                &AnalysisOptions::default().with_tie_break(TieBreak::InsertionOrder),
            )
            .unwrap();
        assert_eq!(insertion.path, ids(&["a", "b"]));
    }

    #[test]
    fn test_explicit_weights_override_cost() {
        let mut graph = graph(&[("a", 1.0), ("b", 1.0), ("c", 1.0)], &[]);
        graph.add_dependency("a", "c", Some(5.0)).unwrap();
        graph.add_dependency("b", "c", Some(2.0)).unwrap();

        let critical = graph.critical_path().unwrap();
        assert_eq!(critical.path, ids(&["a", "c"]));
        assert_eq!(critical.total, 5.0);
    }

    #[test]
    fn test_single_task_cost_models() {
        let graph = graph(&[("a", 4.0)], &[]);

        let on_exit = graph.critical_path().unwrap();
        assert_eq!(on_exit.path, ids(&["a"]));
        assert_eq!(on_exit.total, 0.0);

        let inclusive = graph
            .with_options(AnalysisOptions::default().with_cost_model(CostModel::Inclusive))
            .critical_path()
            .unwrap();
        assert_eq!(inclusive.path, ids(&["a"]));
        assert_eq!(inclusive.total, 4.0);
    }

    #[test]
    fn test_inclusive_can_pick_a_different_end() {
        // On exit, b (distance 1) beats c (distance 0). Inclusive, c's own
        // cost of 5 makes it the longer path.
        let graph = graph(&[("a", 1.0), ("b", 0.0), ("c", 5.0)], &[("a", "b")]);

        assert_eq!(graph.critical_path().unwrap().path, ids(&["a", "b"]));

        let inclusive = graph
            .critical_path_with(&AnalysisOptions::default().with_cost_model(CostModel::Inclusive))
            .unwrap();
        assert_eq!(inclusive.path, ids(&["c"]));
        assert_eq!(inclusive.total, 5.0);
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::new();
        let critical = graph.critical_path().unwrap();
        assert!(critical.is_empty());
        assert_eq!(critical.total, 0.0);

        let schedule = graph.schedule().unwrap();
        assert_eq!(schedule.makespan, 0.0);
        assert!(schedule.timings.is_empty());
    }

    #[test]
    fn test_cycle_propagates() {
        let mut graph = graph(&[("a", 1.0), ("b", 1.0)], &[("a", "b")]);
        graph.add_dependency("b", "a", None).unwrap();

        assert!(matches!(
            graph.critical_path(),
            Err(Error::CyclicGraph { .. })
        ));
        assert!(matches!(graph.schedule(), Err(Error::CyclicGraph { .. })));
    }

    #[test]
    fn test_schedule_slack() {
        //   a(2) -> b(4) -> d(1)
        //   a(2) -> c(1) -> d(1)
        let graph = graph(
            &[("a", 2.0), ("b", 4.0), ("c", 1.0), ("d", 1.0)],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );

        let schedule = graph.schedule().unwrap();
        assert_eq!(schedule.makespan, 7.0);

        let c = schedule.get("c").unwrap();
        assert_eq!(c.earliest_start, 2.0);
        assert_eq!(c.earliest_finish, 3.0);
        assert_eq!(c.latest_start, 5.0);
        assert_eq!(c.slack, 3.0);
        assert!(!c.is_critical());

        assert_eq!(schedule.critical_tasks(), ids(&["a", "b", "d"]));
        assert_eq!(
            schedule.critical_tasks(),
            graph
                .critical_path_with(
                    &AnalysisOptions::default().with_cost_model(CostModel::Inclusive)
                )
                .unwrap()
                .path
        );
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let graph = graph(
            &[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 1.0)],
            &[("a", "c"), ("b", "c"), ("c", "d")],
        );

        let first = graph.critical_path().unwrap();
        for _ in 0..5 {
            assert_eq!(graph.critical_path().unwrap(), first);
        }
    }
}
