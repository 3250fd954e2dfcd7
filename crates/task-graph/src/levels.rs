//! Level scheduling: partition tasks into batches that can run in parallel.
//!
//! Level 0 holds every task without prerequisites. Level `k` holds every task
//! whose prerequisites all sit in earlier levels, at least one of them in
//! level `k - 1`.

use crate::{DependencyGraph, Result, TaskId};
use petgraph::stable_graph::NodeIndex;
use tracing::debug;

/// Groups of tasks that can execute in parallel.
///
/// Each inner vector contains tasks with no dependencies on each other. The
/// outer vector is ordered by level: all tasks in level N must complete
/// before tasks in level N+1 can start.
pub type Levels = Vec<Vec<TaskId>>;

/// A level partition with convenience queries for an executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    levels: Levels,
}

impl ExecutionPlan {
    /// The levels, in execution order.
    #[must_use]
    pub fn levels(&self) -> &[Vec<TaskId>] {
        &self.levels
    }

    /// Number of levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if the plan has no levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Size of the widest level.
    #[must_use]
    pub fn max_parallelism(&self) -> usize {
        self.levels.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// All tasks, level by level. This is a valid topological order.
    #[must_use]
    pub fn flatten(&self) -> Vec<TaskId> {
        self.levels.iter().flatten().cloned().collect()
    }

    /// Index of the level containing a task.
    #[must_use]
    pub fn level_of(&self, id: &str) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.iter().any(|task| task.as_str() == id))
    }

    /// Consume the plan, returning the levels.
    #[must_use]
    pub fn into_levels(self) -> Levels {
        self.levels
    }
}

impl DependencyGraph {
    /// Partition all tasks into parallel execution levels.
    ///
    /// Tasks within a level keep registration order. An empty graph yields
    /// no levels; a graph without edges yields a single level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicGraph`](crate::Error::CyclicGraph) if the graph
    /// contains a cycle.
    pub fn levels(&self) -> Result<Levels> {
        let ranks = self.ranks();
        let mut in_degree = self.in_degrees();

        let mut current: Vec<_> = self
            .node_order()
            .iter()
            .copied()
            .filter(|node| in_degree.get(node).copied().unwrap_or(0) == 0)
            .collect();

        let mut levels = Vec::new();
        let mut placed = 0;
        while placed < self.task_count() {
            if current.is_empty() {
                return Err(self.cycle_error());
            }

            let mut next = Vec::new();
            for &node in &current {
                for dependent in self.graph_neighbors(node) {
                    if let Some(degree) = in_degree.get_mut(&dependent) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(dependent);
                        }
                    }
                }
            }
            // A task reaches zero exactly once, so `next` has no duplicates.
            next.sort_by_key(|node| ranks.get(node).copied().unwrap_or(usize::MAX));

            placed += current.len();
            levels.push(
                current
                    .iter()
                    .map(|&node| self.node_task(node).id.clone())
                    .collect(),
            );
            current = next;
        }

        debug!(
            tasks = self.task_count(),
            levels = levels.len(),
            "Computed execution levels"
        );
        Ok(levels)
    }

    /// [`levels`](Self::levels) wrapped in an [`ExecutionPlan`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicGraph`](crate::Error::CyclicGraph) if the graph
    /// contains a cycle.
    pub fn execution_plan(&self) -> Result<ExecutionPlan> {
        Ok(ExecutionPlan {
            levels: self.levels()?,
        })
    }

    fn graph_neighbors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.outgoing(node).map(|(_, target, _)| target)
    }
}
