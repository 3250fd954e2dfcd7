//! Dependency graph storage using petgraph.
//!
//! An edge `from -> to` means `to` cannot start until `from` completes. The
//! graph checks identifiers and self-dependencies eagerly, and acyclicity
//! lazily: ordering operations fail with [`Error::CyclicGraph`] instead.

use crate::task::is_valid_cost;
use crate::{AnalysisOptions, Error, Result, Task, TaskId};
use petgraph::Direction;
use petgraph::algo::astar;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{
    Bfs, Control, DfsEvent, EdgeRef, NodeIndexable, Reversed, depth_first_search,
};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::sync::Arc;
use taskweave_events::{EventSink, GraphEvent};
use tracing::debug;

/// A declared dependency edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    /// Task that must complete first.
    pub from: TaskId,
    /// Task that waits on `from`.
    pub to: TaskId,
    /// Weight used by critical path analysis.
    pub weight: f64,
}

/// Task dependency graph.
///
/// Build it during a single-writer construction phase, then query it as
/// often as needed. Queries take `&self` and never mutate; wrap the graph in
/// a [`SharedGraph`](crate::SharedGraph) when several writers are involved.
#[derive(Clone, Default)]
pub struct DependencyGraph {
    /// Tasks and weighted edges. Stable indices survive removals.
    graph: StableDiGraph<Task, f64>,
    /// Map from task identifiers to node indices.
    index: HashMap<TaskId, NodeIndex>,
    /// Node indices in registration order.
    order: Vec<NodeIndex>,
    options: AnalysisOptions,
    sink: Option<Arc<dyn EventSink>>,
}

impl fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.dependency_count())
            .field("options", &self.options)
            .field("event_sink", &self.sink.is_some())
            .finish()
    }
}

impl DependencyGraph {
    /// Create an empty graph with default analysis options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use these options for [`critical_path`](Self::critical_path) and
    /// [`schedule`](Self::schedule).
    #[must_use]
    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    /// Report every mutation to `sink`.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace (or clear) the event sink.
    pub fn set_event_sink(&mut self, sink: Option<Arc<dyn EventSink>>) {
        self.sink = sink;
    }

    /// Analysis options in effect.
    #[must_use]
    pub const fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Change the analysis options.
    pub fn set_options(&mut self, options: AnalysisOptions) {
        self.options = options;
    }

    pub(crate) fn take_event_sink(&mut self) -> Option<Arc<dyn EventSink>> {
        self.sink.take()
    }

    pub(crate) fn emit(&self, event: GraphEvent) {
        if let Some(sink) = &self.sink {
            sink.record(event);
        }
    }

    /// Register a task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateTask`] if the identifier is taken and
    /// [`Error::InvalidCost`] if the cost is negative or not finite.
    pub fn add_task(&mut self, task: Task) -> Result<()> {
        if self.index.contains_key(&task.id) {
            return Err(Error::DuplicateTask { id: task.id });
        }
        if !is_valid_cost(task.cost) {
            return Err(Error::InvalidCost {
                id: task.id,
                value: task.cost,
            });
        }

        let id = task.id.clone();
        let event = GraphEvent::TaskAdded {
            id: id.to_string(),
            cost: task.cost,
            parent: task.parent.as_ref().map(ToString::to_string),
        };

        let node = self.graph.add_node(task);
        self.index.insert(id.clone(), node);
        self.order.push(node);
        debug!(task = %id, "Added task node");
        self.emit(event);

        Ok(())
    }

    /// Declare that `to` depends on `from` completing first.
    ///
    /// Without an explicit `weight` the edge carries the cost of `from`.
    /// Declaring an existing edge again replaces its weight. Acyclicity is
    /// not checked here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SelfDependency`] if `from == to`,
    /// [`Error::UnknownTask`] if either task is not registered, and
    /// [`Error::InvalidCost`] for a negative or non-finite weight.
    pub fn add_dependency(&mut self, from: &str, to: &str, weight: Option<f64>) -> Result<()> {
        if from == to {
            return Err(Error::SelfDependency {
                id: TaskId::from(from),
            });
        }
        let source = self.node(from)?;
        let target = self.node(to)?;

        let weight = weight.unwrap_or(self.graph[source].cost);
        if !is_valid_cost(weight) {
            return Err(Error::InvalidCost {
                id: TaskId::from(from),
                value: weight,
            });
        }

        self.graph.update_edge(source, target, weight);
        debug!(from, to, weight, "Added dependency edge");
        self.emit(GraphEvent::DependencyAdded {
            from: from.to_string(),
            to: to.to_string(),
            weight,
        });

        Ok(())
    }

    /// Drop the edge `from -> to`, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] if either task is not registered.
    pub fn remove_dependency(&mut self, from: &str, to: &str) -> Result<bool> {
        let source = self.node(from)?;
        let target = self.node(to)?;

        let Some(edge) = self.graph.find_edge(source, target) else {
            return Ok(false);
        };
        self.graph.remove_edge(edge);
        debug!(from, to, "Removed dependency edge");
        self.emit(GraphEvent::DependencyRemoved {
            from: from.to_string(),
            to: to.to_string(),
        });

        Ok(true)
    }

    /// Remove a task together with every edge touching it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] if the task is not registered.
    pub fn remove_task(&mut self, id: &str) -> Result<Task> {
        let node = self.node(id)?;
        let task = self
            .graph
            .remove_node(node)
            .ok_or_else(|| Error::UnknownTask { id: TaskId::from(id) })?;
        self.index.remove(id);
        self.order.retain(|&n| n != node);
        debug!(task = id, "Removed task node");
        self.emit(GraphEvent::TaskRemoved { id: id.to_string() });

        Ok(task)
    }

    /// Look up a task.
    #[must_use]
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.index.get(id).map(|&node| &self.graph[node])
    }

    /// Check if a task is registered.
    #[must_use]
    pub fn contains_task(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of dependency edges.
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if the graph has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tasks in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().map(|&node| &self.graph[node])
    }

    /// Every edge, grouped by source task in registration order.
    #[must_use]
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.order
            .iter()
            .flat_map(|&node| self.outgoing(node))
            .map(|(source, target, weight)| Dependency {
                from: self.graph[source].id.clone(),
                to: self.graph[target].id.clone(),
                weight,
            })
            .collect()
    }

    /// Direct prerequisites of a task, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] if the task is not registered.
    pub fn dependencies_of(&self, id: &str) -> Result<Vec<TaskId>> {
        let node = self.node(id)?;
        Ok(self.ids_in_order(
            self.graph
                .neighbors_directed(node, Direction::Incoming)
                .collect(),
        ))
    }

    /// Tasks that directly depend on a task, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] if the task is not registered.
    pub fn dependents_of(&self, id: &str) -> Result<Vec<TaskId>> {
        let node = self.node(id)?;
        Ok(self.ids_in_order(
            self.graph
                .neighbors_directed(node, Direction::Outgoing)
                .collect(),
        ))
    }

    /// Every task `id` transitively depends on, excluding itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] if the task is not registered.
    pub fn transitive_dependencies(&self, id: &str) -> Result<Vec<TaskId>> {
        let node = self.node(id)?;
        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, node);
        let mut reached = Vec::new();
        while let Some(next) = bfs.next(reversed) {
            if next != node {
                reached.push(next);
            }
        }
        Ok(self.ids_in_order(reached))
    }

    /// Every task that transitively depends on `id`, excluding itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] if the task is not registered.
    pub fn transitive_dependents(&self, id: &str) -> Result<Vec<TaskId>> {
        let node = self.node(id)?;
        let mut bfs = Bfs::new(&self.graph, node);
        let mut reached = Vec::new();
        while let Some(next) = bfs.next(&self.graph) {
            if next != node {
                reached.push(next);
            }
        }
        Ok(self.ids_in_order(reached))
    }

    /// Check if the graph has a directed cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Find a directed cycle.
    ///
    /// Runs a three-color depth-first search from every task in registration
    /// order and stops at the first back edge. The returned identifiers
    /// follow the cycle: the first is where the back edge lands and the last
    /// depends back on the first.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<TaskId>> {
        let mut tree_parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut cycle = None;

        depth_first_search(&self.graph, self.order.iter().copied(), |event| {
            match event {
                DfsEvent::TreeEdge(parent, child) => {
                    tree_parent.insert(child, parent);
                }
                DfsEvent::BackEdge(tail, head) => {
                    // `head` is still on the stack, so it is a tree ancestor of `tail`.
                    let mut nodes = vec![tail];
                    let mut current = tail;
                    while current != head {
                        let Some(&parent) = tree_parent.get(&current) else {
                            break;
                        };
                        nodes.push(parent);
                        current = parent;
                    }
                    nodes.reverse();
                    cycle = Some(nodes);
                    return Control::Break(());
                }
                _ => {}
            }
            Control::Continue
        });

        cycle.map(|nodes| {
            nodes
                .into_iter()
                .map(|node| self.graph[node].id.clone())
                .collect()
        })
    }

    /// Tasks in dependency order.
    ///
    /// Among tasks whose prerequisites are all satisfied, the one registered
    /// first comes first, so the order is stable for a fixed graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicGraph`] if the graph contains a cycle.
    pub fn topological_order(&self) -> Result<Vec<TaskId>> {
        Ok(self
            .sorted_nodes()?
            .into_iter()
            .map(|node| self.graph[node].id.clone())
            .collect())
    }

    /// Kahn's algorithm with a min-heap on registration rank.
    pub(crate) fn sorted_nodes(&self) -> Result<Vec<NodeIndex>> {
        let ranks = self.ranks();
        let mut in_degree = self.in_degrees();
        let mut ready: BinaryHeap<Reverse<usize>> = self
            .order
            .iter()
            .enumerate()
            .filter(|(_, node)| in_degree.get(node).copied().unwrap_or(0) == 0)
            .map(|(rank, _)| Reverse(rank))
            .collect();

        let mut sorted = Vec::with_capacity(self.order.len());
        while let Some(Reverse(rank)) = ready.pop() {
            let node = self.order[rank];
            sorted.push(node);
            for dependent in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(ranks[&dependent]));
                    }
                }
            }
        }

        if sorted.len() < self.order.len() {
            return Err(self.cycle_error());
        }
        Ok(sorted)
    }

    /// Build the error for a graph known to contain a cycle.
    pub(crate) fn cycle_error(&self) -> Error {
        Error::CyclicGraph {
            cycle: self.find_cycle().unwrap_or_default(),
        }
    }

    /// Count of incoming edges per task.
    pub(crate) fn in_degrees(&self) -> HashMap<NodeIndex, usize> {
        self.order
            .iter()
            .map(|&node| {
                (
                    node,
                    self.graph
                        .neighbors_directed(node, Direction::Incoming)
                        .count(),
                )
            })
            .collect()
    }

    /// Registration rank of every task.
    pub(crate) fn ranks(&self) -> HashMap<NodeIndex, usize> {
        self.order
            .iter()
            .enumerate()
            .map(|(rank, &node)| (node, rank))
            .collect()
    }

    /// Outgoing edges of a node as `(source, target, weight)`.
    pub(crate) fn outgoing(
        &self,
        node: NodeIndex,
    ) -> impl Iterator<Item = (NodeIndex, NodeIndex, f64)> + '_ {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| (edge.source(), edge.target(), *edge.weight()))
    }

    pub(crate) fn node(&self, id: &str) -> Result<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownTask { id: TaskId::from(id) })
    }

    pub(crate) fn node_task(&self, node: NodeIndex) -> &Task {
        &self.graph[node]
    }

    pub(crate) fn node_order(&self) -> &[NodeIndex] {
        &self.order
    }

    /// Whether the edge `from -> to` is declared.
    pub(crate) fn has_dependency(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&source), Some(&target)) => self.graph.find_edge(source, target).is_some(),
            _ => false,
        }
    }

    /// A cycle using the edge `from -> to`, if `from` is reachable from `to`.
    ///
    /// The cycle starts at `from`, like [`find_cycle`](Self::find_cycle).
    pub(crate) fn cycle_through(&self, from: &str, to: &str) -> Option<Vec<TaskId>> {
        let source = *self.index.get(from)?;
        let target = *self.index.get(to)?;
        self.graph.find_edge(source, target)?;

        // Fewest hops from `to` back to `from`, ending at `from`.
        let (_, back) = astar(&self.graph, target, |node| node == source, |_| 1_usize, |_| 0)?;
        let mut cycle = vec![source];
        cycle.extend(back.into_iter().take_while(|&node| node != source));
        Some(
            cycle
                .into_iter()
                .map(|node| self.graph[node].id.clone())
                .collect(),
        )
    }

    /// Upper bound on node indices, for index-addressed scratch vectors.
    pub(crate) fn node_bound(&self) -> usize {
        self.graph.node_bound()
    }

    fn ids_in_order(&self, mut nodes: Vec<NodeIndex>) -> Vec<TaskId> {
        let ranks = self.ranks();
        nodes.sort_by_key(|node| ranks.get(node).copied().unwrap_or(usize::MAX));
        nodes.dedup();
        nodes
            .into_iter()
            .map(|node| self.graph[node].id.clone())
            .collect()
    }
}
