//! Shared graph handle for concurrent construction.
//!
//! [`DependencyGraph`] itself assumes a single writer. `SharedGraph` puts the
//! whole graph behind one `RwLock`: each mutation holds the write lock for
//! its duration and each query holds the read lock, so queries always see a
//! graph between two complete mutations.

use crate::{
    CriticalPath, Decomposition, DependencyGraph, Error, Levels, Result, Task, TaskId,
};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable, thread-safe handle to one dependency graph.
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<DependencyGraph>>,
}

impl From<DependencyGraph> for SharedGraph {
    fn from(graph: DependencyGraph) -> Self {
        Self::new(graph)
    }
}

impl SharedGraph {
    /// Share an existing graph.
    #[must_use]
    pub fn new(graph: DependencyGraph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, DependencyGraph>> {
        self.inner.read().map_err(|_| Error::LockPoisoned)
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, DependencyGraph>> {
        self.inner.write().map_err(|_| Error::LockPoisoned)
    }

    /// Run a query under the read lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if a writer panicked.
    pub fn read<R>(&self, f: impl FnOnce(&DependencyGraph) -> R) -> Result<R> {
        let guard = self.read_guard()?;
        Ok(f(&guard))
    }

    /// Run several mutations under one write lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if a writer panicked.
    pub fn write<R>(&self, f: impl FnOnce(&mut DependencyGraph) -> R) -> Result<R> {
        let mut guard = self.write_guard()?;
        Ok(f(&mut guard))
    }

    /// See [`DependencyGraph::add_task`].
    ///
    /// # Errors
    ///
    /// As the underlying operation, plus [`Error::LockPoisoned`].
    pub fn add_task(&self, task: Task) -> Result<()> {
        self.write_guard()?.add_task(task)
    }

    /// See [`DependencyGraph::add_dependency`].
    ///
    /// # Errors
    ///
    /// As the underlying operation, plus [`Error::LockPoisoned`].
    pub fn add_dependency(&self, from: &str, to: &str, weight: Option<f64>) -> Result<()> {
        self.write_guard()?.add_dependency(from, to, weight)
    }

    /// See [`DependencyGraph::remove_dependency`].
    ///
    /// # Errors
    ///
    /// As the underlying operation, plus [`Error::LockPoisoned`].
    pub fn remove_dependency(&self, from: &str, to: &str) -> Result<bool> {
        self.write_guard()?.remove_dependency(from, to)
    }

    /// See [`DependencyGraph::remove_task`].
    ///
    /// # Errors
    ///
    /// As the underlying operation, plus [`Error::LockPoisoned`].
    pub fn remove_task(&self, id: &str) -> Result<Task> {
        self.write_guard()?.remove_task(id)
    }

    /// See [`DependencyGraph::apply_decomposition`].
    ///
    /// # Errors
    ///
    /// As the underlying operation, plus [`Error::LockPoisoned`].
    pub fn apply_decomposition(
        &self,
        parent: &str,
        decomposition: Decomposition,
    ) -> Result<Vec<TaskId>> {
        self.write_guard()?.apply_decomposition(parent, decomposition)
    }

    /// See [`DependencyGraph::has_cycle`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if a writer panicked.
    pub fn has_cycle(&self) -> Result<bool> {
        self.read(DependencyGraph::has_cycle)
    }

    /// See [`DependencyGraph::topological_order`].
    ///
    /// # Errors
    ///
    /// As the underlying operation, plus [`Error::LockPoisoned`].
    pub fn topological_order(&self) -> Result<Vec<TaskId>> {
        self.read_guard()?.topological_order()
    }

    /// See [`DependencyGraph::levels`].
    ///
    /// # Errors
    ///
    /// As the underlying operation, plus [`Error::LockPoisoned`].
    pub fn levels(&self) -> Result<Levels> {
        self.read_guard()?.levels()
    }

    /// See [`DependencyGraph::critical_path`].
    ///
    /// # Errors
    ///
    /// As the underlying operation, plus [`Error::LockPoisoned`].
    pub fn critical_path(&self) -> Result<CriticalPath> {
        self.read_guard()?.critical_path()
    }

    /// Clone of the current graph, for analysis without holding the lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if a writer panicked.
    pub fn snapshot(&self) -> Result<DependencyGraph> {
        self.read(Clone::clone)
    }
}
