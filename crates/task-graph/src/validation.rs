//! Validation utilities for dependency graphs.
//!
//! Unlike the ordering operations, which stop at the first problem,
//! [`DependencyGraph::validate`] collects every structural issue.

use crate::{DependencyGraph, Error};

/// Result of graph validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the graph is valid (no cycles, no dangling parents).
    pub is_valid: bool,
    /// Every issue found, if any.
    pub issues: Vec<Error>,
}

impl ValidationResult {
    /// Create a valid result.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            issues: vec![],
        }
    }

    /// Create an invalid result with issues.
    #[must_use]
    pub fn invalid(issues: Vec<Error>) -> Self {
        Self {
            is_valid: false,
            issues,
        }
    }
}

impl DependencyGraph {
    /// Validate the graph structure.
    ///
    /// Checks for:
    /// - A dependency cycle ([`Error::CyclicGraph`])
    /// - Tasks whose parent is not registered ([`Error::UnknownTask`] naming
    ///   the parent), for example after the parent was removed
    ///
    /// Unknown edge endpoints and self-dependencies are rejected when edges
    /// are declared, so they cannot appear here.
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut issues = Vec::new();

        if let Some(cycle) = self.find_cycle() {
            issues.push(Error::CyclicGraph { cycle });
        }

        for task in self.tasks() {
            if let Some(parent) = &task.parent
                && !self.contains_task(parent.as_str())
            {
                issues.push(Error::UnknownTask { id: parent.clone() });
            }
        }

        if issues.is_empty() {
            ValidationResult::valid()
        } else {
            ValidationResult::invalid(issues)
        }
    }
}
