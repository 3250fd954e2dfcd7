//! Analysis options.
//!
//! Options only affect critical path analysis. They can be built in code,
//! deserialized with serde, or read from the environment.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Environment variable selecting the [`CostModel`].
pub const COST_MODEL_ENV: &str = "TASKWEAVE_COST_MODEL";

/// Environment variable selecting the [`TieBreak`].
pub const TIE_BREAK_ENV: &str = "TASKWEAVE_TIE_BREAK";

/// Where a task's own cost is charged along a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CostModel {
    /// Cost is charged when leaving a task, through its outgoing edge weights.
    /// The last task on a path contributes nothing.
    #[default]
    OnExit,
    /// Like `OnExit`, plus the cost of the last task on the path.
    Inclusive,
}

/// How equal-length candidates are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Prefer the smaller task identifier.
    #[default]
    Lexicographic,
    /// Prefer the task registered first.
    InsertionOrder,
}

impl FromStr for CostModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "on-exit" | "on_exit" | "exit" => Ok(Self::OnExit),
            "inclusive" => Ok(Self::Inclusive),
            _ => Err(Error::InvalidConfig {
                key: COST_MODEL_ENV.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for TieBreak {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lexicographic" => Ok(Self::Lexicographic),
            "insertion-order" | "insertion_order" | "insertion" => Ok(Self::InsertionOrder),
            _ => Err(Error::InvalidConfig {
                key: TIE_BREAK_ENV.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Options for critical path and schedule analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AnalysisOptions {
    /// Where task costs are charged.
    pub cost_model: CostModel,
    /// Ordering among equal candidates.
    pub tie_break: TieBreak,
}

impl AnalysisOptions {
    /// Defaults overlaid with [`COST_MODEL_ENV`] and [`TIE_BREAK_ENV`].
    ///
    /// Unset or empty variables keep the default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a variable holds an unknown value.
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();
        if let Some(value) = env_value(COST_MODEL_ENV) {
            options.cost_model = value.parse()?;
        }
        if let Some(value) = env_value(TIE_BREAK_ENV) {
            options.tie_break = value.parse()?;
        }
        Ok(options)
    }

    /// Set the cost model.
    #[must_use]
    pub const fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    /// Set the tie-break.
    #[must_use]
    pub const fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = AnalysisOptions::default();
        assert_eq!(options.cost_model, CostModel::OnExit);
        assert_eq!(options.tie_break, TieBreak::Lexicographic);
    }

    #[test]
    fn test_from_env_unset_uses_defaults() {
        temp_env::with_vars_unset([COST_MODEL_ENV, TIE_BREAK_ENV], || {
            assert_eq!(
                AnalysisOptions::from_env().unwrap(),
                AnalysisOptions::default()
            );
        });
    }

    #[test]
    fn test_from_env_overrides() {
        temp_env::with_vars(
            [
                (COST_MODEL_ENV, Some("inclusive")),
                (TIE_BREAK_ENV, Some("Insertion-Order")),
            ],
            || {
                let options = AnalysisOptions::from_env().unwrap();
                assert_eq!(options.cost_model, CostModel::Inclusive);
                assert_eq!(options.tie_break, TieBreak::InsertionOrder);
            },
        );
    }

    #[test]
    fn test_from_env_rejects_unknown_value() {
        temp_env::with_vars(
            [(COST_MODEL_ENV, Some("on-entry")), (TIE_BREAK_ENV, None)],
            || {
                let err = AnalysisOptions::from_env().unwrap_err();
                assert_eq!(
                    err,
                    Error::InvalidConfig {
                        key: COST_MODEL_ENV.to_string(),
                        value: "on-entry".to_string(),
                    }
                );
            },
        );
    }

    #[test]
    fn test_deserialize_partial() {
        let options: AnalysisOptions =
            serde_json::from_str(r#"{"cost-model": "inclusive"}"#).unwrap();
        assert_eq!(options.cost_model, CostModel::Inclusive);
        assert_eq!(options.tie_break, TieBreak::Lexicographic);
    }
}
