//! Error types for unexpected lifecycle failures
//!
//! Expected outcomes (cycles, unmet constraints, protected plugins, ...) are
//! reported as [`crate::OperationResult`] values, never as errors.

use plugman_graph::GraphError;
use thiserror::Error;

use crate::result::ImpactInvariantError;

/// Failures that abort an operation without touching plugin state
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("inconsistent dependency impact: {0}")]
    InconsistentImpact(#[from] ImpactInvariantError),

    #[error("dependency graph rejected change: {0}")]
    Graph(#[from] GraphError),

    #[error("plugin storage failure: {0}")]
    Storage(anyhow::Error),
}

pub type LifecycleResult<T> = std::result::Result<T, LifecycleError>;
