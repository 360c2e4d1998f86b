use futures::task::SpawnError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PerchError>;

/// Rejection reported by a geometry solver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("element detached during computation")]
    DetachedElement,

    #[error("geometry solver rejected the request: {reason}")]
    Rejected { reason: String },
}

impl SolverError {
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PerchError {
    #[error("position computation failed: {0}")]
    Solver(#[from] SolverError),

    #[error("could not schedule position computation: {0}")]
    Spawn(#[from] SpawnError),
}
