// Engine and registry error types

use thiserror::Error;
use uuid::Uuid;

/// Internal faults while advancing a unit through the graph.
///
/// These are engine-level errors, distinct from task failures: a failing
/// task folds into the job aggregate and drives a transition, while any of
/// these marks the job Errored and ends that unit's walk.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("chain link {0} not found in the workflow store")]
    UnknownLink(String),

    #[error("chain {0} not found in the workflow store")]
    UnknownChain(String),

    #[error("link {0} offers no choices")]
    NoChoicesAvailable(String),

    #[error("approval channel closed before job {0} was resolved")]
    ResolutionLost(Uuid),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors from the pending-approval registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Registering the same job id twice is a programming error
    #[error("job {0} is already registered as pending")]
    DuplicateJob(Uuid),

    /// The normal outcome of a stale or duplicate approval attempt
    #[error("no matching job is awaiting approval")]
    NotFound,
}
