//! Error enum grounded on the controller's own (thiserror-based) error
//! surface — kube's `Controller` requires `std::error::Error + 'static` on
//! both the reconciler and cleanup-item errors, which the workspace's
//! `error-chain` crates don't satisfy directly, hence the split (SPEC_FULL
//! ambient stack, Kubernetes runtime section).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),

    #[error("finalizer error: {0}")]
    Finalizer(#[from] Box<kube::runtime::finalizer::Error<Error>>),

    #[error("assembling configuration tree: {0}")]
    Assemble(#[source] confctl_repo::Error),

    #[error("generating artifacts: {0}")]
    Generate(#[source] confctl_generator::Error),

    #[error("serializing object: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("object {0} has no name")]
    MissingName(String),

    #[error("object {0} not found")]
    NotFound(String),

    #[error("giving up on {0} after exhausting retries")]
    RetriesExhausted(String),

    #[error("request record {0} is missing its namespace")]
    MissingNamespace(String),

    #[error("blocking pipeline task panicked or was cancelled: {0}")]
    Blocking(String),
}

pub type Result<T> = std::result::Result<T, Error>;
