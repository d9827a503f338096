use lectern_cluster::ClusterError;
use thiserror::Error;

/// Errors returned by micro-cluster construction.
#[derive(Debug, Error)]
pub enum MicroError {
    #[error("micro: invalid config: {0}")]
    Config(String),

    #[error("micro: document {0:?} is not in the corpus")]
    UnknownDocument(String),

    #[error(transparent)]
    Cluster(#[from] ClusterError),
}
