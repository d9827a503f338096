use lectern_cluster::ClusterError;
use lectern_micro::MicroError;
use lectern_theme::ThemeError;
use thiserror::Error;

/// Errors returned by the pipeline.
#[derive(Debug, Error)]
pub enum LecternError {
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Micro(#[from] MicroError),

    #[error(transparent)]
    Theme(#[from] ThemeError),

    #[error("lectern: document {0:?} is not in the corpus")]
    UnknownDocument(String),

    #[error("lectern: invalid config: {0}")]
    Config(String),

    #[error("lectern: yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("lectern: json: {0}")]
    Json(#[from] serde_json::Error),
}
