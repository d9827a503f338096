use thiserror::Error;

/// Errors returned by clustering operations.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cluster: no vectors to cluster")]
    Empty,

    #[error("cluster: invalid k={k} for {n} points")]
    InvalidK { k: usize, n: usize },

    #[error("cluster: {ids} ids but {labels} labels")]
    LengthMismatch { ids: usize, labels: usize },

    #[error("cluster: dimension mismatch at row {row}: expected {expected}, got {got}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("cluster: non-finite value at row {row}, column {col}")]
    NonFinite { row: usize, col: usize },

    #[error("cluster: invalid parameter: {0}")]
    InvalidParam(String),

    #[error("cluster: {linkage} linkage requires euclidean distance")]
    LinkageMetric { linkage: &'static str },

    #[error("cluster: invalid config: {0}")]
    Config(String),
}
