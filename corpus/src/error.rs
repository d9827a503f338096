use thiserror::Error;

/// Errors returned when assembling a [`crate::Corpus`].
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus: empty corpus")]
    Empty,

    #[error("corpus: {vectors} vectors but {records} metadata records")]
    LengthMismatch { vectors: usize, records: usize },

    #[error("corpus: dimension mismatch for {id}: expected {expected}, got {got}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        got: usize,
    },

    #[error("corpus: zero-dimensional vector for {0}")]
    ZeroDimension(String),

    #[error("corpus: duplicate document id {0}")]
    DuplicateId(String),
}
