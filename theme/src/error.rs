use thiserror::Error;

/// Errors returned when building a labeler.
#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("theme: invalid citation pattern: {0}")]
    Pattern(#[from] regex::Error),
}
