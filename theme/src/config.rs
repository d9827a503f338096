use serde::{Deserialize, Serialize};

/// Controls theme matching and headline construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Cited works carried into a label's `primary_works`.
    pub primary_works: usize,

    /// Match keywords only at word boundaries. Off by default, so `"ai"`
    /// also matches inside `"said"`.
    pub whole_words: bool,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            primary_works: 2,
            whole_words: false,
        }
    }
}
