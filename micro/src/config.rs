use serde::{Deserialize, Serialize};

use crate::error::MicroError;

/// Controls subdivision and selection of micro-clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroConfig {
    /// Minimum average pairwise cosine similarity of a candidate.
    pub similarity_threshold: f64,

    /// Preferred candidate size; drives the sub-cluster count and breaks
    /// similarity ties during selection.
    pub target_size: usize,

    /// Smallest candidate size.
    pub min_size: usize,

    /// Largest candidate size.
    pub max_size: usize,

    /// Clusters at least this large are subdivided with k-means.
    pub subdivide_min_size: usize,

    /// Clusters in `[whole_cluster_min_size, subdivide_min_size)` may be
    /// adopted whole when they also fit within `max_size`.
    pub whole_cluster_min_size: usize,

    /// Maximum number of selected micro-clusters.
    pub global_cap: usize,

    /// Maximum number of selected micro-clusters sharing a parent.
    pub per_parent_cap: usize,

    /// Seed of the subdividing k-means.
    pub seed: u64,

    /// k-means restarts per subdivision.
    pub n_init: usize,
}

impl Default for MicroConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.65,
            target_size: 5,
            min_size: 3,
            max_size: 7,
            subdivide_min_size: 10,
            whole_cluster_min_size: 8,
            global_cap: 15,
            per_parent_cap: 2,
            seed: 42,
            n_init: 10,
        }
    }
}

impl MicroConfig {
    pub fn validate(&self) -> Result<(), MicroError> {
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(MicroError::Config(format!(
                "similarity_threshold {} outside [-1, 1]",
                self.similarity_threshold
            )));
        }
        if self.target_size == 0 {
            return Err(MicroError::Config("target_size must be positive".into()));
        }
        if self.min_size < 2 || self.min_size > self.max_size {
            return Err(MicroError::Config(format!(
                "size bounds {}..={} are invalid",
                self.min_size, self.max_size
            )));
        }
        if self.subdivide_min_size < 2 {
            return Err(MicroError::Config("subdivide_min_size must be at least 2".into()));
        }
        if self.whole_cluster_min_size > self.subdivide_min_size {
            return Err(MicroError::Config(
                "whole_cluster_min_size exceeds subdivide_min_size".into(),
            ));
        }
        if self.global_cap == 0 || self.per_parent_cap == 0 {
            return Err(MicroError::Config("selection caps must be positive".into()));
        }
        if self.n_init == 0 {
            return Err(MicroError::Config("n_init must be positive".into()));
        }
        Ok(())
    }
}
