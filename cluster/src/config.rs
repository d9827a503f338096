use serde::{Deserialize, Serialize};

use crate::agglomerative::Linkage;
use crate::error::ClusterError;
use crate::kmeans::KMeans;

/// Inclusive range of cluster counts swept by the k search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KRange {
    pub min: usize,
    pub max: usize,
    #[serde(default = "default_step")]
    pub step: usize,
}

fn default_step() -> usize {
    1
}

impl KRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max, step: 1 }
    }

    /// Swept k values in ascending order. Empty when `min > max` or
    /// `step == 0`.
    pub fn values(&self) -> Vec<usize> {
        if self.step == 0 || self.min > self.max {
            return Vec::new();
        }
        (self.min..=self.max).step_by(self.step).collect()
    }
}

impl Default for KRange {
    fn default() -> Self {
        Self {
            min: 2,
            max: 30,
            step: 1,
        }
    }
}

/// Algorithm family run by [`ClusterEngine::analyze`](crate::ClusterEngine::analyze).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// k sweep, then k-means at the chosen k.
    KMeans,
    /// One agglomerative run per configured linkage at the chosen k.
    Hierarchical,
    /// Density parameter search, then DBSCAN with the best parameters.
    Dbscan,
}

impl Family {
    pub const ALL: [Family; 3] = [Family::KMeans, Family::Hierarchical, Family::Dbscan];
}

/// Controls the clustering engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Families run by a full analysis. Order does not matter.
    pub algorithms: Vec<Family>,

    /// Cluster counts swept by the k-means search.
    pub k_range: KRange,

    /// Linkages run by the agglomerative stage, in order.
    pub linkage_methods: Vec<Linkage>,

    /// DBSCAN neighborhood radii (cosine distance) for the grid search.
    pub density_radius_values: Vec<f64>,

    /// DBSCAN minimum neighborhood sizes for the grid search.
    pub density_minpts_values: Vec<usize>,

    /// Seed for every randomized step.
    pub seed: u64,

    /// k-means restarts per fit.
    pub n_init: usize,

    /// k-means Lloyd iterations per restart.
    pub max_iter: usize,

    /// Cluster count used when the search yields no silhouette optimum.
    pub fallback_k: usize,

    /// Standardize features before clustering.
    pub standardize: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            algorithms: Family::ALL.to_vec(),
            k_range: KRange::default(),
            linkage_methods: vec![Linkage::Ward, Linkage::Complete, Linkage::Average],
            density_radius_values: vec![0.1, 0.2, 0.3, 0.4, 0.5],
            density_minpts_values: vec![3, 5, 7, 10],
            seed: KMeans::DEFAULT_SEED,
            n_init: KMeans::DEFAULT_N_INIT,
            max_iter: KMeans::DEFAULT_MAX_ITER,
            fallback_k: 15,
            standardize: true,
        }
    }
}

impl EngineConfig {
    /// Rejects configurations no run could succeed with.
    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.algorithms.is_empty() {
            return Err(ClusterError::Config("no algorithm families selected".into()));
        }
        if self.k_range.values().is_empty() {
            return Err(ClusterError::Config(format!(
                "empty k range {}..={} step {}",
                self.k_range.min, self.k_range.max, self.k_range.step
            )));
        }
        if self.k_range.min == 0 {
            return Err(ClusterError::Config("k range must start at 1 or above".into()));
        }
        if self.n_init == 0 || self.max_iter == 0 {
            return Err(ClusterError::Config("n_init and max_iter must be positive".into()));
        }
        if self.fallback_k == 0 {
            return Err(ClusterError::Config("fallback_k must be positive".into()));
        }
        if let Some(r) = self
            .density_radius_values
            .iter()
            .find(|r| !r.is_finite() || **r < 0.0)
        {
            return Err(ClusterError::Config(format!("invalid density radius {r}")));
        }
        if self.density_minpts_values.contains(&0) {
            return Err(ClusterError::Config("density min_pts must be positive".into()));
        }
        Ok(())
    }

    /// Whether a full analysis runs `family`.
    pub fn runs(&self, family: Family) -> bool {
        self.algorithms.contains(&family)
    }

    /// k-means template carrying this config's seed and iteration limits.
    pub fn kmeans(&self, k: usize) -> KMeans {
        KMeans::new(k)
            .with_seed(self.seed)
            .with_n_init(self.n_init)
            .with_max_iter(self.max_iter)
    }
}
