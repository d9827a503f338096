//! Clustering engine for document embeddings.
//!
//! Three algorithm families share one [`Clusterer`] seam:
//!
//! - [`KMeans`]: centroid-based, seeded k-means++ with restarts
//! - [`Agglomerative`]: bottom-up merging with ward, complete, average or
//!   single linkage
//! - [`Dbscan`]: density-based over cosine distance, with a noise label
//!
//! Every run is scored with silhouette, Calinski–Harabasz and Davies–Bouldin
//! ([`compute_metrics`]), and the two searches pick hyperparameters from
//! those scores: [`search_optimal_k`] for k-means and
//! [`search_density_params`] for DBSCAN.
//!
//! # Usage
//!
//! ```
//! use lectern_cluster::{Algorithm, ClusterEngine, EngineConfig, KRange};
//!
//! let ids: Vec<String> = (0..6).map(|i| format!("doc-{i}")).collect();
//! let m = vec![
//!     vec![0.0, 0.0], vec![0.1, 0.0], vec![0.0, 0.1],
//!     vec![5.0, 5.0], vec![5.1, 5.0], vec![5.0, 5.1],
//! ];
//! let vectors: Vec<&[f64]> = m.iter().map(|v| v.as_slice()).collect();
//!
//! let engine = ClusterEngine::new(EngineConfig {
//!     k_range: KRange::new(2, 4),
//!     ..Default::default()
//! })
//! .unwrap();
//! let run = engine.run(&ids, &vectors, &Algorithm::KMeans { k: 2 }).unwrap();
//! assert_eq!(run.metrics.n_clusters, 2);
//! ```
//!
//! # Determinism
//!
//! All randomness comes from a seeded `StdRng`. Grid searches evaluate
//! cells in parallel but judge them in ascending parameter order, so the
//! chosen parameters never depend on scheduling.

mod agglomerative;
mod assignment;
mod cluster;
mod config;
mod dbscan;
mod error;
mod kmeans;
mod metrics;
mod scaler;
mod search;

pub use agglomerative::{Agglomerative, Linkage, Metric};
pub use assignment::{ClusterAssignment, Label, NOISE};
pub use cluster::{Algorithm, Analysis, ClusterEngine, Clusterer, ClusteringRun, Fit, Partition};
pub use config::{EngineConfig, Family, KRange};
pub use dbscan::Dbscan;
pub use error::ClusterError;
pub use kmeans::{KMeans, KMeansFit};
pub use metrics::{ClusterMetrics, PairwiseDistances, compute_metrics, compute_metrics_with};
pub use scaler::{Scaler, rows};
pub use search::{
    DensityParams, DensitySearch, DensityTrial, KSearch, KTrial, MAX_NOISE_RATIO, OptimalK, elbow,
    search_density_params, search_optimal_k,
};
