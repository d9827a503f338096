use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use lectern_corpus::{Corpus, DocId};

use crate::agglomerative::{Agglomerative, Linkage, Metric};
use crate::assignment::{ClusterAssignment, Label};
use crate::config::{EngineConfig, Family};
use crate::dbscan::Dbscan;
use crate::error::ClusterError;
use crate::kmeans::KMeans;
use crate::metrics::{ClusterMetrics, compute_metrics};
use crate::scaler::{Scaler, check_rows, rows};
use crate::search::{self, DensitySearch, KSearch};

/// Labels produced by one clustering algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct Fit {
    pub labels: Vec<Label>,
    /// Present for centroid-based algorithms only.
    pub inertia: Option<f64>,
}

/// A clustering algorithm with its hyperparameters bound.
pub trait Clusterer {
    /// Short algorithm name used in logs.
    fn name(&self) -> &'static str;

    /// Labels every row of `vectors`.
    fn cluster(&self, vectors: &[&[f64]]) -> Result<Fit, ClusterError>;
}

impl Clusterer for KMeans {
    fn name(&self) -> &'static str {
        "kmeans"
    }

    fn cluster(&self, vectors: &[&[f64]]) -> Result<Fit, ClusterError> {
        let fit = self.fit(vectors)?;
        Ok(Fit {
            labels: fit.labels,
            inertia: Some(fit.inertia),
        })
    }
}

impl Clusterer for Agglomerative {
    fn name(&self) -> &'static str {
        "agglomerative"
    }

    fn cluster(&self, vectors: &[&[f64]]) -> Result<Fit, ClusterError> {
        Ok(Fit {
            labels: self.fit(vectors)?,
            inertia: None,
        })
    }
}

impl Clusterer for Dbscan {
    fn name(&self) -> &'static str {
        "dbscan"
    }

    fn cluster(&self, vectors: &[&[f64]]) -> Result<Fit, ClusterError> {
        Ok(Fit {
            labels: self.fit(vectors)?,
            inertia: None,
        })
    }
}

/// Algorithm selection with its hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum Algorithm {
    KMeans {
        k: usize,
    },
    Agglomerative {
        k: usize,
        linkage: Linkage,
        /// Defaults to the linkage's own metric.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metric: Option<Metric>,
    },
    Dbscan {
        radius: f64,
        min_pts: usize,
    },
}

impl Algorithm {
    /// Agglomerative run with the linkage's default metric.
    pub fn agglomerative(k: usize, linkage: Linkage) -> Self {
        Algorithm::Agglomerative {
            k,
            linkage,
            metric: None,
        }
    }

    /// Builds the clusterer, taking seed and iteration limits from `config`.
    pub fn clusterer(&self, config: &EngineConfig) -> Box<dyn Clusterer> {
        match *self {
            Algorithm::KMeans { k } => Box::new(config.kmeans(k)),
            Algorithm::Agglomerative { k, linkage, metric } => {
                let a = Agglomerative::new(k, linkage);
                Box::new(match metric {
                    Some(m) => a.with_metric(m),
                    None => a,
                })
            }
            Algorithm::Dbscan { radius, min_pts } => Box::new(Dbscan::new(radius, min_pts)),
        }
    }
}

/// Labels of one run keyed by document id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition {
    pub assignment: ClusterAssignment,
    pub inertia: Option<f64>,
}

/// One algorithm run with its quality metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteringRun {
    pub algorithm: Algorithm,
    pub assignment: ClusterAssignment,
    pub metrics: ClusterMetrics,
}

/// Every run of [`ClusterEngine::analyze`].
///
/// Stages of families left out of [`EngineConfig::algorithms`] are `None`
/// or empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Present when k-means or hierarchical clustering ran.
    pub k_search: Option<KSearch>,
    /// k used by the k-means and agglomerative runs.
    pub chosen_k: Option<usize>,
    pub kmeans: Option<ClusteringRun>,
    /// One run per configured linkage, in configuration order.
    pub hierarchical: Vec<ClusteringRun>,
    pub density_search: Option<DensitySearch>,
    /// Present when the density search found parameters.
    pub dbscan: Option<ClusteringRun>,
}

impl Analysis {
    /// All runs: k-means, agglomerative, then DBSCAN.
    pub fn runs(&self) -> impl Iterator<Item = &ClusteringRun> {
        self.kmeans
            .iter()
            .chain(self.hierarchical.iter())
            .chain(self.dbscan.iter())
    }
}

/// Partitions document embeddings and scores the result.
///
/// The engine is stateless between calls; everything it needs comes from
/// its [`EngineConfig`]. Methods take vectors as row slices so callers can
/// pass either raw or [`normalize`](Self::normalize)d matrices.
#[derive(Debug, Clone)]
pub struct ClusterEngine {
    config: EngineConfig,
}

impl ClusterEngine {
    /// Validates `config` and creates an engine.
    pub fn new(config: EngineConfig) -> Result<Self, ClusterError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Standardizes features when the config asks for it, otherwise copies
    /// the input after validating it.
    pub fn normalize(&self, vectors: &[&[f64]]) -> Result<Vec<Vec<f64>>, ClusterError> {
        if self.config.standardize {
            let (_, out) = Scaler::fit_transform(vectors)?;
            return Ok(out);
        }
        check_rows(vectors)?;
        Ok(vectors.iter().map(|v| v.to_vec()).collect())
    }

    /// Runs one algorithm and attaches the labels to `ids`.
    pub fn partition_cluster(
        &self,
        ids: &[DocId],
        vectors: &[&[f64]],
        algorithm: &Algorithm,
    ) -> Result<Partition, ClusterError> {
        if ids.len() != vectors.len() {
            return Err(ClusterError::LengthMismatch {
                ids: ids.len(),
                labels: vectors.len(),
            });
        }
        let clusterer = algorithm.clusterer(&self.config);
        debug!("running {} over {} vectors", clusterer.name(), vectors.len());
        let fit = clusterer.cluster(vectors)?;
        Ok(Partition {
            assignment: ClusterAssignment::new(ids.to_vec(), fit.labels)?,
            inertia: fit.inertia,
        })
    }

    /// Metrics of a partition over the vectors it was computed from.
    pub fn evaluate(
        &self,
        vectors: &[&[f64]],
        partition: &Partition,
    ) -> Result<ClusterMetrics, ClusterError> {
        compute_metrics(vectors, partition.assignment.labels(), partition.inertia)
    }

    /// Partitions and evaluates in one step.
    pub fn run(
        &self,
        ids: &[DocId],
        vectors: &[&[f64]],
        algorithm: &Algorithm,
    ) -> Result<ClusteringRun, ClusterError> {
        let partition = self.partition_cluster(ids, vectors, algorithm)?;
        let metrics = self.evaluate(vectors, &partition)?;
        info!(
            "{:?}: {} clusters, {} noise, silhouette {:.3}",
            algorithm, metrics.n_clusters, metrics.n_noise, metrics.silhouette
        );
        Ok(ClusteringRun {
            algorithm: algorithm.clone(),
            assignment: partition.assignment,
            metrics,
        })
    }

    /// k-means sweep over the configured k range.
    pub fn search_optimal_k(&self, vectors: &[&[f64]]) -> Result<KSearch, ClusterError> {
        search::search_optimal_k(vectors, &self.config.k_range.values(), &self.config.kmeans(1))
    }

    /// DBSCAN grid over the configured radii and neighborhood sizes.
    pub fn search_density_params(&self, vectors: &[&[f64]]) -> Result<DensitySearch, ClusterError> {
        search::search_density_params(
            vectors,
            &self.config.density_radius_values,
            &self.config.density_minpts_values,
        )
    }

    /// Full analysis of a corpus.
    ///
    /// Normalizes once and runs the configured families. k-means and the
    /// agglomerative linkages share one k: the silhouette optimum of the k
    /// sweep, falling back to `fallback_k` clamped to the corpus size. DBSCAN
    /// runs with the best parameters of the density search, if any.
    pub fn analyze(&self, corpus: &Corpus) -> Result<Analysis, ClusterError> {
        info!(
            "analyzing {} documents of dimension {} with {:?}",
            corpus.len(),
            corpus.dim(),
            self.config.algorithms
        );
        let ids = corpus.ids();
        let normalized = self.normalize(&corpus.vectors())?;
        let vectors = rows(&normalized);

        let mut analysis = Analysis {
            k_search: None,
            chosen_k: None,
            kmeans: None,
            hierarchical: Vec::new(),
            density_search: None,
            dbscan: None,
        };

        if self.config.runs(Family::KMeans) || self.config.runs(Family::Hierarchical) {
            let k_search = self.search_optimal_k(&vectors)?;
            let chosen_k = match k_search.optimal.silhouette {
                Some(k) => k,
                None => {
                    let k = self.config.fallback_k.min(vectors.len());
                    warn!("no silhouette optimum, falling back to k={}", k);
                    k
                }
            };
            analysis.k_search = Some(k_search);
            analysis.chosen_k = Some(chosen_k);

            if self.config.runs(Family::KMeans) {
                let algorithm = Algorithm::KMeans { k: chosen_k };
                analysis.kmeans = Some(self.run(&ids, &vectors, &algorithm)?);
            }
            if self.config.runs(Family::Hierarchical) {
                analysis.hierarchical = self
                    .config
                    .linkage_methods
                    .iter()
                    .map(|&linkage| {
                        self.run(&ids, &vectors, &Algorithm::agglomerative(chosen_k, linkage))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
            }
        }

        if self.config.runs(Family::Dbscan) {
            let density_search = self.search_density_params(&vectors)?;
            if let Some(p) = density_search.best {
                let algorithm = Algorithm::Dbscan {
                    radius: p.radius,
                    min_pts: p.min_pts,
                };
                analysis.dbscan = Some(self.run(&ids, &vectors, &algorithm)?);
            }
            analysis.density_search = Some(density_search);
        }

        Ok(analysis)
    }
}
