use serde::Serialize;
use tracing::{debug, info};

use lectern_cluster::{
    Algorithm, ClusterAssignment, ClusterEngine, ClusteringRun, DensitySearch, KSearch, Label,
    NOISE,
};
use lectern_corpus::Corpus;
use lectern_micro::{MicroClusterBuilder, SelectionResult};
use lectern_theme::ThemeLabeler;

use crate::collection::{Collection, collections};
use crate::config::LecternConfig;
use crate::error::LecternError;
use crate::summary::{ClusterSummary, summarize};

/// A coarse cluster big enough to be worth subdividing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LargeCluster {
    pub label: Label,
    pub size: usize,
}

/// A clustering run with content summaries of its clusters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run: ClusteringRun,
    pub summaries: Vec<ClusterSummary>,
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub k_search: Option<KSearch>,
    /// k of the k-means run the micro-clusters were built from.
    pub chosen_k: usize,
    /// k-means, then each linkage, then DBSCAN when parameters were found.
    pub runs: Vec<RunReport>,
    pub density_search: Option<DensitySearch>,
    pub selection: SelectionResult,
    pub collections: Vec<Collection>,
    /// k-means clusters of at least `large_cluster_size` members, largest
    /// first.
    pub large_clusters: Vec<LargeCluster>,
}

impl Report {
    pub fn to_json(&self) -> Result<String, LecternError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The k-means run and its summaries.
    pub fn kmeans(&self) -> Option<&RunReport> {
        self.runs
            .iter()
            .find(|r| matches!(r.run.algorithm, Algorithm::KMeans { .. }))
    }
}

/// The full pipeline: coarse clustering, micro-clusters, labels.
#[derive(Debug, Clone)]
pub struct Lectern {
    config: LecternConfig,
    engine: ClusterEngine,
    builder: MicroClusterBuilder,
    labeler: ThemeLabeler,
}

impl Lectern {
    /// Validates `config` and sets up every stage.
    pub fn new(config: LecternConfig) -> Result<Self, LecternError> {
        config.validate()?;
        Ok(Self {
            engine: ClusterEngine::new(config.engine.clone())?,
            builder: MicroClusterBuilder::new(config.micro.clone())?,
            labeler: ThemeLabeler::new(config.theme.clone())?,
            config,
        })
    }

    pub fn config(&self) -> &LecternConfig {
        &self.config
    }

    pub fn engine(&self) -> &ClusterEngine {
        &self.engine
    }

    /// Micro-clusters of an existing coarse assignment.
    pub fn micro_clusters(
        &self,
        corpus: &Corpus,
        assignment: &ClusterAssignment,
    ) -> Result<SelectionResult, LecternError> {
        Ok(self.builder.run(corpus, assignment)?)
    }

    /// Collection records for a selection.
    pub fn collections(
        &self,
        corpus: &Corpus,
        selection: &SelectionResult,
    ) -> Result<Vec<Collection>, LecternError> {
        collections(corpus, selection, &self.labeler)
    }

    /// Runs every stage over `corpus`.
    pub fn run(&self, corpus: &Corpus) -> Result<Report, LecternError> {
        let analysis = self.engine.analyze(corpus)?;
        let (coarse, chosen_k) = match (&analysis.kmeans, analysis.chosen_k) {
            (Some(run), Some(k)) => (&run.assignment, k),
            _ => return Err(LecternError::Config("no k-means run to subdivide".into())),
        };

        let large_clusters = large_clusters(coarse, self.config.large_cluster_size);
        info!("{} clusters with at least {} members", large_clusters.len(), self.config.large_cluster_size);

        let selection = self.micro_clusters(corpus, coarse)?;
        let collections = self.collections(corpus, &selection)?;
        info!("built {} focused collections", collections.len());

        let runs = analysis
            .runs()
            .map(|run| {
                let summaries = summarize(corpus, &run.assignment, &self.config.summary)?;
                debug!("{:?}: summarized {} clusters", run.algorithm, summaries.len());
                Ok::<_, LecternError>(RunReport {
                    run: run.clone(),
                    summaries,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Report {
            k_search: analysis.k_search,
            chosen_k,
            runs,
            density_search: analysis.density_search,
            selection,
            collections,
            large_clusters,
        })
    }
}

/// Non-noise clusters with at least `min_size` members, by descending size
/// then label.
pub fn large_clusters(assignment: &ClusterAssignment, min_size: usize) -> Vec<LargeCluster> {
    let mut out: Vec<LargeCluster> = assignment
        .sizes()
        .into_iter()
        .filter(|&(label, size)| label != NOISE && size >= min_size)
        .map(|(label, size)| LargeCluster { label, size })
        .collect();
    out.sort_by(|a, b| b.size.cmp(&a.size).then(a.label.cmp(&b.label)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_clusters_by_size() {
        let mut labels = vec![2; 16];
        labels.extend(vec![0; 20]);
        labels.extend(vec![1; 3]);
        labels.extend(vec![NOISE; 30]);
        labels.extend(vec![5; 16]);
        let ids = (0..labels.len()).map(|i| format!("d{i}")).collect();
        let a = ClusterAssignment::new(ids, labels).unwrap();

        let large = large_clusters(&a, 15);
        assert_eq!(
            large,
            vec![
                LargeCluster { label: 0, size: 20 },
                LargeCluster { label: 2, size: 16 },
                LargeCluster { label: 5, size: 16 },
            ]
        );
    }

    #[test]
    fn rejects_invalid_config() {
        let mut cfg = LecternConfig::default();
        cfg.micro.min_size = 0;
        assert!(matches!(Lectern::new(cfg), Err(LecternError::Micro(_))));
    }
}
