use serde::Serialize;
use tracing::{debug, info};

use lectern_cluster::{ClusterAssignment, KMeans, Label};
use lectern_corpus::{Corpus, DocId, SimilarityMatrix};

use crate::config::MicroConfig;
use crate::error::MicroError;

/// A small, tightly coherent group of documents carved out of one coarse
/// cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MicroCluster {
    /// `"{parent}.{sub}"`, or `"{parent}.0"` for a whole adopted cluster.
    pub id: String,
    pub parent_cluster_id: Label,
    /// Members in corpus order.
    pub member_ids: Vec<DocId>,
    /// Mean cosine similarity over all member pairs.
    pub avg_pairwise_similarity: f64,
}

impl MicroCluster {
    pub fn size(&self) -> usize {
        self.member_ids.len()
    }
}

/// Micro-clusters chosen by [`select`], best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionResult {
    pub clusters: Vec<MicroCluster>,
}

impl SelectionResult {
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MicroCluster> {
        self.clusters.iter()
    }

    /// Documents covered by the selection.
    pub fn total_documents(&self) -> usize {
        self.clusters.iter().map(|c| c.size()).sum()
    }

    /// Mean micro-cluster size; 0 when empty.
    pub fn avg_size(&self) -> f64 {
        if self.clusters.is_empty() {
            return 0.0;
        }
        self.total_documents() as f64 / self.clusters.len() as f64
    }

    /// Mean of the members' average pairwise similarity; 0 when empty.
    pub fn avg_similarity(&self) -> f64 {
        if self.clusters.is_empty() {
            return 0.0;
        }
        self.clusters
            .iter()
            .map(|c| c.avg_pairwise_similarity)
            .sum::<f64>()
            / self.clusters.len() as f64
    }
}

/// Turns a coarse clustering into micro-cluster candidates and picks a
/// diverse subset of them.
#[derive(Debug, Clone)]
pub struct MicroClusterBuilder {
    config: MicroConfig,
}

impl MicroClusterBuilder {
    pub fn new(config: MicroConfig) -> Result<Self, MicroError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MicroConfig {
        &self.config
    }

    /// Splits one coarse cluster with k-means into
    /// `max(2, n / target_size)` groups over the members' raw vectors and
    /// keeps every group of acceptable size and coherence.
    ///
    /// `members` are corpus positions. Clusters smaller than
    /// `subdivide_min_size` yield nothing.
    pub fn subdivide(
        &self,
        corpus: &Corpus,
        parent: Label,
        members: &[usize],
    ) -> Result<Vec<MicroCluster>, MicroError> {
        let cfg = &self.config;
        let n = members.len();
        if n < cfg.subdivide_min_size {
            return Ok(Vec::new());
        }

        let vectors = member_vectors(corpus, members)?;
        let sims = SimilarityMatrix::new(&vectors);
        let g = (n / cfg.target_size).max(2);
        let fit = KMeans::new(g)
            .with_seed(cfg.seed)
            .with_n_init(cfg.n_init)
            .fit(&vectors)?;

        let mut out = Vec::new();
        for sub in 0..g {
            let local: Vec<usize> = fit
                .labels
                .iter()
                .enumerate()
                .filter(|&(_, &l)| l == sub as Label)
                .map(|(i, _)| i)
                .collect();
            if local.len() < cfg.min_size || local.len() > cfg.max_size {
                debug!("sub-cluster {}.{} has {} members, skipped", parent, sub, local.len());
                continue;
            }
            let sim = sims.average_pairwise(&local);
            if sim < cfg.similarity_threshold {
                debug!("sub-cluster {}.{} similarity {:.3} below threshold", parent, sub, sim);
                continue;
            }
            debug!("created micro-cluster {}.{}: {} members (sim {:.3})", parent, sub, local.len(), sim);
            out.push(MicroCluster {
                id: format!("{parent}.{sub}"),
                parent_cluster_id: parent,
                member_ids: ids_of(corpus, members, &local),
                avg_pairwise_similarity: sim,
            });
        }
        Ok(out)
    }

    /// Adopts a mid-sized cluster whole when it already fits the size bounds
    /// and is coherent enough. Only clusters with size in
    /// `[whole_cluster_min_size, subdivide_min_size)` and at most `max_size`
    /// qualify.
    pub fn adopt_whole(
        &self,
        corpus: &Corpus,
        parent: Label,
        members: &[usize],
    ) -> Result<Option<MicroCluster>, MicroError> {
        let cfg = &self.config;
        let n = members.len();
        if n < cfg.whole_cluster_min_size || n >= cfg.subdivide_min_size || n > cfg.max_size {
            return Ok(None);
        }

        let vectors = member_vectors(corpus, members)?;
        let sim = SimilarityMatrix::new(&vectors).average();
        if sim < cfg.similarity_threshold {
            return Ok(None);
        }
        debug!("adopted whole cluster {}: {} members (sim {:.3})", parent, n, sim);
        let all: Vec<usize> = (0..n).collect();
        Ok(Some(MicroCluster {
            id: format!("{parent}.0"),
            parent_cluster_id: parent,
            member_ids: ids_of(corpus, members, &all),
            avg_pairwise_similarity: sim,
        }))
    }

    /// All candidates of a coarse clustering.
    ///
    /// Clusters are visited by descending size, label ascending on ties;
    /// noise is never a parent. Subdivision candidates of every large
    /// cluster come first, then whole-cluster adoptions.
    pub fn build(
        &self,
        corpus: &Corpus,
        assignment: &ClusterAssignment,
    ) -> Result<Vec<MicroCluster>, MicroError> {
        let mut clusters: Vec<(Label, Vec<usize>)> = Vec::new();
        for (label, local) in assignment.clusters() {
            let positions = local
                .iter()
                .map(|&i| {
                    let id = &assignment.ids()[i];
                    corpus
                        .position(id)
                        .ok_or_else(|| MicroError::UnknownDocument(id.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            clusters.push((label, positions));
        }
        clusters.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));

        let mut candidates = Vec::new();
        for (label, members) in &clusters {
            candidates.extend(self.subdivide(corpus, *label, members)?);
        }
        for (label, members) in &clusters {
            candidates.extend(self.adopt_whole(corpus, *label, members)?);
        }
        info!(
            "built {} micro-cluster candidates from {} clusters",
            candidates.len(),
            clusters.len()
        );
        Ok(candidates)
    }

    /// Applies [`select`] with this builder's caps.
    pub fn select(&self, candidates: Vec<MicroCluster>) -> SelectionResult {
        select(
            candidates,
            self.config.target_size,
            self.config.global_cap,
            self.config.per_parent_cap,
        )
    }

    /// Builds candidates and selects from them.
    pub fn run(
        &self,
        corpus: &Corpus,
        assignment: &ClusterAssignment,
    ) -> Result<SelectionResult, MicroError> {
        let candidates = self.build(corpus, assignment)?;
        let selection = self.select(candidates);
        info!(
            "selected {} micro-clusters, avg size {:.1}, avg similarity {:.3}",
            selection.len(),
            selection.avg_size(),
            selection.avg_similarity()
        );
        Ok(selection)
    }
}

/// Picks a diverse subset of candidates.
///
/// Candidates are ordered by similarity descending, then by distance of
/// their size from `target_size` ascending; the sort is stable. Walking that
/// order, a candidate is skipped when its parent already has
/// `per_parent_cap` selections, and the walk stops at `global_cap`.
pub fn select(
    mut candidates: Vec<MicroCluster>,
    target_size: usize,
    global_cap: usize,
    per_parent_cap: usize,
) -> SelectionResult {
    candidates.sort_by(|a, b| {
        b.avg_pairwise_similarity
            .total_cmp(&a.avg_pairwise_similarity)
            .then(a.size().abs_diff(target_size).cmp(&b.size().abs_diff(target_size)))
    });

    let mut clusters: Vec<MicroCluster> = Vec::new();
    for mc in candidates {
        if clusters.len() >= global_cap {
            break;
        }
        let siblings = clusters
            .iter()
            .filter(|c| c.parent_cluster_id == mc.parent_cluster_id)
            .count();
        if siblings < per_parent_cap {
            clusters.push(mc);
        }
    }
    SelectionResult { clusters }
}

fn member_vectors<'a>(corpus: &'a Corpus, members: &[usize]) -> Result<Vec<&'a [f64]>, MicroError> {
    members
        .iter()
        .map(|&p| {
            corpus
                .get(p)
                .map(|d| d.vector.as_slice())
                .ok_or_else(|| MicroError::UnknownDocument(format!("#{p}")))
        })
        .collect()
}

fn ids_of(corpus: &Corpus, members: &[usize], local: &[usize]) -> Vec<DocId> {
    local
        .iter()
        .filter_map(|&i| corpus.get(members[i]))
        .map(|d| d.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_corpus::Metadata;

    /// Unit-ish vector along `axis` tilted towards `tilt` with a small
    /// per-member jitter.
    fn doc(dim: usize, axis: usize, tilt: usize, jitter: usize) -> Vec<f64> {
        let mut v = vec![0.0; dim];
        v[axis] = 1.0;
        v[tilt] = 0.3;
        v[(tilt + 1) % dim] += 0.01 * jitter as f64;
        v
    }

    /// Two groups of ten, each made of two blobs of five.
    fn two_groups() -> (Corpus, ClusterAssignment) {
        let dim = 12;
        let mut vectors = Vec::new();
        let mut meta = Vec::new();
        let mut labels = Vec::new();
        for (g, (axis, tilts)) in [(0usize, [2usize, 4]), (6, [8, 10])].into_iter().enumerate() {
            for tilt in tilts {
                for j in 0..5 {
                    vectors.push(doc(dim, axis, tilt, j));
                    meta.push(Metadata {
                        id: format!("d{}", meta.len()),
                        ..Default::default()
                    });
                    labels.push(g as Label);
                }
            }
        }
        let corpus = Corpus::from_parts(vectors, meta).unwrap();
        let assignment = ClusterAssignment::new(corpus.ids(), labels).unwrap();
        (corpus, assignment)
    }

    fn candidate(id: &str, parent: Label, size: usize, sim: f64) -> MicroCluster {
        MicroCluster {
            id: id.into(),
            parent_cluster_id: parent,
            member_ids: (0..size).map(|i| format!("{id}-{i}")).collect(),
            avg_pairwise_similarity: sim,
        }
    }

    #[test]
    fn subdivides_groups_into_blobs() {
        let (corpus, assignment) = two_groups();
        let builder = MicroClusterBuilder::new(MicroConfig::default()).unwrap();
        let candidates = builder.build(&corpus, &assignment).unwrap();

        assert_eq!(candidates.len(), 4);
        for c in &candidates {
            assert_eq!(c.size(), 5);
            assert!(c.avg_pairwise_similarity >= 0.65);
        }
        let parents: Vec<Label> = candidates.iter().map(|c| c.parent_cluster_id).collect();
        assert_eq!(parents, vec![0, 0, 1, 1]);
        assert!(candidates.iter().all(|c| c.id.starts_with(&format!("{}.", c.parent_cluster_id))));

        let selection = builder.select(candidates);
        assert_eq!(selection.len(), 4);
        assert_eq!(selection.total_documents(), 20);
        assert_eq!(selection.avg_size(), 5.0);
    }

    #[test]
    fn incoherent_cluster_yields_nothing() {
        // Ten orthogonal documents: every pairwise similarity is 0.
        let dim = 10;
        let vectors: Vec<Vec<f64>> = (0..dim)
            .map(|i| {
                let mut v = vec![0.0; dim];
                v[i] = 1.0;
                v
            })
            .collect();
        let meta = (0..dim)
            .map(|i| Metadata {
                id: format!("o{i}"),
                ..Default::default()
            })
            .collect();
        let corpus = Corpus::from_parts(vectors, meta).unwrap();
        let assignment = ClusterAssignment::new(corpus.ids(), vec![0; dim]).unwrap();

        let builder = MicroClusterBuilder::new(MicroConfig::default()).unwrap();
        assert!(builder.build(&corpus, &assignment).unwrap().is_empty());
    }

    #[test]
    fn small_clusters_are_not_subdivided() {
        let (corpus, _) = two_groups();
        let builder = MicroClusterBuilder::new(MicroConfig::default()).unwrap();
        let members: Vec<usize> = (0..9).collect();
        assert!(builder.subdivide(&corpus, 0, &members).unwrap().is_empty());
    }

    #[test]
    fn whole_cluster_needs_room() {
        let (corpus, _) = two_groups();
        // First blob of group 0 plus four of the second: nine coherent members.
        let members: Vec<usize> = (0..9).collect();

        let builder = MicroClusterBuilder::new(MicroConfig::default()).unwrap();
        assert!(builder.adopt_whole(&corpus, 3, &members).unwrap().is_none());

        let roomy = MicroClusterBuilder::new(MicroConfig {
            max_size: 9,
            ..Default::default()
        })
        .unwrap();
        let mc = roomy.adopt_whole(&corpus, 3, &members).unwrap().unwrap();
        assert_eq!(mc.id, "3.0");
        assert_eq!(mc.size(), 9);
        assert!(mc.avg_pairwise_similarity >= 0.65);
    }

    #[test]
    fn noise_is_never_a_parent() {
        let (corpus, _) = two_groups();
        let labels = vec![lectern_cluster::NOISE; corpus.len()];
        let assignment = ClusterAssignment::new(corpus.ids(), labels).unwrap();
        let builder = MicroClusterBuilder::new(MicroConfig::default()).unwrap();
        assert!(builder.build(&corpus, &assignment).unwrap().is_empty());
    }

    #[test]
    fn unknown_document() {
        let (corpus, _) = two_groups();
        let mut ids = corpus.ids();
        ids[0] = "missing".into();
        let assignment = ClusterAssignment::new(ids, vec![0; corpus.len()]).unwrap();
        let builder = MicroClusterBuilder::new(MicroConfig::default()).unwrap();
        assert!(matches!(
            builder.build(&corpus, &assignment),
            Err(MicroError::UnknownDocument(id)) if id == "missing"
        ));
    }

    #[test]
    fn select_caps_per_parent() {
        let candidates = vec![
            candidate("0.0", 0, 5, 0.95),
            candidate("0.1", 0, 5, 0.94),
            candidate("0.2", 0, 5, 0.93),
            candidate("1.0", 1, 5, 0.80),
        ];
        let sel = select(candidates, 5, 15, 2);
        let ids: Vec<&str> = sel.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["0.0", "0.1", "1.0"]);
    }

    #[test]
    fn select_caps_globally() {
        let candidates: Vec<MicroCluster> = (0..20)
            .map(|p| candidate(&format!("{p}.0"), p, 5, 0.9 - p as f64 * 0.01))
            .collect();
        let sel = select(candidates, 5, 15, 2);
        assert_eq!(sel.len(), 15);
        assert_eq!(sel.clusters[0].id, "0.0");
        assert_eq!(sel.clusters[14].id, "14.0");
    }

    #[test]
    fn select_prefers_target_size_on_ties() {
        let candidates = vec![
            candidate("0.0", 0, 7, 0.9),
            candidate("1.0", 1, 3, 0.9),
            candidate("2.0", 2, 4, 0.9),
            candidate("3.0", 3, 6, 0.9),
        ];
        let sel = select(candidates, 5, 15, 2);
        let ids: Vec<&str> = sel.iter().map(|c| c.id.as_str()).collect();
        // Distance 1 (stable: 2.0 before 3.0), then distance 2 (0.0 before 1.0).
        assert_eq!(ids, vec!["2.0", "3.0", "0.0", "1.0"]);
    }

    #[test]
    fn selection_serializes_in_order() {
        let sel = select(
            vec![candidate("1.0", 1, 3, 0.8), candidate("4.2", 4, 3, 0.9)],
            5,
            15,
            2,
        );
        let value = serde_json::to_value(&sel).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "clusters": [
                    {
                        "id": "4.2",
                        "parent_cluster_id": 4,
                        "member_ids": ["4.2-0", "4.2-1", "4.2-2"],
                        "avg_pairwise_similarity": 0.9
                    },
                    {
                        "id": "1.0",
                        "parent_cluster_id": 1,
                        "member_ids": ["1.0-0", "1.0-1", "1.0-2"],
                        "avg_pairwise_similarity": 0.8
                    }
                ]
            })
        );
    }

    #[test]
    fn empty_selection_stats() {
        let sel = select(Vec::new(), 5, 15, 2);
        assert!(sel.is_empty());
        assert_eq!(sel.avg_size(), 0.0);
        assert_eq!(sel.avg_similarity(), 0.0);
    }
}
