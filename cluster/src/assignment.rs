use std::collections::BTreeMap;

use lectern_corpus::DocId;
use serde::Serialize;

use crate::error::ClusterError;

/// Cluster label. Non-negative values identify clusters.
pub type Label = i32;

/// Sentinel label for points a density-based run left unassigned.
pub const NOISE: Label = -1;

/// Maps each document id to a cluster label.
///
/// Ids and labels are parallel vectors in corpus order. Partition and
/// hierarchical runs label every document; density runs may mark some
/// documents as [`NOISE`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    ids: Vec<DocId>,
    labels: Vec<Label>,
}

impl ClusterAssignment {
    /// Pairs ids with labels. Both must have the same length.
    pub fn new(ids: Vec<DocId>, labels: Vec<Label>) -> Result<Self, ClusterError> {
        if ids.len() != labels.len() {
            return Err(ClusterError::LengthMismatch {
                ids: ids.len(),
                labels: labels.len(),
            });
        }
        Ok(Self { ids, labels })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[DocId] {
        &self.ids
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Label of a document, or None if the id is unknown.
    pub fn label_of(&self, id: &str) -> Option<Label> {
        self.ids.iter().position(|d| d == id).map(|i| self.labels[i])
    }

    /// Iterates `(id, label)` pairs in corpus order.
    pub fn iter(&self) -> impl Iterator<Item = (&DocId, Label)> {
        self.ids.iter().zip(self.labels.iter().copied())
    }

    /// Corpus positions grouped by label, noise excluded.
    pub fn clusters(&self) -> BTreeMap<Label, Vec<usize>> {
        let mut out: BTreeMap<Label, Vec<usize>> = BTreeMap::new();
        for (i, &l) in self.labels.iter().enumerate() {
            if l != NOISE {
                out.entry(l).or_default().push(i);
            }
        }
        out
    }

    /// Document ids carrying `label`, in corpus order.
    pub fn members(&self, label: Label) -> Vec<DocId> {
        self.iter()
            .filter(|&(_, l)| l == label)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of distinct non-noise labels.
    pub fn n_clusters(&self) -> usize {
        self.clusters().len()
    }

    /// Number of documents labeled [`NOISE`].
    pub fn n_noise(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE).count()
    }

    /// Fraction of documents labeled [`NOISE`].
    pub fn noise_ratio(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.n_noise() as f64 / self.labels.len() as f64
    }

    /// Count of documents per label, noise included when present.
    pub fn sizes(&self) -> BTreeMap<Label, usize> {
        let mut out = BTreeMap::new();
        for &l in &self.labels {
            *out.entry(l).or_insert(0) += 1;
        }
        out
    }
}
