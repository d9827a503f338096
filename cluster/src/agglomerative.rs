use std::fmt;

use serde::{Deserialize, Serialize};

use lectern_corpus::{cosine_distance, squared_euclidean};

use crate::assignment::Label;
use crate::error::ClusterError;
use crate::scaler::check_rows;

/// Rule for the distance between two merged groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Variance-minimizing merge. Euclidean distance only.
    Ward,
    /// Farthest pair.
    Complete,
    /// Size-weighted mean pair distance.
    Average,
    /// Closest pair.
    Single,
}

impl Linkage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Linkage::Ward => "ward",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::Single => "single",
        }
    }

    /// Ward pairs with euclidean distance, every other linkage with cosine.
    pub fn default_metric(&self) -> Metric {
        match self {
            Linkage::Ward => Metric::Euclidean,
            _ => Metric::Cosine,
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-to-point distance used by agglomerative clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Euclidean,
    Cosine,
}

/// Connectivity-based clustering: bottom-up merging until `k` groups remain.
///
/// Distances are updated with the Lance–Williams recurrence. The closest
/// pair is merged first; among equal distances the pair with the lowest
/// `(i, j)` wins, so results do not depend on anything but the input order.
/// Labels are numbered by first appearance in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agglomerative {
    pub k: usize,
    pub linkage: Linkage,
    pub metric: Metric,
}

impl Agglomerative {
    /// Uses the linkage's default metric.
    pub fn new(k: usize, linkage: Linkage) -> Self {
        Self {
            k,
            linkage,
            metric: linkage.default_metric(),
        }
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn fit(&self, vectors: &[&[f64]]) -> Result<Vec<Label>, ClusterError> {
        check_rows(vectors)?;
        let n = vectors.len();
        if self.k == 0 || self.k > n {
            return Err(ClusterError::InvalidK { k: self.k, n });
        }
        if self.linkage == Linkage::Ward && self.metric != Metric::Euclidean {
            return Err(ClusterError::LinkageMetric {
                linkage: self.linkage.as_str(),
            });
        }

        // Ward runs on squared euclidean distances.
        let ward = self.linkage == Linkage::Ward;
        let metric = self.metric;
        let dist = |a: &[f64], b: &[f64]| match metric {
            Metric::Euclidean if ward => squared_euclidean(a, b),
            Metric::Euclidean => squared_euclidean(a, b).sqrt(),
            Metric::Cosine => cosine_distance(a, b),
        };

        let mut d = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let v = dist(vectors[i], vectors[j]);
                d[i * n + j] = v;
                d[j * n + i] = v;
            }
        }

        let mut active = vec![true; n];
        let mut size = vec![1usize; n];
        let mut owner: Vec<usize> = (0..n).collect();
        let mut remaining = n;

        while remaining > self.k {
            let mut best = (usize::MAX, usize::MAX);
            let mut best_d = f64::INFINITY;
            for i in 0..n {
                if !active[i] {
                    continue;
                }
                for j in (i + 1)..n {
                    if active[j] && d[i * n + j] < best_d {
                        best_d = d[i * n + j];
                        best = (i, j);
                    }
                }
            }
            let (a, b) = best;
            if a == usize::MAX {
                break;
            }

            let (na, nb) = (size[a] as f64, size[b] as f64);
            let d_ab = d[a * n + b];
            for c in 0..n {
                if !active[c] || c == a || c == b {
                    continue;
                }
                let d_ac = d[a * n + c];
                let d_bc = d[b * n + c];
                let nc = size[c] as f64;
                let updated = match self.linkage {
                    Linkage::Ward => {
                        ((na + nc) * d_ac + (nb + nc) * d_bc - nc * d_ab) / (na + nb + nc)
                    }
                    Linkage::Complete => d_ac.max(d_bc),
                    Linkage::Single => d_ac.min(d_bc),
                    Linkage::Average => (na * d_ac + nb * d_bc) / (na + nb),
                };
                d[a * n + c] = updated;
                d[c * n + a] = updated;
            }

            active[b] = false;
            size[a] += size[b];
            for o in owner.iter_mut() {
                if *o == b {
                    *o = a;
                }
            }
            remaining -= 1;
        }

        Ok(relabel(&owner))
    }
}

/// Maps arbitrary group keys to labels 0.. in order of first appearance.
pub(crate) fn relabel(keys: &[usize]) -> Vec<Label> {
    let mut seen: Vec<usize> = Vec::new();
    keys.iter()
        .map(|k| match seen.iter().position(|s| s == k) {
            Some(p) => p as Label,
            None => {
                seen.push(*k);
                (seen.len() - 1) as Label
            }
        })
        .collect()
}
