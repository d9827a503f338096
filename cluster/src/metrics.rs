use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use lectern_corpus::{euclidean_distance, squared_euclidean};

use crate::assignment::{Label, NOISE};
use crate::error::ClusterError;
use crate::scaler::check_rows;

/// Internal quality metrics of one clustering run.
///
/// Directions: silhouette and Calinski–Harabasz are higher-is-better,
/// Davies–Bouldin is lower-is-better. Degenerate runs (fewer than two
/// clusters among non-noise points) carry the sentinels 0, 0 and +∞.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterMetrics {
    /// Distinct non-noise labels.
    pub n_clusters: usize,
    /// Sum of squared distances to assigned centroids (k-means only).
    pub inertia: Option<f64>,
    pub silhouette: f64,
    pub calinski_harabasz: f64,
    pub davies_bouldin: f64,
    /// Documents per label; includes [`NOISE`] when present.
    pub cluster_sizes: BTreeMap<Label, usize>,
    pub n_noise: usize,
}

impl ClusterMetrics {
    /// Fraction of points labeled noise.
    pub fn noise_ratio(&self) -> f64 {
        let total: usize = self.cluster_sizes.values().sum();
        if total == 0 {
            return 0.0;
        }
        self.n_noise as f64 / total as f64
    }
}

/// Full matrix of euclidean distances, computed once and shared by every
/// silhouette evaluation over the same vectors.
#[derive(Debug, Clone)]
pub struct PairwiseDistances {
    n: usize,
    values: Vec<f64>,
}

impl PairwiseDistances {
    pub fn new(vectors: &[&[f64]]) -> Self {
        let n = vectors.len();
        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (0..n)
                    .map(|j| if i == j { 0.0 } else { euclidean_distance(vectors[i], vectors[j]) })
                    .collect()
            })
            .collect();
        Self {
            n,
            values: rows.into_iter().flatten().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }
}

/// Computes silhouette, Calinski–Harabasz and Davies–Bouldin over the
/// non-noise points of `labels`.
pub fn compute_metrics(
    vectors: &[&[f64]],
    labels: &[Label],
    inertia: Option<f64>,
) -> Result<ClusterMetrics, ClusterError> {
    check_rows(vectors)?;
    let dist = PairwiseDistances::new(vectors);
    compute_metrics_with(&dist, vectors, labels, inertia)
}

/// Like [`compute_metrics`], reusing a precomputed distance matrix.
pub fn compute_metrics_with(
    dist: &PairwiseDistances,
    vectors: &[&[f64]],
    labels: &[Label],
    inertia: Option<f64>,
) -> Result<ClusterMetrics, ClusterError> {
    if labels.len() != vectors.len() || dist.len() != vectors.len() {
        return Err(ClusterError::LengthMismatch {
            ids: vectors.len(),
            labels: labels.len(),
        });
    }

    let mut cluster_sizes = BTreeMap::new();
    for &l in labels {
        *cluster_sizes.entry(l).or_insert(0usize) += 1;
    }
    let n_noise = cluster_sizes.get(&NOISE).copied().unwrap_or(0);

    let groups = groups(labels);
    Ok(ClusterMetrics {
        n_clusters: groups.len(),
        inertia,
        silhouette: silhouette(dist, &groups),
        calinski_harabasz: calinski_harabasz(vectors, &groups),
        davies_bouldin: davies_bouldin(vectors, &groups),
        cluster_sizes,
        n_noise,
    })
}

/// Point indices per non-noise label, labels ascending.
fn groups(labels: &[Label]) -> Vec<Vec<usize>> {
    let mut map: BTreeMap<Label, Vec<usize>> = BTreeMap::new();
    for (i, &l) in labels.iter().enumerate() {
        if l != NOISE {
            map.entry(l).or_default().push(i);
        }
    }
    map.into_values().collect()
}

fn centroid(vectors: &[&[f64]], members: &[usize]) -> Vec<f64> {
    let dim = vectors[members[0]].len();
    let mut c = vec![0.0; dim];
    for &i in members {
        for (s, x) in c.iter_mut().zip(vectors[i].iter()) {
            *s += x;
        }
    }
    let inv = 1.0 / members.len() as f64;
    c.iter_mut().for_each(|s| *s *= inv);
    c
}

/// Mean silhouette coefficient. 0 unless 2 <= k <= n - 1.
/// Points in singleton clusters contribute 0.
fn silhouette(dist: &PairwiseDistances, groups: &[Vec<usize>]) -> f64 {
    let k = groups.len();
    let n: usize = groups.iter().map(|g| g.len()).sum();
    if k < 2 || k >= n {
        return 0.0;
    }

    let mut total = 0.0;
    for (ci, own) in groups.iter().enumerate() {
        if own.len() < 2 {
            continue;
        }
        for &i in own {
            let a = own.iter().map(|&j| dist.get(i, j)).sum::<f64>() / (own.len() - 1) as f64;
            let b = groups
                .iter()
                .enumerate()
                .filter(|(cj, _)| *cj != ci)
                .map(|(_, other)| {
                    other.iter().map(|&j| dist.get(i, j)).sum::<f64>() / other.len() as f64
                })
                .fold(f64::INFINITY, f64::min);
            let m = a.max(b);
            if m > 0.0 {
                total += (b - a) / m;
            }
        }
    }
    total / n as f64
}

/// Between- over within-cluster dispersion, scaled by degrees of freedom.
fn calinski_harabasz(vectors: &[&[f64]], groups: &[Vec<usize>]) -> f64 {
    let k = groups.len();
    let n: usize = groups.iter().map(|g| g.len()).sum();
    if k < 2 || k >= n {
        return 0.0;
    }

    let all: Vec<usize> = groups.iter().flatten().copied().collect();
    let mean = centroid(vectors, &all);

    let mut extra = 0.0;
    let mut intra = 0.0;
    for g in groups {
        let c = centroid(vectors, g);
        extra += g.len() as f64 * squared_euclidean(&c, &mean);
        intra += g.iter().map(|&i| squared_euclidean(vectors[i], &c)).sum::<f64>();
    }

    if intra == 0.0 {
        return 1.0;
    }
    extra * (n - k) as f64 / (intra * (k - 1) as f64)
}

/// Mean over clusters of the worst (s_i + s_j) / d(c_i, c_j) ratio.
/// +∞ with fewer than two clusters; coincident centroids contribute 0.
fn davies_bouldin(vectors: &[&[f64]], groups: &[Vec<usize>]) -> f64 {
    let k = groups.len();
    if k < 2 {
        return f64::INFINITY;
    }

    let centroids: Vec<Vec<f64>> = groups.iter().map(|g| centroid(vectors, g)).collect();
    let scatter: Vec<f64> = groups
        .iter()
        .zip(centroids.iter())
        .map(|(g, c)| g.iter().map(|&i| euclidean_distance(vectors[i], c)).sum::<f64>() / g.len() as f64)
        .collect();

    let mut total = 0.0;
    for i in 0..k {
        let mut worst: f64 = 0.0;
        for j in 0..k {
            if i == j {
                continue;
            }
            let d = euclidean_distance(&centroids[i], &centroids[j]);
            if d > 0.0 {
                worst = worst.max((scatter[i] + scatter[j]) / d);
            }
        }
        total += worst;
    }
    total / k as f64
}
