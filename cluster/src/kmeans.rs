use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use lectern_corpus::squared_euclidean;

use crate::assignment::Label;
use crate::error::ClusterError;
use crate::scaler::check_rows;

/// Centroid-based clustering: k-means++ seeding followed by Lloyd
/// iterations, repeated `n_init` times. The restart with the lowest inertia
/// wins; the earliest restart wins ties.
///
/// All randomness is drawn from one `StdRng` seeded with `seed`, so equal
/// inputs and seeds always produce equal labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KMeans {
    pub k: usize,
    pub n_init: usize,
    pub max_iter: usize,
    /// Convergence tolerance, relative to the mean per-feature variance.
    pub tol: f64,
    pub seed: u64,
}

/// Result of a k-means fit.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    /// Centroid index per point, in `0..k`.
    pub labels: Vec<Label>,
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances of points to their assigned centroid.
    pub inertia: f64,
    /// Lloyd iterations of the winning restart.
    pub n_iter: usize,
}

impl KMeans {
    pub const DEFAULT_N_INIT: usize = 10;
    pub const DEFAULT_MAX_ITER: usize = 300;
    pub const DEFAULT_TOL: f64 = 1e-4;
    pub const DEFAULT_SEED: u64 = 42;

    pub fn new(k: usize) -> Self {
        Self {
            k,
            n_init: Self::DEFAULT_N_INIT,
            max_iter: Self::DEFAULT_MAX_ITER,
            tol: Self::DEFAULT_TOL,
            seed: Self::DEFAULT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn fit(&self, vectors: &[&[f64]]) -> Result<KMeansFit, ClusterError> {
        let dim = check_rows(vectors)?;
        let n = vectors.len();
        if self.k == 0 || self.k > n {
            return Err(ClusterError::InvalidK { k: self.k, n });
        }
        if self.n_init == 0 || self.max_iter == 0 {
            return Err(ClusterError::InvalidParam(
                "k-means needs n_init > 0 and max_iter > 0".into(),
            ));
        }

        let tol = self.tol * mean_variance(vectors, dim);
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut best: Option<KMeansFit> = None;
        for _ in 0..self.n_init {
            let init = plus_plus_init(vectors, self.k, &mut rng);
            let fit = lloyd(vectors, init, self.max_iter, tol);
            let better = match &best {
                Some(b) => fit.inertia < b.inertia,
                None => true,
            };
            if better {
                best = Some(fit);
            }
        }
        // n_init > 0 guarantees at least one restart ran.
        best.ok_or_else(|| ClusterError::InvalidParam("k-means produced no restart".into()))
    }
}

fn mean_variance(vectors: &[&[f64]], dim: usize) -> f64 {
    let n = vectors.len() as f64;
    let mut total = 0.0;
    for d in 0..dim {
        let mean = vectors.iter().map(|v| v[d]).sum::<f64>() / n;
        total += vectors.iter().map(|v| (v[d] - mean).powi(2)).sum::<f64>() / n;
    }
    total / dim as f64
}

/// k-means++ seeding: the first centroid is uniform, each next one is drawn
/// with probability proportional to its squared distance from the nearest
/// chosen centroid.
fn plus_plus_init(vectors: &[&[f64]], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = vectors.len();
    let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(k);
    let first = rng.gen_range(0..n);
    centroids.push(vectors[first].to_vec());

    let mut closest: Vec<f64> = vectors
        .iter()
        .map(|v| squared_euclidean(v, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = closest.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.gen_range(0.0..total);
            let mut chosen = n - 1;
            for (i, &d) in closest.iter().enumerate() {
                if target < d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        } else {
            // Every point coincides with a centroid already.
            rng.gen_range(0..n)
        };

        let c = vectors[pick].to_vec();
        for (d, v) in closest.iter_mut().zip(vectors.iter()) {
            let nd = squared_euclidean(v, &c);
            if nd < *d {
                *d = nd;
            }
        }
        centroids.push(c);
    }
    centroids
}

fn nearest(v: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (j, c) in centroids.iter().enumerate() {
        let d = squared_euclidean(v, c);
        if d < best_d {
            best_d = d;
            best = j;
        }
    }
    (best, best_d)
}

fn lloyd(vectors: &[&[f64]], mut centroids: Vec<Vec<f64>>, max_iter: usize, tol: f64) -> KMeansFit {
    let k = centroids.len();
    let dim = centroids[0].len();
    let mut labels = vec![0usize; vectors.len()];
    let mut dists = vec![0.0; vectors.len()];
    let mut n_iter = 0;

    for iter in 0..max_iter {
        n_iter = iter + 1;
        for (i, v) in vectors.iter().enumerate() {
            let (j, d) = nearest(v, &centroids);
            labels[i] = j;
            dists[i] = d;
        }

        let mut sums = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];
        for (v, &l) in vectors.iter().zip(labels.iter()) {
            counts[l] += 1;
            for (s, x) in sums[l].iter_mut().zip(v.iter()) {
                *s += x;
            }
        }

        // Empty clusters take the points farthest from their centroids. A
        // moved point leaves its old cluster's sum, and no cluster is
        // emptied to fill another.
        let mut taken = vec![false; vectors.len()];
        for j in 0..k {
            if counts[j] > 0 {
                continue;
            }
            let far = (0..vectors.len())
                .filter(|&i| !taken[i] && counts[labels[i]] > 1)
                .fold(None, |acc: Option<usize>, i| match acc {
                    Some(b) if dists[b] >= dists[i] => Some(b),
                    _ => Some(i),
                });
            if let Some(i) = far {
                taken[i] = true;
                let old = labels[i];
                for (s, x) in sums[old].iter_mut().zip(vectors[i].iter()) {
                    *s -= x;
                }
                counts[old] -= 1;
                labels[i] = j;
                sums[j] = vectors[i].to_vec();
                counts[j] = 1;
            }
        }

        let mut shift = 0.0;
        for j in 0..k {
            if counts[j] == 0 {
                continue;
            }
            let inv = 1.0 / counts[j] as f64;
            let next: Vec<f64> = sums[j].iter().map(|s| s * inv).collect();
            shift += squared_euclidean(&next, &centroids[j]);
            centroids[j] = next;
        }

        if shift <= tol {
            break;
        }
    }

    let mut inertia = 0.0;
    for (i, v) in vectors.iter().enumerate() {
        let (j, d) = nearest(v, &centroids);
        labels[i] = j;
        inertia += d;
    }

    KMeansFit {
        labels: labels.into_iter().map(|l| l as Label).collect(),
        centroids,
        inertia,
        n_iter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaler::rows;

    fn two_groups() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.0],
            vec![10.0, 10.1],
        ]
    }

    #[test]
    fn separates_two_groups() {
        let m = two_groups();
        let fit = KMeans::new(2).fit(&rows(&m)).unwrap();
        assert_eq!(fit.labels.len(), 6);
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[0], fit.labels[2]);
        assert_eq!(fit.labels[3], fit.labels[4]);
        assert_eq!(fit.labels[3], fit.labels[5]);
        assert_ne!(fit.labels[0], fit.labels[3]);
        assert!(fit.inertia < 0.1, "inertia {}", fit.inertia);
        assert_eq!(fit.centroids.len(), 2);
    }

    #[test]
    fn deterministic_for_seed() {
        let m = two_groups();
        let a = KMeans::new(3).with_seed(7).fit(&rows(&m)).unwrap();
        let b = KMeans::new(3).with_seed(7).fit(&rows(&m)).unwrap();
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.inertia, b.inertia);
    }

    #[test]
    fn k_equals_n_has_zero_inertia() {
        let m = two_groups();
        let fit = KMeans::new(6).fit(&rows(&m)).unwrap();
        assert!(fit.inertia.abs() < 1e-12);
        let mut labels = fit.labels.clone();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), 6);
    }

    #[test]
    fn invalid_k() {
        let m = two_groups();
        assert!(matches!(
            KMeans::new(0).fit(&rows(&m)),
            Err(ClusterError::InvalidK { k: 0, n: 6 })
        ));
        assert!(matches!(
            KMeans::new(7).fit(&rows(&m)),
            Err(ClusterError::InvalidK { k: 7, n: 6 })
        ));
    }

    #[test]
    fn identical_points() {
        let m = vec![vec![1.0, 1.0]; 5];
        let fit = KMeans::new(2).fit(&rows(&m)).unwrap();
        assert_eq!(fit.labels.len(), 5);
        assert!(fit.inertia.abs() < 1e-12);
    }

    #[test]
    fn relocated_point_leaves_old_centroid() {
        // The second centroid attracts nothing, so it takes the farthest
        // point (10.0), which must no longer pull the first centroid.
        let m = vec![vec![0.0], vec![1.0], vec![10.0]];
        let fit = lloyd(&rows(&m), vec![vec![0.5], vec![100.0]], 1, 0.0);
        assert_eq!(fit.centroids, vec![vec![0.5], vec![10.0]]);
        assert_eq!(fit.labels, vec![0, 0, 1]);
        assert!((fit.inertia - 0.5).abs() < 1e-12);
    }

    #[test]
    fn single_cluster_inertia() {
        let m = vec![vec![0.0], vec![2.0]];
        let fit = KMeans::new(1).fit(&rows(&m)).unwrap();
        assert_eq!(fit.labels, vec![0, 0]);
        assert!((fit.inertia - 2.0).abs() < 1e-12);
    }
}
