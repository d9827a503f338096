use std::collections::VecDeque;

use serde::Serialize;

use lectern_corpus::cosine_distance;

use crate::assignment::{Label, NOISE};
use crate::error::ClusterError;
use crate::scaler::check_rows;

/// Density-based clustering (DBSCAN) over cosine distance.
///
/// - `radius`: maximum cosine distance (1 - cosine_similarity) for neighbors
/// - `min_pts`: minimum neighborhood size, the point itself included, for a
///   core point
///
/// The number of clusters is an output. Labels are 0, 1, ... in discovery
/// order; points not density-reachable from any core point are [`NOISE`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dbscan {
    pub radius: f64,
    pub min_pts: usize,
}

impl Dbscan {
    pub fn new(radius: f64, min_pts: usize) -> Self {
        Self { radius, min_pts }
    }

    pub fn fit(&self, vectors: &[&[f64]]) -> Result<Vec<Label>, ClusterError> {
        check_rows(vectors)?;
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(ClusterError::InvalidParam(format!(
                "dbscan radius must be finite and non-negative, got {}",
                self.radius
            )));
        }
        if self.min_pts == 0 {
            return Err(ClusterError::InvalidParam("dbscan min_pts must be positive".into()));
        }
        Ok(dbscan(vectors, self.radius, self.min_pts))
    }
}

fn dbscan(vectors: &[&[f64]], eps: f64, min_pts: usize) -> Vec<Label> {
    const UNDEFINED: Label = -2;

    let n = vectors.len();
    let mut labels = vec![UNDEFINED; n];
    let mut cluster_id: Label = -1;

    for i in 0..n {
        if labels[i] != UNDEFINED {
            continue;
        }

        let neighbors = range_query(vectors, i, eps);
        if neighbors.len() < min_pts {
            labels[i] = NOISE;
            continue;
        }

        // Start a new cluster.
        cluster_id += 1;
        labels[i] = cluster_id;

        // Seed set: neighbors minus point i.
        let mut seed: VecDeque<usize> = neighbors.into_iter().filter(|&j| j != i).collect();

        while let Some(q) = seed.pop_front() {
            if labels[q] == NOISE {
                // Border point: claimed, never expanded.
                labels[q] = cluster_id;
            }
            if labels[q] != UNDEFINED {
                continue;
            }
            labels[q] = cluster_id;

            let q_neighbors = range_query(vectors, q, eps);
            if q_neighbors.len() >= min_pts {
                seed.extend(q_neighbors);
            }
        }
    }

    labels
}

/// Returns indices of all vectors within eps cosine distance of vectors[idx].
/// `idx` itself is always included, even for a zero row.
fn range_query(vectors: &[&[f64]], idx: usize, eps: f64) -> Vec<usize> {
    let q = vectors[idx];
    vectors
        .iter()
        .enumerate()
        .filter(|&(i, v)| i == idx || cosine_distance(q, v) <= eps)
        .map(|(i, _)| i)
        .collect()
}
