use serde::Serialize;

use crate::error::ClusterError;

/// Feature-wise standardization: zero mean, unit (population) variance.
///
/// Fit once per run and reuse the same transform for every algorithm so
/// metrics stay comparable. Constant features keep a scale of 1 and become
/// all-zero columns.
#[derive(Debug, Clone, Serialize)]
pub struct Scaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Scaler {
    /// Learns per-feature mean and standard deviation.
    pub fn fit(vectors: &[&[f64]]) -> Result<Self, ClusterError> {
        let dim = check_rows(vectors)?;
        let n = vectors.len() as f64;

        let mut mean = vec![0.0; dim];
        for v in vectors {
            for (m, x) in mean.iter_mut().zip(v.iter()) {
                *m += x;
            }
        }
        for m in mean.iter_mut() {
            *m /= n;
        }

        let mut var = vec![0.0; dim];
        for v in vectors {
            for ((s, x), m) in var.iter_mut().zip(v.iter()).zip(mean.iter()) {
                let d = x - m;
                *s += d * d;
            }
        }
        let scale = var
            .into_iter()
            .map(|s| {
                let std = (s / n).sqrt();
                if std > f64::EPSILON { std } else { 1.0 }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    /// Applies the learned transform.
    pub fn transform(&self, vectors: &[&[f64]]) -> Result<Vec<Vec<f64>>, ClusterError> {
        let dim = check_rows(vectors)?;
        if dim != self.mean.len() {
            return Err(ClusterError::DimensionMismatch {
                row: 0,
                expected: self.mean.len(),
                got: dim,
            });
        }
        Ok(vectors
            .iter()
            .map(|v| {
                v.iter()
                    .zip(self.mean.iter().zip(self.scale.iter()))
                    .map(|(x, (m, s))| (x - m) / s)
                    .collect()
            })
            .collect())
    }

    pub fn fit_transform(vectors: &[&[f64]]) -> Result<(Self, Vec<Vec<f64>>), ClusterError> {
        let scaler = Self::fit(vectors)?;
        let out = scaler.transform(vectors)?;
        Ok((scaler, out))
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

/// Borrows each row of an owned matrix.
pub fn rows(matrix: &[Vec<f64>]) -> Vec<&[f64]> {
    matrix.iter().map(|v| v.as_slice()).collect()
}

/// Validates a matrix: non-empty, rectangular, finite. Returns the dimension.
pub(crate) fn check_rows(vectors: &[&[f64]]) -> Result<usize, ClusterError> {
    let first = vectors.first().ok_or(ClusterError::Empty)?;
    let dim = first.len();
    for (row, v) in vectors.iter().enumerate() {
        if v.len() != dim {
            return Err(ClusterError::DimensionMismatch {
                row,
                expected: dim,
                got: v.len(),
            });
        }
        if let Some(col) = v.iter().position(|x| !x.is_finite()) {
            return Err(ClusterError::NonFinite { row, col });
        }
    }
    Ok(dim)
}
