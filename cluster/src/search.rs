use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dbscan::Dbscan;
use crate::error::ClusterError;
use crate::kmeans::KMeans;
use crate::metrics::{PairwiseDistances, compute_metrics_with};
use crate::scaler::check_rows;

/// Maximum noise fraction a density candidate may carry.
pub const MAX_NOISE_RATIO: f64 = 0.5;

/// Scores of one k-means fit in the k sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KTrial {
    pub k: usize,
    pub inertia: f64,
    pub silhouette: f64,
    pub calinski_harabasz: f64,
    pub davies_bouldin: f64,
}

/// Best k under each criterion. None when the criterion had nothing to
/// choose from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptimalK {
    pub elbow: Option<usize>,
    pub silhouette: Option<usize>,
    pub calinski_harabasz: Option<usize>,
    pub davies_bouldin: Option<usize>,
}

/// Outcome of [`search_optimal_k`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KSearch {
    /// Successful fits, k ascending.
    pub trials: Vec<KTrial>,
    pub optimal: OptimalK,
}

/// Runs k-means for every k and picks the best k per metric.
///
/// Silhouette and Calinski–Harabasz are maximized, Davies–Bouldin is
/// minimized, and inertia goes through [`elbow`]. Every criterion resolves
/// ties to the smallest k. Fits are evaluated in parallel but folded in
/// ascending k order. A k that fails to fit is logged and left out.
pub fn search_optimal_k(
    vectors: &[&[f64]],
    ks: &[usize],
    template: &KMeans,
) -> Result<KSearch, ClusterError> {
    check_rows(vectors)?;
    if ks.is_empty() {
        return Err(ClusterError::Config("empty k range".into()));
    }
    let mut ks = ks.to_vec();
    ks.sort_unstable();

    info!("searching k over {} values ({}..={})", ks.len(), ks[0], ks[ks.len() - 1]);
    let dist = PairwiseDistances::new(vectors);

    let cells: Vec<(usize, Result<KTrial, ClusterError>)> = ks
        .par_iter()
        .map(|&k| (k, evaluate_k(&dist, vectors, k, template)))
        .collect();

    let mut trials = Vec::with_capacity(cells.len());
    for (k, cell) in cells {
        match cell {
            Ok(t) => {
                debug!(
                    "k={} inertia={:.3} silhouette={:.3} ch={:.3} db={:.3}",
                    t.k, t.inertia, t.silhouette, t.calinski_harabasz, t.davies_bouldin
                );
                trials.push(t);
            }
            Err(e) => warn!("k-means failed with k={}: {}", k, e),
        }
    }

    let ks_ok: Vec<usize> = trials.iter().map(|t| t.k).collect();
    let pick = |i: Option<usize>| i.map(|i| ks_ok[i]);
    let inertias: Vec<f64> = trials.iter().map(|t| t.inertia).collect();
    let optimal = OptimalK {
        elbow: pick(elbow(&inertias)),
        silhouette: pick(argmax(trials.iter().map(|t| t.silhouette))),
        calinski_harabasz: pick(argmax(trials.iter().map(|t| t.calinski_harabasz))),
        davies_bouldin: pick(argmin(trials.iter().map(|t| t.davies_bouldin))),
    };

    info!("optimal k: {:?}", optimal);
    Ok(KSearch { trials, optimal })
}

fn evaluate_k(
    dist: &PairwiseDistances,
    vectors: &[&[f64]],
    k: usize,
    template: &KMeans,
) -> Result<KTrial, ClusterError> {
    let km = KMeans { k, ..template.clone() };
    let fit = km.fit(vectors)?;
    let m = compute_metrics_with(dist, vectors, &fit.labels, Some(fit.inertia))?;
    Ok(KTrial {
        k,
        inertia: fit.inertia,
        silhouette: m.silhouette,
        calinski_harabasz: m.calinski_harabasz,
        davies_bouldin: m.davies_bouldin,
    })
}

/// Index of the elbow of a cost curve.
///
/// Points are placed at x = i / (n - 1), y = cost[i] / cost[0]; the elbow
/// is the point farthest from the straight line through the first and last
/// points, the earliest index winning ties. Needs at least three points and
/// a positive first cost.
pub fn elbow(costs: &[f64]) -> Option<usize> {
    let n = costs.len();
    if n < 3 {
        return None;
    }
    let first = costs[0];
    if !(first.is_finite() && first > 0.0) {
        return None;
    }

    let last = (n - 1) as f64;
    let points: Vec<(f64, f64)> = costs
        .iter()
        .enumerate()
        .map(|(i, c)| (i as f64 / last, c / first))
        .collect();

    let (x0, y0) = points[0];
    let (lx, ly) = (points[n - 1].0 - x0, points[n - 1].1 - y0);
    let norm = (lx * lx + ly * ly).sqrt();
    let (ux, uy) = (lx / norm, ly / norm);

    let distances = points.iter().map(|&(x, y)| {
        let (vx, vy) = (x - x0, y - y0);
        let along = vx * ux + vy * uy;
        let (px, py) = (vx - along * ux, vy - along * uy);
        (px * px + py * py).sqrt()
    });
    argmax(distances)
}

/// Index of the first maximum, ignoring NaN.
fn argmax(values: impl Iterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the first minimum, ignoring NaN.
fn argmin(values: impl Iterator<Item = f64>) -> Option<usize> {
    argmax(values.map(|v| -v))
}

/// Parameters of a density run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityParams {
    pub radius: f64,
    pub min_pts: usize,
}

/// Scores of one DBSCAN run in the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityTrial {
    pub radius: f64,
    pub min_pts: usize,
    pub n_clusters: usize,
    pub n_noise: usize,
    pub silhouette: f64,
    pub calinski_harabasz: f64,
    pub davies_bouldin: f64,
}

/// Outcome of [`search_density_params`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensitySearch {
    /// Successful runs in grid order.
    pub trials: Vec<DensityTrial>,
    /// None when no run qualified.
    pub best: Option<DensityParams>,
    /// Silhouette of `best`; -1 when nothing qualified.
    pub best_silhouette: f64,
}

/// Exhaustive DBSCAN grid search, radius ascending outer, min_pts
/// ascending inner.
///
/// A run replaces the current best only if it finds more than one cluster,
/// its silhouette strictly beats the best so far (initially -1), and less
/// than half the points are noise. Runs are evaluated in parallel and then
/// judged in grid order, so the earliest of equal candidates is kept.
pub fn search_density_params(
    vectors: &[&[f64]],
    radii: &[f64],
    min_pts: &[usize],
) -> Result<DensitySearch, ClusterError> {
    check_rows(vectors)?;
    let mut radii = radii.to_vec();
    radii.sort_by(|a, b| a.total_cmp(b));
    let mut min_pts = min_pts.to_vec();
    min_pts.sort_unstable();

    let grid: Vec<DensityParams> = radii
        .iter()
        .flat_map(|&radius| min_pts.iter().map(move |&m| DensityParams { radius, min_pts: m }))
        .collect();
    info!("searching density parameters over {} combinations", grid.len());

    let dist = PairwiseDistances::new(vectors);
    let n = vectors.len();

    let cells: Vec<(DensityParams, Result<DensityTrial, ClusterError>)> = grid
        .par_iter()
        .map(|&p| (p, evaluate_density(&dist, vectors, p)))
        .collect();

    let mut trials = Vec::with_capacity(cells.len());
    let mut best = None;
    let mut best_silhouette = -1.0;
    for (p, cell) in cells {
        let t = match cell {
            Ok(t) => t,
            Err(e) => {
                warn!("dbscan failed with radius={}, min_pts={}: {}", p.radius, p.min_pts, e);
                continue;
            }
        };
        debug!(
            "radius={} min_pts={} clusters={} noise={} silhouette={:.3}",
            t.radius, t.min_pts, t.n_clusters, t.n_noise, t.silhouette
        );
        if t.n_clusters > 1
            && t.silhouette > best_silhouette
            && (t.n_noise as f64) < n as f64 * MAX_NOISE_RATIO
        {
            best_silhouette = t.silhouette;
            best = Some(p);
        }
        trials.push(t);
    }

    match best {
        Some(p) => info!(
            "best density parameters: radius={}, min_pts={} (silhouette {:.3})",
            p.radius, p.min_pts, best_silhouette
        ),
        None => info!("no optimal parameters found"),
    }

    Ok(DensitySearch {
        trials,
        best,
        best_silhouette,
    })
}

fn evaluate_density(
    dist: &PairwiseDistances,
    vectors: &[&[f64]],
    p: DensityParams,
) -> Result<DensityTrial, ClusterError> {
    let labels = Dbscan::new(p.radius, p.min_pts).fit(vectors)?;
    let m = compute_metrics_with(dist, vectors, &labels, None)?;
    Ok(DensityTrial {
        radius: p.radius,
        min_pts: p.min_pts,
        n_clusters: m.n_clusters,
        n_noise: m.n_noise,
        silhouette: m.silhouette,
        calinski_harabasz: m.calinski_harabasz,
        davies_bouldin: m.davies_bouldin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaler::rows;

    fn three_groups() -> Vec<Vec<f64>> {
        let mut m = Vec::new();
        for (cx, cy) in [(0.0, 0.0), (20.0, 0.0), (0.0, 20.0)] {
            for i in 0..5 {
                let o = i as f64 * 0.2;
                m.push(vec![cx + o, cy - o]);
            }
        }
        m
    }

    #[test]
    fn elbow_clear_knee() {
        // Sharp drop until index 2, flat afterwards.
        let costs = [100.0, 40.0, 10.0, 9.0, 8.0, 7.0];
        assert_eq!(elbow(&costs), Some(2));
        assert_eq!(elbow(&costs), elbow(&costs));
    }

    #[test]
    fn elbow_needs_three_points() {
        assert_eq!(elbow(&[10.0, 5.0]), None);
        assert_eq!(elbow(&[0.0, 0.0, 0.0]), None);
    }

    #[test]
    fn elbow_tie_picks_first() {
        // Straight line: every distance is zero, first index wins.
        assert_eq!(elbow(&[3.0, 2.0, 1.0]), Some(0));
    }

    #[test]
    fn argmax_first_on_ties() {
        assert_eq!(argmax([1.0, 3.0, 3.0].into_iter()), Some(1));
        assert_eq!(argmin([2.0, 1.0, 1.0].into_iter()), Some(1));
        assert_eq!(argmax([f64::NAN, 0.5].into_iter()), Some(1));
        assert_eq!(argmax(std::iter::empty()), None);
        assert_eq!(argmin([f64::INFINITY, 2.0].into_iter()), Some(1));
    }

    #[test]
    fn optimal_k_finds_three() {
        let m = three_groups();
        let search = search_optimal_k(&rows(&m), &[2, 3, 4, 5, 6], &KMeans::new(2)).unwrap();
        assert_eq!(search.trials.len(), 5);
        assert_eq!(search.optimal.silhouette, Some(3));
        assert_eq!(search.optimal.davies_bouldin, Some(3));
        let elbow = search.optimal.elbow.unwrap();
        assert!((2..=6).contains(&elbow));

        let again = search_optimal_k(&rows(&m), &[2, 3, 4, 5, 6], &KMeans::new(2)).unwrap();
        assert_eq!(search, again);
    }

    #[test]
    fn optimal_k_skips_failing_cells() {
        let m = three_groups();
        // k = 40 exceeds the 15 points and is skipped.
        let search = search_optimal_k(&rows(&m), &[1, 3, 40], &KMeans::new(2)).unwrap();
        let ks: Vec<usize> = search.trials.iter().map(|t| t.k).collect();
        assert_eq!(ks, vec![1, 3]);
        // k = 1 carries sentinel scores.
        assert_eq!(search.trials[0].silhouette, 0.0);
        assert_eq!(search.trials[0].davies_bouldin, f64::INFINITY);
        assert_eq!(search.optimal.silhouette, Some(3));
        // Two successful points: no elbow.
        assert_eq!(search.optimal.elbow, None);
    }

    #[test]
    fn optimal_k_empty_range() {
        let m = three_groups();
        assert!(matches!(
            search_optimal_k(&rows(&m), &[], &KMeans::new(2)),
            Err(ClusterError::Config(_))
        ));
    }

    fn directional_groups() -> Vec<Vec<f64>> {
        let mut m = Vec::new();
        for axis in 0..3 {
            for i in 0..6 {
                let mut v = vec![0.05 * i as f64; 3];
                v[axis] = 1.0;
                m.push(v);
            }
        }
        m
    }

    #[test]
    fn density_search_picks_separating_params() {
        let m = directional_groups();
        let search = search_density_params(&rows(&m), &[0.5, 0.05], &[3, 2]).unwrap();
        assert_eq!(search.trials.len(), 4);
        // Grid order: radius ascending, then min_pts ascending.
        assert_eq!((search.trials[0].radius, search.trials[0].min_pts), (0.05, 2));
        assert_eq!((search.trials[1].radius, search.trials[1].min_pts), (0.05, 3));
        let best = search.best.unwrap();
        assert_eq!(best.radius, 0.05);
        assert_eq!(best.min_pts, 2, "ties keep the earliest candidate");
        assert!(search.best_silhouette > 0.0);
    }

    #[test]
    fn density_search_without_candidates() {
        let m = directional_groups();
        // Radius 2 merges everything into one cluster.
        let search = search_density_params(&rows(&m), &[2.0], &[2]).unwrap();
        assert!(search.best.is_none());
        assert_eq!(search.best_silhouette, -1.0);
        assert_eq!(search.trials[0].n_clusters, 1);
    }

    #[test]
    fn density_search_rejects_noisy_runs() {
        let m = directional_groups();
        // min_pts above the group size leaves every point as noise.
        let search = search_density_params(&rows(&m), &[0.05], &[10]).unwrap();
        assert!(search.best.is_none());
        assert_eq!(search.trials[0].n_noise, 18);
    }

    #[test]
    fn density_search_skips_invalid_cells() {
        let m = directional_groups();
        let search = search_density_params(&rows(&m), &[-1.0, 0.05], &[2]).unwrap();
        assert_eq!(search.trials.len(), 1);
        assert!(search.best.is_some());
    }
}
