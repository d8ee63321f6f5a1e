//! Hard clustering of gap midpoints.
//!
//! [`Clusterer`] is the capability the cluster selector consumes; [`KMeans`]
//! is the built-in implementation: k-means++ seeding followed by Lloyd
//! iterations, repeated from several seeds, keeping the run with the lowest
//! within-cluster sum of squares.
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! Every random choice is drawn from a [`StdRng`] seeded from
//! `seed + restart`, so equal seeds give equal clusterings.

use crate::core::collections::{FastHashSet, fast_hash_set_with_capacity};
use crate::geometry::util::squared_distance;
use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a [`Clusterer`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClusteringError {
    /// No points were supplied.
    #[error("Cannot cluster an empty point set")]
    EmptyInput,

    /// `k` is zero.
    #[error("Invalid cluster count k={k}")]
    InvalidK {
        /// The requested cluster count.
        k: usize,
    },

    /// Fewer distinct points than clusters.
    #[error("Cannot form {k} clusters from {distinct} distinct points")]
    TooFewDistinctPoints {
        /// The requested cluster count.
        k: usize,
        /// Number of distinct points.
        distinct: usize,
    },

    /// Points have differing lengths.
    #[error("Point {index} has {actual} coordinates, expected {expected}")]
    DimensionMismatch {
        /// Index of the offending point.
        index: usize,
        /// Length of the first point.
        expected: usize,
        /// Length of the offending point.
        actual: usize,
    },

    /// Every restart ended with at least one empty cluster.
    #[error("Every restart for k={k} ended with an empty cluster")]
    EmptyCluster {
        /// The requested cluster count.
        k: usize,
    },
}

/// A hard partition of a point set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clustering {
    /// Cluster label of each point, in `0..centroids.len()`.
    pub labels: Vec<usize>,
    /// One centroid per cluster.
    pub centroids: Vec<Vec<f64>>,
    /// Within-cluster sum of squared distances to the centroids.
    pub inertia: f64,
}

impl Clustering {
    /// Number of clusters.
    #[must_use]
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Number of points carrying each label.
    #[must_use]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &label in &self.labels {
            if let Some(size) = sizes.get_mut(label) {
                *size += 1;
            }
        }
        sizes
    }
}

/// Capability: partition points into `k` clusters.
///
/// `Sync` so that several `k` can be fitted concurrently.
pub trait Clusterer: Sync {
    /// Fits `k` clusters to `points`.
    ///
    /// # Errors
    ///
    /// Implementations must fail when `k` exceeds the number of distinct
    /// points.
    fn fit(&self, points: &[Vec<f64>], k: usize) -> Result<Clustering, ClusteringError>;
}

/// Number of distinct rows in `points`.
///
/// # Examples
///
/// ```rust
/// use empty_space::analysis::clustering::count_distinct;
///
/// let points = vec![vec![0.0, 1.0], vec![0.0, 1.0], vec![1.0, 0.0]];
/// assert_eq!(count_distinct(&points), 2);
/// ```
#[must_use]
pub fn count_distinct(points: &[Vec<f64>]) -> usize {
    let mut seen: FastHashSet<Vec<OrderedFloat<f64>>> = fast_hash_set_with_capacity(points.len());
    for p in points {
        seen.insert(p.iter().copied().map(OrderedFloat).collect());
    }
    seen.len()
}

/// Seeded k-means with k-means++ initialization.
///
/// # Examples
///
/// ```rust
/// use empty_space::analysis::clustering::{Clusterer, KMeans};
///
/// let points = vec![
///     vec![0.0, 0.0],
///     vec![0.1, 0.1],
///     vec![10.0, 10.0],
///     vec![10.1, 10.1],
/// ];
/// let clustering = KMeans::default().fit(&points, 2).unwrap();
/// assert_eq!(clustering.labels[0], clustering.labels[1]);
/// assert_ne!(clustering.labels[0], clustering.labels[2]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KMeans {
    /// Lloyd iterations per restart.
    pub max_iter: usize,
    /// Number of seeded restarts; the lowest-inertia run wins.
    pub restarts: usize,
    /// Convergence threshold on the squared centroid shift, relative to the
    /// mean per-axis variance of the data.
    pub tolerance: f64,
    /// Base seed; restart `r` uses `seed + r`.
    pub seed: u64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            max_iter: 300,
            restarts: 10,
            tolerance: 1e-4,
            seed: 0,
        }
    }
}

impl KMeans {
    /// Default parameters with the given seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    fn run(&self, points: &[Vec<f64>], k: usize, rng: &mut StdRng, threshold: f64) -> Option<Clustering> {
        let mut centroids = kmeans_plus_plus(points, k, rng);
        let mut labels = assign(points, &centroids);

        for _ in 0..self.max_iter {
            let updated = update(points, &labels, k, points[0].len())?;
            let shift: f64 = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_distance(old, new))
                .sum();
            centroids = updated;

            let next = assign(points, &centroids);
            let stable = next == labels;
            labels = next;
            if stable || shift <= threshold {
                break;
            }
        }

        // Centroids must be the means of the final labels.
        let centroids = update(points, &labels, k, points[0].len())?;
        let inertia = points
            .iter()
            .zip(&labels)
            .map(|(p, &label)| squared_distance(p, &centroids[label]))
            .sum();
        Some(Clustering {
            labels,
            centroids,
            inertia,
        })
    }
}

impl Clusterer for KMeans {
    fn fit(&self, points: &[Vec<f64>], k: usize) -> Result<Clustering, ClusteringError> {
        let Some(first) = points.first() else {
            return Err(ClusteringError::EmptyInput);
        };
        if k == 0 {
            return Err(ClusteringError::InvalidK { k });
        }
        let dim = first.len();
        if let Some((index, p)) = points.iter().enumerate().find(|(_, p)| p.len() != dim) {
            return Err(ClusteringError::DimensionMismatch {
                index,
                expected: dim,
                actual: p.len(),
            });
        }
        let distinct = count_distinct(points);
        if distinct < k {
            return Err(ClusteringError::TooFewDistinctPoints { k, distinct });
        }

        let threshold = self.tolerance * mean_axis_variance(points);
        let mut best: Option<Clustering> = None;
        for restart in 0..self.restarts.max(1) {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(restart as u64));
            match self.run(points, k, &mut rng, threshold) {
                Some(c) if best.as_ref().is_none_or(|b| c.inertia < b.inertia) => best = Some(c),
                Some(_) => {}
                None => tracing::warn!("[kmeans] k={k} restart {restart} ended with an empty cluster"),
            }
        }

        let best = best.ok_or(ClusteringError::EmptyCluster { k })?;
        tracing::debug!("[kmeans] k={k}: inertia {:.6}", best.inertia);
        Ok(best)
    }
}

/// k-means++ seeding: the first center uniformly at random, each further
/// center with probability proportional to its squared distance from the
/// nearest chosen center. Requires at least `k` distinct points.
fn kmeans_plus_plus(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    let first = rng.random_range(0..points.len());
    centroids.push(points[first].clone());

    let mut nearest: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &points[first]))
        .collect();

    while centroids.len() < k {
        let total: f64 = nearest.iter().sum();
        let mut target = rng.random::<f64>() * total;
        // Fall back to the last positive weight if rounding exhausts `target`.
        let mut chosen = nearest.iter().rposition(|&w| w > 0.0).unwrap_or(0);
        for (i, &w) in nearest.iter().enumerate() {
            if w <= 0.0 {
                continue;
            }
            if target < w {
                chosen = i;
                break;
            }
            target -= w;
        }

        let center = points[chosen].clone();
        for (d, p) in nearest.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &center));
        }
        centroids.push(center);
    }
    centroids
}

/// Nearest-centroid label for every point; ties go to the lower label.
fn assign(points: &[Vec<f64>], centroids: &[Vec<f64>]) -> Vec<usize> {
    points
        .iter()
        .map(|p| {
            centroids
                .iter()
                .enumerate()
                .map(|(j, c)| (j, squared_distance(p, c)))
                .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
                .0
        })
        .collect()
}

/// Cluster means, or `None` if a cluster has no members.
fn update(points: &[Vec<f64>], labels: &[usize], k: usize, dim: usize) -> Option<Vec<Vec<f64>>> {
    let mut sums = vec![vec![0.0; dim]; k];
    let mut counts = vec![0usize; k];
    for (p, &label) in points.iter().zip(labels) {
        counts[label] += 1;
        for (s, x) in sums[label].iter_mut().zip(p) {
            *s += x;
        }
    }
    if counts.contains(&0) {
        return None;
    }
    for (sum, &count) in sums.iter_mut().zip(&counts) {
        #[expect(clippy::cast_precision_loss, reason = "cluster sizes are far below 2^52")]
        let n = count as f64;
        for s in sum.iter_mut() {
            *s /= n;
        }
    }
    Some(sums)
}

#[expect(clippy::cast_precision_loss, reason = "point counts are far below 2^52")]
fn mean_axis_variance(points: &[Vec<f64>]) -> f64 {
    let n = points.len() as f64;
    let dim = points[0].len();
    if dim == 0 {
        return 0.0;
    }
    let mut total = 0.0;
    for axis in 0..dim {
        let mean = points.iter().map(|p| p[axis]).sum::<f64>() / n;
        total += points.iter().map(|p| (p[axis] - mean).powi(2)).sum::<f64>() / n;
    }
    total / dim as f64
}

// =============================================================================
// TESTS
// =============================================================================
