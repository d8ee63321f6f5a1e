//! Silhouette scoring of a hard clustering.
//!
//! For point `i` with mean intra-cluster distance `a(i)` and smallest mean
//! distance to another cluster `b(i)`:
//!
//! ```text
//! s(i) = (b(i) - a(i)) / max(a(i), b(i))
//! ```
//!
//! Members of singleton clusters score 0. The overall score is the mean of
//! `s(i)` and lies in `[-1, 1]`.

use crate::core::collections::{FastHashMap, fast_hash_map_with_capacity};
use crate::geometry::util::euclidean_distance;
use rayon::prelude::*;
use thiserror::Error;

/// Errors raised by a [`Scorer`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoringError {
    /// Points and labels have different lengths.
    #[error("Got {points} points but {labels} labels")]
    LengthMismatch {
        /// Number of points.
        points: usize,
        /// Number of labels.
        labels: usize,
    },

    /// Fewer than two distinct labels.
    #[error("Silhouette needs at least 2 distinct labels, got {labels}")]
    TooFewLabels {
        /// Number of distinct labels.
        labels: usize,
    },

    /// As many distinct labels as samples.
    #[error("Silhouette needs fewer distinct labels than samples, got {labels} labels for {samples} samples")]
    TooManyLabels {
        /// Number of distinct labels.
        labels: usize,
        /// Number of samples.
        samples: usize,
    },
}

/// Capability: score the quality of a clustering.
pub trait Scorer: Sync {
    /// Scores `labels` as a partition of `points`; higher is better.
    ///
    /// # Errors
    ///
    /// Implementations must fail when fewer than two distinct labels are
    /// present.
    fn score(&self, points: &[Vec<f64>], labels: &[usize]) -> Result<f64, ScoringError>;
}

/// Mean silhouette coefficient under the Euclidean metric.
///
/// # Examples
///
/// ```rust
/// use empty_space::analysis::silhouette::{Scorer, Silhouette};
///
/// let points = vec![vec![0.0], vec![1.0], vec![10.0], vec![11.0]];
/// let score = Silhouette.score(&points, &[0, 0, 1, 1]).unwrap();
/// assert!(score > 0.85);
///
/// let bad = Silhouette.score(&points, &[0, 1, 0, 1]).unwrap();
/// assert!(bad < 0.0);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Silhouette;

impl Scorer for Silhouette {
    fn score(&self, points: &[Vec<f64>], labels: &[usize]) -> Result<f64, ScoringError> {
        if points.len() != labels.len() {
            return Err(ScoringError::LengthMismatch {
                points: points.len(),
                labels: labels.len(),
            });
        }

        // Dense cluster indices in first-seen order.
        let mut dense: FastHashMap<usize, usize> = fast_hash_map_with_capacity(8);
        let clusters: Vec<usize> = labels
            .iter()
            .map(|&l| {
                let next = dense.len();
                *dense.entry(l).or_insert(next)
            })
            .collect();
        let n_labels = dense.len();
        let n = points.len();
        if n_labels < 2 {
            return Err(ScoringError::TooFewLabels { labels: n_labels });
        }
        if n_labels >= n {
            return Err(ScoringError::TooManyLabels {
                labels: n_labels,
                samples: n,
            });
        }

        let mut sizes = vec![0usize; n_labels];
        for &c in &clusters {
            sizes[c] += 1;
        }

        // Summed sequentially so the result does not depend on the split.
        let coefficients: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|i| coefficient(i, points, &clusters, &sizes))
            .collect();
        let total: f64 = coefficients.iter().sum();
        #[expect(clippy::cast_precision_loss, reason = "sample counts are far below 2^52")]
        let mean = total / n as f64;
        Ok(mean)
    }
}

#[expect(clippy::cast_precision_loss, reason = "cluster sizes are far below 2^52")]
fn coefficient(i: usize, points: &[Vec<f64>], clusters: &[usize], sizes: &[usize]) -> f64 {
    let own = clusters[i];
    if sizes[own] <= 1 {
        return 0.0;
    }

    let mut sums = vec![0.0; sizes.len()];
    for (j, p) in points.iter().enumerate() {
        if j != i {
            sums[clusters[j]] += euclidean_distance(&points[i], p);
        }
    }

    let a = sums[own] / (sizes[own] - 1) as f64;
    let b = sums
        .iter()
        .zip(sizes)
        .enumerate()
        .filter(|&(c, _)| c != own)
        .map(|(_, (&sum, &size))| sum / size as f64)
        .fold(f64::INFINITY, f64::min);

    let denom = a.max(b);
    if denom > 0.0 { (b - a) / denom } else { 0.0 }
}

// =============================================================================
// TESTS
// =============================================================================
