//! Choosing the number of ghost points.
//!
//! For every `k` in `[2, max_clusters)` the gap midpoints are clustered and
//! the clustering scored. All `(k, fit, score)` evaluations run in parallel;
//! only once every one has finished is the best `k` picked, scanning in
//! increasing `k` so that exact ties resolve to the smaller `k`.
//!
//! The chosen clustering's centroids become [`GhostPoint`]s, each carrying the
//! mean length of the gaps assigned to it.

use crate::analysis::clustering::{Clusterer, Clustering, ClusteringError, KMeans};
use crate::analysis::silhouette::{Scorer, ScoringError, Silhouette};
use crate::core::gaps::GapCandidate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a cluster search could not produce a result.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum ClusteringFailure {
    /// No gap candidates were supplied.
    #[error("No gap candidates to cluster")]
    NoCandidates,

    /// Fitting `k` clusters failed.
    #[error("Clustering failed for k={k}: {source}")]
    Fit {
        /// The cluster count being fitted.
        k: usize,
        /// Underlying error.
        #[source]
        source: ClusteringError,
    },

    /// Scoring the `k`-clustering failed.
    #[error("Scoring failed for k={k}: {source}")]
    Score {
        /// The cluster count being scored.
        k: usize,
        /// Underlying error.
        #[source]
        source: ScoringError,
    },

    /// The scorer returned NaN or an infinity.
    #[error("Score for k={k} is not finite: {score}")]
    NonFiniteScore {
        /// The cluster count being scored.
        k: usize,
        /// The returned score.
        score: f64,
    },

    /// The clusterer returned labels that do not match its centroids.
    #[error("Clustering for k={k} has labels outside its {centroids} centroids or empty clusters")]
    InvalidLabels {
        /// The cluster count being fitted.
        k: usize,
        /// Number of centroids returned.
        centroids: usize,
    },
}

/// Errors raised by [`ClusterSelector::select`].
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum ClusterSelectionError {
    /// `max_clusters < 3` leaves no `k` to try.
    #[error("Invalid cluster range: max_clusters must be at least 3, got {max_clusters}")]
    InvalidClusterRange {
        /// The requested upper bound (exclusive).
        max_clusters: usize,
    },

    /// The search could not be completed.
    #[error(transparent)]
    ClusteringFailure(#[from] ClusteringFailure),
}

/// Representative location of a group of gaps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GhostPoint {
    /// Cluster centroid.
    pub coordinates: Vec<f64>,
    /// Mean length of the gaps assigned to this cluster.
    pub avg_gap_length: f64,
}

/// Result of a cluster search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Chosen number of clusters.
    pub k: usize,
    /// Score of every `k` tried, in increasing `k`.
    pub scores: Vec<(usize, f64)>,
    /// One ghost point per cluster, in label order.
    pub ghost_points: Vec<GhostPoint>,
    /// Cluster label of each candidate.
    pub labels: Vec<usize>,
}

/// The `(k, score)` with the highest score, scanning in order; the first
/// maximum wins.
#[must_use]
pub fn best_score(scores: &[(usize, f64)]) -> Option<(usize, f64)> {
    scores.iter().copied().fold(None, |best, (k, s)| match best {
        Some((_, b)) if s <= b => best,
        _ => Some((k, s)),
    })
}

/// Model selection over the number of clusters.
///
/// # Examples
///
/// ```rust
/// use empty_space::analysis::selection::ClusterSelector;
/// use empty_space::core::gaps::GapCandidate;
///
/// // Two tight groups of gaps.
/// let mut candidates = Vec::new();
/// for i in 0..5 {
///     let dx = f64::from(i) * 0.1;
///     candidates.push(GapCandidate { midpoint: vec![dx, 0.0], length: 2.0 });
///     candidates.push(GapCandidate { midpoint: vec![10.0 + dx, 0.0], length: 4.0 });
/// }
///
/// let selection = ClusterSelector::with_seed(0).select(&candidates, 6).unwrap();
/// assert_eq!(selection.k, 2);
/// let mut lengths: Vec<f64> = selection.ghost_points.iter().map(|g| g.avg_gap_length).collect();
/// lengths.sort_by(f64::total_cmp);
/// assert_eq!(lengths, vec![2.0, 4.0]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ClusterSelector<C = KMeans, S = Silhouette> {
    clusterer: C,
    scorer: S,
}

impl ClusterSelector {
    /// Seeded [`KMeans`] scored by [`Silhouette`].
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::new(KMeans::with_seed(seed), Silhouette)
    }
}

impl<C: Clusterer, S: Scorer> ClusterSelector<C, S> {
    /// Creates a selector from a clusterer and a scorer.
    #[must_use]
    pub const fn new(clusterer: C, scorer: S) -> Self {
        Self { clusterer, scorer }
    }

    /// The clusterer.
    #[must_use]
    pub const fn clusterer(&self) -> &C {
        &self.clusterer
    }

    /// Picks the number of clusters for `candidates` and derives ghost points.
    ///
    /// Every `k` in `[2, max_clusters)` is tried. Sparse candidates that
    /// cannot support the largest `k` fail the whole search rather than
    /// shrinking it.
    ///
    /// # Errors
    ///
    /// - [`ClusterSelectionError::InvalidClusterRange`] if `max_clusters < 3`
    /// - [`ClusteringFailure::NoCandidates`] if `candidates` is empty
    /// - [`ClusteringFailure::Fit`] / [`ClusteringFailure::Score`] for the
    ///   smallest `k` whose fit or score failed, including every `k` that
    ///   exceeds the number of distinct midpoints; no partial result is
    ///   returned
    pub fn select(
        &self,
        candidates: &[GapCandidate],
        max_clusters: usize,
    ) -> Result<Selection, ClusterSelectionError> {
        if max_clusters < 3 {
            return Err(ClusterSelectionError::InvalidClusterRange { max_clusters });
        }
        if candidates.is_empty() {
            return Err(ClusterSelectionError::from(ClusteringFailure::NoCandidates));
        }

        let midpoints: Vec<Vec<f64>> = candidates.iter().map(|c| c.midpoint.clone()).collect();

        let ks: Vec<usize> = (2..max_clusters).collect();
        let outcomes: Vec<Result<(Clustering, f64), ClusteringFailure>> = ks
            .par_iter()
            .map(|&k| self.evaluate(&midpoints, k))
            .collect();

        let mut scores = Vec::with_capacity(ks.len());
        let mut fits = Vec::with_capacity(ks.len());
        for (&k, outcome) in ks.iter().zip(outcomes) {
            let (clustering, score) = outcome?;
            tracing::debug!("[select] k={k}: silhouette {score:.6}");
            scores.push((k, score));
            fits.push(clustering);
        }

        let (k, score) = best_score(&scores).ok_or(ClusteringFailure::NoCandidates)?;
        let clustering = fits.swap_remove(k - 2);
        tracing::debug!("[select] chose k={k} (silhouette {score:.6})");

        let ghost_points = ghost_points(candidates, &clustering);
        Ok(Selection {
            k,
            scores,
            ghost_points,
            labels: clustering.labels,
        })
    }

    fn evaluate(&self, midpoints: &[Vec<f64>], k: usize) -> Result<(Clustering, f64), ClusteringFailure> {
        let clustering = self
            .clusterer
            .fit(midpoints, k)
            .map_err(|source| ClusteringFailure::Fit { k, source })?;

        let centroids = clustering.centroids.len();
        if clustering.labels.len() != midpoints.len()
            || clustering.labels.iter().any(|&l| l >= centroids)
            || clustering.cluster_sizes().contains(&0)
        {
            return Err(ClusteringFailure::InvalidLabels { k, centroids });
        }

        let score = self
            .scorer
            .score(midpoints, &clustering.labels)
            .map_err(|source| ClusteringFailure::Score { k, source })?;
        if !score.is_finite() {
            return Err(ClusteringFailure::NonFiniteScore { k, score });
        }
        Ok((clustering, score))
    }
}

fn ghost_points(candidates: &[GapCandidate], clustering: &Clustering) -> Vec<GhostPoint> {
    let mut sums = vec![0.0; clustering.k()];
    for (candidate, &label) in candidates.iter().zip(&clustering.labels) {
        sums[label] += candidate.length;
    }
    clustering
        .centroids
        .iter()
        .zip(sums)
        .zip(clustering.cluster_sizes())
        .map(|((centroid, sum), count)| {
            #[expect(clippy::cast_precision_loss, reason = "cluster sizes are far below 2^52")]
            let avg_gap_length = sum / count as f64;
            GhostPoint {
                coordinates: centroid.clone(),
                avg_gap_length,
            }
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
