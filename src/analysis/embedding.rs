//! Joint low-dimensional embedding of data and ghost points.
//!
//! Ghost points are embedded *together* with the data so that both land in
//! the same coordinate frame: the rows are concatenated (data first, then
//! ghosts in label order), embedded once, and split back by index.
//!
//! Two [`Embedder`]s are provided:
//!
//! - [`ClassicalMds`]: Torgerson scaling. Double-centre the squared distance
//!   matrix and keep the top eigenpairs. Deterministic, and exact when the
//!   data already lies in `target_dim` dimensions.
//! - [`Mds`]: metric MDS by stress majorization (SMACOF). Each restart
//!   iterates the Guttman transform
//!
//!   ```text
//!   X ← (1/n) · B(X) · X,    B_ij = -δ_ij / d_ij(X)  (i ≠ j),   B_ii = -Σ_{j≠i} B_ij
//!   ```
//!
//!   which never increases the raw stress `Σ_{i<j} (δ_ij - d_ij(X))²`. The
//!   restart with the lowest final stress wins.

use crate::analysis::selection::GhostPoint;
use crate::geometry::util::euclidean_distance;
use nalgebra::{DMatrix, SymmetricEigen};
use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use thiserror::Error;

/// Errors raised while embedding.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum EmbeddingError {
    /// No rows were supplied.
    #[error("Cannot embed an empty point set")]
    EmptyInput,

    /// `target_dim` is zero.
    #[error("Target dimension must be at least 1, got {target_dim}")]
    InvalidTargetDimension {
        /// The requested dimension.
        target_dim: usize,
    },

    /// Rows have differing lengths.
    #[error("Row {index} has {actual} coordinates, expected {expected}")]
    DimensionMismatch {
        /// Index of the offending row in the joint input.
        index: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        actual: usize,
    },

    /// A coordinate is NaN or infinite.
    #[error("Row {index} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Index of the offending row.
        index: usize,
    },

    /// The embedder returned the wrong number of rows.
    #[error("Embedder returned {actual} rows for {expected} inputs")]
    RowCountMismatch {
        /// Rows supplied.
        expected: usize,
        /// Rows returned.
        actual: usize,
    },
}

/// Capability: map points to `target_dim` coordinates, one row per point.
pub trait Embedder {
    /// Embeds `points` into `target_dim` dimensions.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the built-in embedders fail on empty input, a
    /// zero `target_dim`, ragged rows and non-finite coordinates.
    fn embed(&self, points: &[Vec<f64>], target_dim: usize) -> Result<Vec<Vec<f64>>, EmbeddingError>;
}

fn validate(points: &[Vec<f64>], target_dim: usize) -> Result<(), EmbeddingError> {
    let Some(first) = points.first() else {
        return Err(EmbeddingError::EmptyInput);
    };
    if target_dim == 0 {
        return Err(EmbeddingError::InvalidTargetDimension { target_dim });
    }
    for (index, row) in points.iter().enumerate() {
        if row.len() != first.len() {
            return Err(EmbeddingError::DimensionMismatch {
                index,
                expected: first.len(),
                actual: row.len(),
            });
        }
        if !row.iter().all(|x| x.is_finite()) {
            return Err(EmbeddingError::NonFiniteCoordinate { index });
        }
    }
    Ok(())
}

fn distance_matrix(points: &[Vec<f64>]) -> DMatrix<f64> {
    let n = points.len();
    DMatrix::from_fn(n, n, |i, j| euclidean_distance(&points[i], &points[j]))
}

fn row_distances(x: &DMatrix<f64>) -> DMatrix<f64> {
    let n = x.nrows();
    DMatrix::from_fn(n, n, |i, j| (x.row(i) - x.row(j)).norm())
}

fn into_rows(x: &DMatrix<f64>) -> Vec<Vec<f64>> {
    x.row_iter().map(|row| row.iter().copied().collect()).collect()
}

fn stress_between(dissimilarities: &DMatrix<f64>, distances: &DMatrix<f64>) -> f64 {
    let n = dissimilarities.nrows();
    let mut total = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            total += (dissimilarities[(i, j)] - distances[(i, j)]).powi(2);
        }
    }
    total
}

/// Raw stress `Σ_{i<j} (|p_i - p_j| - |e_i - e_j|)²` of an embedding.
///
/// # Panics
///
/// Panics if `embedding` has fewer rows than `points`.
#[must_use]
pub fn raw_stress(points: &[Vec<f64>], embedding: &[Vec<f64>]) -> f64 {
    stress_between(&distance_matrix(points), &distance_matrix(&embedding[..points.len()]))
}

// =============================================================================
// CLASSICAL MDS
// =============================================================================

/// Classical (Torgerson) multidimensional scaling.
///
/// Eigenvectors are sign-normalized so that their largest-magnitude entry is
/// positive, which makes the output independent of the eigen solver's sign
/// convention. Negative eigenvalues are clamped to zero; columns beyond the
/// rank of the data are zero.
///
/// # Examples
///
/// ```rust
/// use empty_space::analysis::embedding::{ClassicalMds, Embedder};
///
/// let points = vec![vec![0.0, 0.0, 5.0], vec![3.0, 0.0, 5.0], vec![0.0, 4.0, 5.0]];
/// let embedded = ClassicalMds.embed(&points, 2).unwrap();
///
/// let d = |a: &[f64], b: &[f64]| ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt();
/// assert!((d(&embedded[1], &embedded[2]) - 5.0).abs() < 1e-9);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassicalMds;

impl ClassicalMds {
    fn embed_matrix(dissimilarities: &DMatrix<f64>, target_dim: usize) -> DMatrix<f64> {
        let n = dissimilarities.nrows();
        #[expect(clippy::cast_precision_loss, reason = "point counts are far below 2^52")]
        let nf = n as f64;

        let squared = dissimilarities.map(|d| d * d);
        let row_means: Vec<f64> = squared.row_iter().map(|r| r.sum() / nf).collect();
        let grand = row_means.iter().sum::<f64>() / nf;
        // B = -½ J D² J; D² is symmetric so column means equal row means.
        let gram = DMatrix::from_fn(n, n, |i, j| {
            -0.5 * (squared[(i, j)] - row_means[i] - row_means[j] + grand)
        });

        let eigen = SymmetricEigen::new(gram);
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| Reverse(OrderedFloat(eigen.eigenvalues[i])));

        let mut out = DMatrix::zeros(n, target_dim);
        for (col, &idx) in order.iter().take(target_dim).enumerate() {
            let scale = eigen.eigenvalues[idx].max(0.0).sqrt();
            let vector = eigen.eigenvectors.column(idx);
            let pivot = vector
                .iter()
                .copied()
                .fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
            let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
            for row in 0..n {
                out[(row, col)] = sign * scale * vector[row];
            }
        }
        out
    }
}

impl Embedder for ClassicalMds {
    fn embed(&self, points: &[Vec<f64>], target_dim: usize) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        validate(points, target_dim)?;
        let embedded = Self::embed_matrix(&distance_matrix(points), target_dim);
        Ok(into_rows(&embedded))
    }
}

// =============================================================================
// METRIC MDS (SMACOF)
// =============================================================================

/// Starting configuration for each SMACOF restart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MdsInit {
    /// Uniform random coordinates in `[0, 1)`, one seed per restart.
    #[default]
    Random,
    /// The classical MDS solution; a single deterministic run.
    Classical,
}

/// Metric multidimensional scaling by stress majorization.
///
/// # Examples
///
/// ```rust
/// use empty_space::analysis::embedding::{Embedder, Mds};
///
/// let points = vec![vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]];
/// let a = Mds::with_seed(3).embed(&points, 2).unwrap();
/// let b = Mds::with_seed(3).embed(&points, 2).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 4);
/// assert!(a.iter().all(|row| row.len() == 2));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mds {
    /// Guttman transforms per restart.
    pub max_iter: usize,
    /// Stop once the normalized stress improves by less than this.
    pub eps: f64,
    /// Number of restarts; ignored for [`MdsInit::Classical`].
    pub restarts: usize,
    /// Base seed; restart `r` uses `seed + r`.
    pub seed: u64,
    /// Starting configuration.
    pub init: MdsInit,
}

impl Default for Mds {
    fn default() -> Self {
        Self {
            max_iter: 300,
            eps: 1e-3,
            restarts: 4,
            seed: 0,
            init: MdsInit::Random,
        }
    }
}

impl Mds {
    /// Default parameters with the given seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Returns a copy using `init` as the starting configuration.
    #[must_use]
    pub const fn with_init(mut self, init: MdsInit) -> Self {
        self.init = init;
        self
    }

    /// Runs SMACOF from `x`; returns the final configuration and its stress.
    fn smacof(&self, dissimilarities: &DMatrix<f64>, mut x: DMatrix<f64>) -> (DMatrix<f64>, f64) {
        let n = dissimilarities.nrows();
        #[expect(clippy::cast_precision_loss, reason = "point counts are far below 2^52")]
        let nf = n as f64;
        let mut previous: Option<f64> = None;

        for iteration in 0..self.max_iter {
            let distances = row_distances(&x);
            let stress = stress_between(dissimilarities, &distances);

            let mut b = DMatrix::from_fn(n, n, |i, j| {
                if i != j && distances[(i, j)] > 0.0 {
                    -dissimilarities[(i, j)] / distances[(i, j)]
                } else {
                    0.0
                }
            });
            for i in 0..n {
                b[(i, i)] = -b.row(i).sum();
            }
            x = (&b * &x) / nf;

            let scale: f64 = x.row_iter().map(|row| row.norm()).sum();
            if scale <= 0.0 {
                break;
            }
            let normalized = stress / scale;
            if previous.is_some_and(|p| p - normalized < self.eps) {
                tracing::debug!("[mds] converged after {} iterations", iteration + 1);
                break;
            }
            previous = Some(normalized);
        }

        let stress = stress_between(dissimilarities, &row_distances(&x));
        (x, stress)
    }
}

impl Embedder for Mds {
    fn embed(&self, points: &[Vec<f64>], target_dim: usize) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        validate(points, target_dim)?;
        let dissimilarities = distance_matrix(points);
        let n = points.len();

        let (best, stress) = match self.init {
            MdsInit::Classical => {
                let init = ClassicalMds::embed_matrix(&dissimilarities, target_dim);
                self.smacof(&dissimilarities, init)
            }
            MdsInit::Random => {
                let mut best: Option<(DMatrix<f64>, f64)> = None;
                for restart in 0..self.restarts.max(1) {
                    let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(restart as u64));
                    let init = DMatrix::from_fn(n, target_dim, |_, _| rng.random::<f64>());
                    let (x, stress) = self.smacof(&dissimilarities, init);
                    tracing::debug!("[mds] restart {restart}: stress {stress:.6}");
                    if best.as_ref().is_none_or(|(_, s)| stress < *s) {
                        best = Some((x, stress));
                    }
                }
                // `restarts.max(1)` guarantees at least one run.
                best.unwrap_or_else(|| (DMatrix::zeros(n, target_dim), f64::INFINITY))
            }
        };

        tracing::debug!("[mds] embedded {n} points into {target_dim}D, stress {stress:.6}");
        Ok(into_rows(&best))
    }
}

// =============================================================================
// JOINT EMBEDDING
// =============================================================================

/// Data and ghost points in a shared embedded space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointEmbedding {
    /// Embedded data points, in input order.
    pub points: Vec<Vec<f64>>,
    /// Embedded ghost points, in input order.
    pub ghost_points: Vec<Vec<f64>>,
}

impl JointEmbedding {
    /// Splits into `(embedded_points, embedded_ghost_points)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        (self.points, self.ghost_points)
    }
}

/// Embeds `points` and `ghost_points` together with a seeded default [`Mds`].
///
/// # Errors
///
/// See [`joint_embed_with`].
pub fn joint_embed<R: AsRef<[f64]>>(
    points: &[R],
    ghost_points: &[GhostPoint],
    target_dim: usize,
) -> Result<JointEmbedding, EmbeddingError> {
    joint_embed_with(&Mds::default(), points, ghost_points, target_dim)
}

/// Embeds `points` and `ghost_points` together with `embedder`.
///
/// Rows `[0, N)` of the joint embedding are the data points and rows
/// `[N, N + M)` the ghost points, each in input order.
///
/// # Errors
///
/// - [`EmbeddingError::DimensionMismatch`] if any row (data or ghost) differs
///   in length from the first data row
/// - [`EmbeddingError::RowCountMismatch`] if the embedder returns the wrong
///   number of rows
/// - any error from the embedder itself
///
/// # Examples
///
/// ```rust
/// use empty_space::analysis::embedding::{ClassicalMds, joint_embed_with};
/// use empty_space::analysis::selection::GhostPoint;
///
/// let points = [[0.0, 0.0], [4.0, 0.0], [0.0, 4.0], [4.0, 4.0]];
/// let ghosts = [GhostPoint { coordinates: vec![2.0, 2.0], avg_gap_length: 4.0 }];
///
/// let joint = joint_embed_with(&ClassicalMds, &points, &ghosts, 2).unwrap();
/// assert_eq!(joint.points.len(), 4);
/// assert_eq!(joint.ghost_points.len(), 1);
/// // The centre of the square stays at the centroid of the embedding.
/// assert!(joint.ghost_points[0].iter().all(|x| x.abs() < 1e-9));
/// ```
pub fn joint_embed_with<E, R>(
    embedder: &E,
    points: &[R],
    ghost_points: &[GhostPoint],
    target_dim: usize,
) -> Result<JointEmbedding, EmbeddingError>
where
    E: Embedder + ?Sized,
    R: AsRef<[f64]>,
{
    let n = points.len();
    let mut joint: Vec<Vec<f64>> = Vec::with_capacity(n + ghost_points.len());
    joint.extend(points.iter().map(|p| p.as_ref().to_vec()));
    joint.extend(ghost_points.iter().map(|g| g.coordinates.clone()));

    if let Some(first) = joint.first() {
        let expected = first.len();
        if let Some((index, row)) = joint.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(EmbeddingError::DimensionMismatch {
                index,
                expected,
                actual: row.len(),
            });
        }
    }

    let expected = joint.len();
    let mut embedded = embedder.embed(&joint, target_dim)?;
    if embedded.len() != expected {
        return Err(EmbeddingError::RowCountMismatch {
            expected,
            actual: embedded.len(),
        });
    }

    let ghosts = embedded.split_off(n);
    Ok(JointEmbedding {
        points: embedded,
        ghost_points: ghosts,
    })
}

// =============================================================================
// TESTS
// =============================================================================
