//! Gabriel graph construction.
//!
//! Construction runs in two stages:
//!
//! 1. **Skeleton**: triangulate the points and connect every pair of indices
//!    that share a simplex. Pairs seen in several simplices are added once.
//! 2. **Pruning**: remove every edge whose diametral sphere strictly contains
//!    another point (see [`GabrielPruner`]).
//!
//! The Gabriel graph is a subgraph of the Delaunay triangulation, so the
//! pruned skeleton is the Gabriel graph of the input. Pairs whose sphere
//! only has points on its surface survive when the triangulation contains
//! them; for cospherical input, such as the corners of a square, the
//! triangulation picks one diagonal and only that one is kept.

use crate::core::graph::PointGraph;
use crate::core::pruning::GabrielPruner;
use crate::core::triangulation::{BowyerWatson, TriangulationError, Triangulator};
use crate::geometry::point::{Point, PointError};
use thiserror::Error;

/// Errors raised while building a Gabriel graph.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum GabrielGraphError {
    /// Fewer than `dimension + 1` points were supplied.
    #[error(
        "Insufficient data: {points} points in {dimension}D (need at least {})",
        dimension + 1
    )]
    InsufficientData {
        /// Number of points supplied.
        points: usize,
        /// Dimension of the points (0 when no points were supplied).
        dimension: usize,
    },

    /// The coordinate rows are malformed.
    #[error("Invalid points: {0}")]
    InvalidPoints(#[from] PointError),

    /// The triangulator failed.
    #[error("Triangulation failed: {0}")]
    Triangulation(#[from] TriangulationError),

    /// The triangulator returned a simplex referencing a non-existent point.
    #[error("Simplex references point {index}, but only {points} points exist")]
    SimplexIndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of points.
        points: usize,
    },
}

/// Builds Gabriel graphs with a pluggable [`Triangulator`].
///
/// # Examples
///
/// ```rust
/// use empty_space::core::builder::GabrielBuilder;
///
/// let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
/// let graph = GabrielBuilder::new().build(&square).unwrap();
///
/// // Four sides plus one diagonal: the diagonal's sphere passes through the
/// // other two corners without containing them.
/// assert_eq!(graph.edge_count(), 5);
/// ```
#[derive(Clone, Debug, Default)]
pub struct GabrielBuilder<T = BowyerWatson> {
    triangulator: T,
    pruner: GabrielPruner,
}

impl GabrielBuilder {
    /// Creates a builder backed by the built-in [`BowyerWatson`] triangulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Triangulator> GabrielBuilder<T> {
    /// Replaces the triangulator.
    #[must_use]
    pub fn with_triangulator<U: Triangulator>(self, triangulator: U) -> GabrielBuilder<U> {
        GabrielBuilder {
            triangulator,
            pruner: self.pruner,
        }
    }

    /// Replaces the pruner configuration.
    #[must_use]
    pub const fn with_pruner(mut self, pruner: GabrielPruner) -> Self {
        self.pruner = pruner;
        self
    }

    /// Builds the deduplicated 1-skeleton of the triangulation of `rows`.
    ///
    /// # Errors
    ///
    /// - [`GabrielGraphError::InsufficientData`] if `rows` is empty or has
    ///   fewer than `d + 1` points; the triangulator is not invoked
    /// - [`GabrielGraphError::InvalidPoints`] for ragged or non-finite rows
    /// - [`GabrielGraphError::Triangulation`] if the triangulator fails
    /// - [`GabrielGraphError::SimplexIndexOutOfRange`] if a simplex names a
    ///   point that does not exist
    pub fn skeleton<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<PointGraph, GabrielGraphError> {
        if rows.is_empty() {
            return Err(GabrielGraphError::InsufficientData {
                points: 0,
                dimension: 0,
            });
        }
        let (points, dimension) = Point::from_rows(rows)?;
        if points.len() < dimension + 1 {
            return Err(GabrielGraphError::InsufficientData {
                points: points.len(),
                dimension,
            });
        }

        let simplices = self.triangulator.triangulate(&points)?;
        let point_count = points.len();
        let mut graph = PointGraph::new(points, dimension);

        for simplex in &simplices {
            if let Some(&index) = simplex.iter().find(|&&i| i >= point_count) {
                return Err(GabrielGraphError::SimplexIndexOutOfRange {
                    index,
                    points: point_count,
                });
            }
            for (i, &a) in simplex.iter().enumerate() {
                for &b in &simplex[i + 1..] {
                    // `None` for repeated pairs and repeated indices.
                    let _ = graph.add_edge(a, b);
                }
            }
        }

        tracing::debug!(
            "[gabriel] skeleton of {} simplices: {} points, {} edges",
            simplices.len(),
            graph.point_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Builds the Gabriel graph of `rows`.
    ///
    /// # Errors
    ///
    /// See [`GabrielBuilder::skeleton`].
    pub fn build<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<PointGraph, GabrielGraphError> {
        let mut graph = self.skeleton(rows)?;
        let summary = self.pruner.prune(&mut graph);
        tracing::debug!(
            "[gabriel] pruned {} of {} edges, {} remain",
            summary.removed,
            summary.evaluated,
            summary.retained
        );
        Ok(graph)
    }
}

/// Builds the Gabriel graph of `points` with the default builder.
///
/// # Errors
///
/// Returns [`GabrielGraphError::InsufficientData`] when fewer than `d + 1`
/// points are supplied, and the other [`GabrielGraphError`] variants for
/// malformed input.
///
/// # Examples
///
/// ```rust
/// use empty_space::core::builder::{GabrielGraphError, build_gabriel_graph};
///
/// let err = build_gabriel_graph(&[[0.0, 0.0], [1.0, 1.0]]).unwrap_err();
/// assert_eq!(
///     err,
///     GabrielGraphError::InsufficientData { points: 2, dimension: 2 }
/// );
/// ```
pub fn build_gabriel_graph<R: AsRef<[f64]>>(points: &[R]) -> Result<PointGraph, GabrielGraphError> {
    GabrielBuilder::new().build(points)
}

// =============================================================================
// TESTS
// =============================================================================
