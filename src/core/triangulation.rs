//! Triangulation collaborator used to seed the Gabriel graph.
//!
//! The Gabriel graph is a subgraph of the Delaunay triangulation, so its
//! construction only needs the 1-skeleton of *some* triangulation that
//! contains every Gabriel edge. The [`Triangulator`] trait captures that
//! capability; [`BowyerWatson`] is the built-in implementation.
//!
//! # Bowyer–Watson with an enclosing simplex
//!
//! 1. **Initialization**: build a simplex that encloses the data's bounding
//!    ball with a wide margin.
//! 2. **Incremental insertion**: for each data point, in input order:
//!    - collect the cells whose circumsphere strictly contains the point
//!      (`find_bad_cells`)
//!    - the facets that belong to exactly one bad cell bound the cavity
//!    - replace the bad cells by joining each boundary facet to the point
//! 3. **Extraction**: cells made only of data points are reported as full
//!    simplices; cells that touch an enclosing vertex are reported as the
//!    lower-dimensional face spanned by their data points.
//!
//! The enclosing vertices sit at least ten bounding radii from the data,
//! which keeps every diametral ball of a data pair free of them; every
//! Gabriel edge of the data is therefore a Delaunay edge of the augmented set
//! and appears in the reported faces.
//!
//! # References
//!
//! - **Bowyer, A.** "Computing Dirichlet tessellations." *The Computer Journal* 24.2 (1981): 162-166.
//! - **Watson, D.F.** "Computing the n-dimensional Delaunay tessellation with application to
//!   Voronoi polytopes." *The Computer Journal* 24.2 (1981): 167-172.

use crate::core::collections::{
    FastHashMap, FastHashSet, INLINE_CAPACITY, SmallBuffer, fast_hash_map_with_capacity,
};
use crate::geometry::point::Point;
use crate::geometry::predicates::{InSphere, circumsphere_containment};
use crate::geometry::util::{Circumsphere, CircumsphereError, circumsphere, squared_distance};
use std::collections::hash_map::Entry;
use thiserror::Error;

/// Point indices of one simplex (or lower-dimensional face).
pub type Simplex = SmallBuffer<usize, INLINE_CAPACITY>;

/// Distance of the enclosing simplex from the data, in bounding radii.
const ENCLOSING_MARGIN: f64 = 10.0;

/// Errors raised by a [`Triangulator`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TriangulationError {
    /// Fewer than `dimension + 1` points were supplied.
    #[error("Cannot triangulate {points} points in {dimension}D (need at least {})", dimension + 1)]
    InsufficientPoints {
        /// Number of points supplied.
        points: usize,
        /// Ambient dimension.
        dimension: usize,
    },

    /// All points coincide, so no enclosing simplex can be sized.
    #[error("All {points} points coincide")]
    CoincidentPoints {
        /// Number of points supplied.
        points: usize,
    },

    /// The enclosing simplex could not be built.
    #[error("Enclosing simplex over {points} points is degenerate: {source}")]
    DegenerateEnclosure {
        /// Number of points supplied.
        points: usize,
        /// The underlying circumsphere failure.
        #[source]
        source: CircumsphereError,
    },
}

/// Capability: decompose a point set into simplices.
///
/// Implementations receive validated points (common dimension, finite
/// coordinates, ids equal to positions) and return simplices as index sets
/// into that slice. Simplices may be lower-dimensional faces; only their
/// pairwise index combinations are used downstream.
///
/// Closures with the matching signature implement the trait, which is handy
/// for supplying a fixed triangulation:
///
/// ```rust
/// use empty_space::core::triangulation::{Simplex, Triangulator, TriangulationError};
/// use empty_space::geometry::point::Point;
///
/// let fixed = |_: &[Point]| -> Result<Vec<Simplex>, TriangulationError> {
///     Ok(vec![Simplex::from_slice(&[0, 1, 2])])
/// };
/// let (points, _) = Point::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
/// assert_eq!(fixed.triangulate(&points).unwrap().len(), 1);
/// ```
pub trait Triangulator {
    /// Triangulates `points`.
    ///
    /// # Errors
    ///
    /// Implementation-defined; must fail with
    /// [`TriangulationError::InsufficientPoints`] when fewer than
    /// `dimension + 1` points are supplied.
    fn triangulate(&self, points: &[Point]) -> Result<Vec<Simplex>, TriangulationError>;
}

impl<F> Triangulator for F
where
    F: Fn(&[Point]) -> Result<Vec<Simplex>, TriangulationError>,
{
    fn triangulate(&self, points: &[Point]) -> Result<Vec<Simplex>, TriangulationError> {
        self(points)
    }
}

/// Incremental n-dimensional Bowyer–Watson triangulator.
///
/// # Examples
///
/// ```rust
/// use empty_space::core::triangulation::{BowyerWatson, Triangulator};
/// use empty_space::geometry::point::Point;
///
/// let (points, _) =
///     Point::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]).unwrap();
/// let simplices = BowyerWatson.triangulate(&points).unwrap();
///
/// // Two triangles sharing one diagonal.
/// let triangles: Vec<_> = simplices.iter().filter(|s| s.len() == 3).collect();
/// assert_eq!(triangles.len(), 2);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct BowyerWatson;

#[derive(Clone, Debug)]
struct Cell {
    vertices: Simplex,
    sphere: Circumsphere,
}

impl Triangulator for BowyerWatson {
    fn triangulate(&self, points: &[Point]) -> Result<Vec<Simplex>, TriangulationError> {
        let dimension = points.first().map_or(0, Point::dim);
        if points.len() < dimension + 1 || dimension == 0 {
            return Err(TriangulationError::InsufficientPoints {
                points: points.len(),
                dimension,
            });
        }

        let mut coords: Vec<Vec<f64>> = points.iter().map(|p| p.coords().to_vec()).collect();
        let data_len = coords.len();
        coords.extend(enclosing_simplex(points, dimension)?);

        let initial: Simplex = (data_len..data_len + dimension + 1).collect();
        let sphere = cell_sphere(&coords, &initial).map_err(|source| {
            TriangulationError::DegenerateEnclosure {
                points: data_len,
                source,
            }
        })?;
        let mut cells = vec![Cell {
            vertices: initial,
            sphere,
        }];

        for point in 0..data_len {
            let bad = find_bad_cells(&cells, &coords[point]);
            if bad.is_empty() {
                tracing::warn!(
                    "[bowyer-watson] point {point} lies in no circumsphere (duplicate?); skipping"
                );
                continue;
            }

            let boundary = cavity_boundary(&cells, &bad);
            let mut keep = vec![true; cells.len()];
            for &b in &bad {
                keep[b] = false;
            }
            let mut flags = keep.into_iter();
            cells.retain(|_| flags.next().unwrap_or(true));

            for facet in boundary {
                let mut vertices = facet;
                vertices.push(point);
                vertices.sort_unstable();
                match cell_sphere(&coords, &vertices) {
                    Ok(sphere) => cells.push(Cell { vertices, sphere }),
                    // Only reachable through rounding on cospherical input.
                    Err(source) => tracing::warn!(
                        "[bowyer-watson] dropping degenerate cell {vertices:?} at point {point}: {source}"
                    ),
                }
            }
        }

        tracing::debug!(
            "[bowyer-watson] {} cells after inserting {data_len} points in {dimension}D",
            cells.len()
        );

        Ok(extract_simplices(&cells, data_len))
    }
}

/// Vertices of a simplex enclosing the data's bounding ball, each at least
/// `ENCLOSING_MARGIN` bounding radii from its center.
fn enclosing_simplex(
    points: &[Point],
    dimension: usize,
) -> Result<Vec<Vec<f64>>, TriangulationError> {
    let mut lo = vec![f64::INFINITY; dimension];
    let mut hi = vec![f64::NEG_INFINITY; dimension];
    for p in points {
        for (axis, &x) in p.coords().iter().enumerate() {
            lo[axis] = lo[axis].min(x);
            hi[axis] = hi[axis].max(x);
        }
    }
    let center: Vec<f64> = lo.iter().zip(&hi).map(|(a, b)| (a + b) / 2.0).collect();
    let radius = squared_distance(&lo, &hi).sqrt() / 2.0;
    if radius <= 0.0 {
        return Err(TriangulationError::CoincidentPoints {
            points: points.len(),
        });
    }

    // Corner simplex {s0, s0 + L e_i}: contains every x with x_i >= s0_i and
    // sum(x - s0) <= L. With s0 = c - a·1 and L = 3·d·a this holds on the
    // bounding ball, and every vertex is at least a >= 10R from c.
    #[expect(
        clippy::cast_precision_loss,
        reason = "dimension is small; exact conversion to f64"
    )]
    let d = dimension as f64;
    let a = ENCLOSING_MARGIN * radius;
    let length = 3.0 * d * a;

    let corner: Vec<f64> = center.iter().map(|c| c - a).collect();
    let mut vertices = Vec::with_capacity(dimension + 1);
    vertices.push(corner.clone());
    for axis in 0..dimension {
        let mut v = corner.clone();
        v[axis] += length;
        vertices.push(v);
    }
    Ok(vertices)
}

fn cell_sphere(coords: &[Vec<f64>], vertices: &[usize]) -> Result<Circumsphere, CircumsphereError> {
    let verts: SmallBuffer<&[f64], INLINE_CAPACITY> =
        vertices.iter().map(|&v| coords[v].as_slice()).collect();
    circumsphere(&verts)
}

/// Cells whose circumsphere strictly contains `point`.
fn find_bad_cells(cells: &[Cell], point: &[f64]) -> Vec<usize> {
    cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| circumsphere_containment(&cell.sphere, point) == InSphere::INSIDE)
        .map(|(i, _)| i)
        .collect()
}

/// Facets that belong to exactly one bad cell, in first-seen order.
fn cavity_boundary(cells: &[Cell], bad: &[usize]) -> Vec<Simplex> {
    let mut counts: FastHashMap<Simplex, usize> = fast_hash_map_with_capacity(bad.len() * 4);
    let mut order: Vec<Simplex> = Vec::new();
    for &b in bad {
        let vertices = &cells[b].vertices;
        for skip in 0..vertices.len() {
            let facet: Simplex = vertices
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != skip)
                .map(|(_, &v)| v)
                .collect();
            match counts.entry(facet) {
                Entry::Occupied(mut e) => *e.get_mut() += 1,
                Entry::Vacant(e) => {
                    order.push(e.key().clone());
                    e.insert(1);
                }
            }
        }
    }
    order.retain(|facet| counts.get(facet) == Some(&1));
    order
}

fn extract_simplices(cells: &[Cell], data_len: usize) -> Vec<Simplex> {
    let mut seen: FastHashSet<Simplex> = FastHashSet::default();
    let mut simplices = Vec::with_capacity(cells.len());
    for cell in cells {
        let face: Simplex = cell
            .vertices
            .iter()
            .copied()
            .filter(|&v| v < data_len)
            .collect();
        if face.len() >= 2 && seen.insert(face.clone()) {
            simplices.push(face);
        }
    }
    simplices
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::util::circumsphere;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn points_from(rows: &[Vec<f64>]) -> Vec<Point> {
        Point::from_rows(rows).unwrap().0
    }

    fn full_cells(simplices: &[Simplex], dimension: usize) -> Vec<&Simplex> {
        simplices.iter().filter(|s| s.len() == dimension + 1).collect()
    }

    // =============================================================================
    // ERROR PATHS
    // =============================================================================

    #[test]
    fn test_rejects_too_few_points() {
        let points = points_from(&[vec![0.0, 0.0], vec![1.0, 1.0]]);
        assert_eq!(
            BowyerWatson.triangulate(&points),
            Err(TriangulationError::InsufficientPoints {
                points: 2,
                dimension: 2
            })
        );
    }

    #[test]
    fn test_rejects_coincident_points() {
        let points = points_from(&[vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0]]);
        assert_eq!(
            BowyerWatson.triangulate(&points),
            Err(TriangulationError::CoincidentPoints { points: 3 })
        );
    }

    // =============================================================================
    // STRUCTURE
    // =============================================================================

    #[test]
    fn test_single_triangle() {
        let points = points_from(&[vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]);
        let simplices = BowyerWatson.triangulate(&points).unwrap();
        let cells = full_cells(&simplices, 2);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_single_tetrahedron_in_3d() {
        let points = points_from(&[
            vec![0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ]);
        let simplices = BowyerWatson.triangulate(&points).unwrap();
        assert_eq!(full_cells(&simplices, 3).len(), 1);
    }

    #[test]
    fn test_one_dimensional_points_form_a_path() {
        let points = points_from(&[vec![3.0], vec![0.0], vec![1.0], vec![7.0]]);
        let simplices = BowyerWatson.triangulate(&points).unwrap();
        let mut segments: Vec<_> = full_cells(&simplices, 1)
            .into_iter()
            .map(|s| s.to_vec())
            .collect();
        segments.sort();
        assert_eq!(segments, vec![vec![0, 2], vec![0, 3], vec![1, 2]]);
    }

    #[test]
    fn test_duplicate_points_are_skipped() {
        let points = points_from(&[
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
        ]);
        let simplices = BowyerWatson.triangulate(&points).unwrap();
        assert!(simplices.iter().all(|s| !s.contains(&3)));
        assert_eq!(full_cells(&simplices, 2).len(), 1);
    }

    // =============================================================================
    // DELAUNAY PROPERTY
    // =============================================================================

    #[test]
    fn test_full_cells_have_empty_circumspheres() {
        let mut rng = StdRng::seed_from_u64(42);
        for dimension in 2..=3 {
            let rows: Vec<Vec<f64>> = (0..40)
                .map(|_| (0..dimension).map(|_| rng.random_range(-5.0..5.0)).collect())
                .collect();
            let points = points_from(&rows);
            let simplices = BowyerWatson.triangulate(&points).unwrap();
            let cells = full_cells(&simplices, dimension);
            assert!(!cells.is_empty());

            for cell in cells {
                let verts: Vec<&[f64]> = cell.iter().map(|&v| rows[v].as_slice()).collect();
                let sphere = circumsphere(&verts).unwrap();
                for (i, row) in rows.iter().enumerate() {
                    if cell.contains(&i) {
                        continue;
                    }
                    assert_ne!(
                        circumsphere_containment(&sphere, row),
                        InSphere::INSIDE,
                        "point {i} inside circumsphere of {cell:?} ({dimension}D)"
                    );
                }
            }
        }
    }

    #[test]
    fn test_every_point_is_covered() {
        let mut rng = StdRng::seed_from_u64(7);
        let rows: Vec<Vec<f64>> = (0..60)
            .map(|_| vec![rng.random_range(0.0..1.0), rng.random_range(0.0..1.0)])
            .collect();
        let points = points_from(&rows);
        let simplices = BowyerWatson.triangulate(&points).unwrap();
        for i in 0..rows.len() {
            assert!(
                simplices.iter().any(|s| s.contains(&i)),
                "point {i} missing from the triangulation"
            );
        }
    }

    #[test]
    fn test_closure_triangulator() {
        let fixed = |points: &[Point]| -> Result<Vec<Simplex>, TriangulationError> {
            Ok(vec![(0..points.len()).collect()])
        };
        let points = points_from(&[vec![0.0], vec![1.0]]);
        assert_eq!(fixed.triangulate(&points).unwrap()[0].as_slice(), &[0, 1]);
    }
}
