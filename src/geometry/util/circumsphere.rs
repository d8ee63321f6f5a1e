//! Circumsphere calculations for simplices.
//!
//! The circumcenter `C` of a simplex with vertices `x_0, ..., x_d` solves
//!
//! ```text
//! (x_i - x_0) · (C - x_0) = ½ |x_i - x_0|²      for i = 1..d
//! ```
//!
//! i.e. `C - x_0` lies on every perpendicular bisector through `x_0`. The
//! system is solved with an LU decomposition from `nalgebra`; the squared
//! radius is `|C - x_0|²`.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use super::norms::{squared_distance, squared_norm};

/// Relative tolerance below which a simplex is treated as degenerate.
///
/// The LU determinant is compared against this factor times the product of
/// the row norms of the edge matrix (Hadamard's bound), so the test is
/// independent of the simplex's scale.
pub const SINGULARITY_TOLERANCE: f64 = 1e-12;

/// Errors that can occur while computing a circumsphere.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CircumsphereError {
    /// The vertex count does not match the ambient dimension.
    #[error("Expected {expected} vertices for a {dimension}-simplex, got {actual}")]
    InvalidSimplex {
        /// Number of vertices supplied.
        actual: usize,
        /// Number of vertices required (`dimension + 1`).
        expected: usize,
        /// Ambient dimension.
        dimension: usize,
    },

    /// The vertices are affinely dependent.
    #[error("Simplex is degenerate (vertices are affinely dependent)")]
    Degenerate,
}

/// Center and squared radius of a circumscribed hypersphere.
#[derive(Clone, Debug, PartialEq)]
pub struct Circumsphere {
    /// Circumcenter coordinates.
    pub center: Vec<f64>,
    /// Squared circumradius.
    pub radius_squared: f64,
}

impl Circumsphere {
    /// Circumradius.
    #[inline]
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius_squared.sqrt()
    }
}

/// Calculates the circumsphere of a full-dimensional simplex.
///
/// # Arguments
///
/// * `vertices` - `d + 1` coordinate slices of length `d`
///
/// # Errors
///
/// - [`CircumsphereError::InvalidSimplex`] if the vertex count is not `d + 1`
/// - [`CircumsphereError::Degenerate`] if the vertices are (numerically)
///   affinely dependent
///
/// # Examples
///
/// ```
/// use empty_space::geometry::util::circumsphere;
///
/// let a = [0.0, 0.0, 0.0];
/// let b = [1.0, 0.0, 0.0];
/// let c = [0.0, 1.0, 0.0];
/// let d = [0.0, 0.0, 1.0];
/// let sphere = circumsphere(&[&a[..], &b[..], &c[..], &d[..]]).unwrap();
/// assert!((sphere.center[0] - 0.5).abs() < 1e-12);
/// assert!((sphere.radius_squared - 0.75).abs() < 1e-12);
///
/// // Collinear triangle.
/// let err = circumsphere(&[&[0.0, 0.0][..], &[1.0, 1.0][..], &[2.0, 2.0][..]]);
/// assert!(err.is_err());
/// ```
pub fn circumsphere(vertices: &[&[f64]]) -> Result<Circumsphere, CircumsphereError> {
    let Some((origin, rest)) = vertices.split_first() else {
        return Err(CircumsphereError::InvalidSimplex {
            actual: 0,
            expected: 1,
            dimension: 0,
        });
    };
    let dim = origin.len();
    if rest.len() != dim {
        return Err(CircumsphereError::InvalidSimplex {
            actual: vertices.len(),
            expected: dim + 1,
            dimension: dim,
        });
    }

    let a = DMatrix::from_fn(dim, dim, |i, j| rest[i][j] - origin[j]);
    let b = DVector::from_fn(dim, |i, _| 0.5 * squared_distance(rest[i], origin));

    let hadamard_bound: f64 = a.row_iter().map(|row| row.norm()).product();
    let lu = a.lu();
    let det = lu.determinant();
    if !det.is_finite() || det.abs() <= SINGULARITY_TOLERANCE * hadamard_bound {
        return Err(CircumsphereError::Degenerate);
    }

    let offset = lu.solve(&b).ok_or(CircumsphereError::Degenerate)?;
    let radius_squared = squared_norm(offset.as_slice());
    if !radius_squared.is_finite() {
        return Err(CircumsphereError::Degenerate);
    }

    let center = origin
        .iter()
        .zip(offset.iter())
        .map(|(&o, &x)| o + x)
        .collect();

    Ok(Circumsphere {
        center,
        radius_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_circumsphere_of_right_triangle_is_centered_on_hypotenuse() {
        let sphere = circumsphere(&[&[0.0, 0.0], &[2.0, 0.0], &[0.0, 2.0]]).unwrap();
        assert_relative_eq!(sphere.center[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(sphere.center[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(sphere.radius(), 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_circumsphere_vertices_are_equidistant() {
        let verts: [&[f64]; 4] = [
            &[0.3, -1.2, 2.0],
            &[1.7, 0.4, -0.5],
            &[-0.9, 2.2, 0.1],
            &[0.5, 0.5, 3.3],
        ];
        let sphere = circumsphere(&verts).unwrap();
        for v in verts {
            assert_relative_eq!(
                squared_distance(v, &sphere.center),
                sphere.radius_squared,
                max_relative = 1e-10
            );
        }
    }

    #[test]
    fn test_circumsphere_of_segment_is_its_midpoint() {
        let sphere = circumsphere(&[&[1.0], &[5.0]]).unwrap();
        assert_relative_eq!(sphere.center[0], 3.0);
        assert_relative_eq!(sphere.radius_squared, 4.0);
    }

    #[test]
    fn test_circumsphere_rejects_wrong_vertex_count() {
        let err = circumsphere(&[&[0.0, 0.0], &[1.0, 0.0]]).unwrap_err();
        assert_eq!(
            err,
            CircumsphereError::InvalidSimplex {
                actual: 2,
                expected: 3,
                dimension: 2,
            }
        );
        assert!(matches!(
            circumsphere(&[]),
            Err(CircumsphereError::InvalidSimplex { actual: 0, .. })
        ));
    }

    #[test]
    fn test_circumsphere_rejects_degenerate_simplex() {
        assert_eq!(
            circumsphere(&[&[0.0, 0.0], &[1.0, 1.0], &[3.0, 3.0]]),
            Err(CircumsphereError::Degenerate)
        );
        assert_eq!(
            circumsphere(&[&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[1.0, 1.0, 0.0]]),
            Err(CircumsphereError::Degenerate)
        );
    }
}
