//! Geometric predicates for d-dimensional geometry calculations.
//!
//! Two sphere-containment predicates live here:
//!
//! - [`diametral_sphere_containment`], the Gabriel edge test: is a point inside
//!   the hypersphere that has segment `pq` as a diameter?
//! - [`circumsphere_containment`], the Delaunay test used by the triangulator.
//!
//! Both classify into [`InSphere`] with a relative tolerance, so a point lying
//! on the sphere up to floating-point noise is reported as
//! [`InSphere::BOUNDARY`] rather than flipping between inside and outside.

use crate::geometry::util::{Circumsphere, squared_distance};

/// Relative tolerance for [`InSphere::BOUNDARY`] classification.
///
/// Applied to squared-distance quantities, scaled by the magnitude of the
/// quantities being compared.
pub const BOUNDARY_RELATIVE_TOLERANCE: f64 = 1e-10;

/// Represents the position of a point relative to a hypersphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InSphere {
    /// The point is outside the sphere
    OUTSIDE,
    /// The point is on the sphere (within numerical tolerance)
    BOUNDARY,
    /// The point is strictly inside the sphere
    INSIDE,
}

impl std::fmt::Display for InSphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OUTSIDE => write!(f, "OUTSIDE"),
            Self::BOUNDARY => write!(f, "BOUNDARY"),
            Self::INSIDE => write!(f, "INSIDE"),
        }
    }
}

#[inline]
fn classify(signed: f64, scale: f64) -> InSphere {
    let tolerance = BOUNDARY_RELATIVE_TOLERANCE * scale;
    if signed < -tolerance {
        InSphere::INSIDE
    } else if signed > tolerance {
        InSphere::OUTSIDE
    } else {
        InSphere::BOUNDARY
    }
}

/// Locates `r` relative to the hypersphere having segment `pq` as a diameter.
///
/// With `c = (p + q) / 2` and `ρ = |p - q| / 2`, the signed power of `r` is
///
/// ```text
/// |r - c|² - ρ² = (r - p) · (r - q)
/// ```
///
/// (Thales' theorem), which is what is evaluated here: it needs neither the
/// midpoint nor a square root, so points on the sphere of axis-aligned or
/// lattice configurations evaluate to exactly zero.
///
/// # Arguments
///
/// * `p`, `q` - Endpoints of the diameter
/// * `r` - The point to test
///
/// # Examples
///
/// ```
/// use empty_space::geometry::predicates::{InSphere, diametral_sphere_containment};
///
/// // Unit square: the opposite corners lie exactly on the diagonal's sphere.
/// assert_eq!(
///     diametral_sphere_containment(&[0.0, 0.0], &[1.0, 1.0], &[1.0, 0.0]),
///     InSphere::BOUNDARY
/// );
/// assert_eq!(
///     diametral_sphere_containment(&[0.0, 0.0], &[1.0, 1.0], &[0.6, 0.4]),
///     InSphere::INSIDE
/// );
/// assert_eq!(
///     diametral_sphere_containment(&[0.0, 0.0], &[1.0, 0.0], &[0.5, 0.9]),
///     InSphere::OUTSIDE
/// );
/// ```
#[must_use]
pub fn diametral_sphere_containment(p: &[f64], q: &[f64], r: &[f64]) -> InSphere {
    let mut power = 0.0;
    let mut rp2 = 0.0;
    let mut rq2 = 0.0;
    for ((&pi, &qi), &ri) in p.iter().zip(q).zip(r) {
        let a = ri - pi;
        let b = ri - qi;
        power = a.mul_add(b, power);
        rp2 = a.mul_add(a, rp2);
        rq2 = b.mul_add(b, rq2);
    }
    // |(r-p)·(r-q)| <= (|r-p|² + |r-q|²) / 2
    classify(power, 0.5 * (rp2 + rq2))
}

/// Locates `r` relative to a precomputed circumsphere.
///
/// # Examples
///
/// ```
/// use empty_space::geometry::predicates::{InSphere, circumsphere_containment};
/// use empty_space::geometry::util::circumsphere;
///
/// let sphere = circumsphere(&[&[0.0, 0.0][..], &[2.0, 0.0][..], &[0.0, 2.0][..]]).unwrap();
/// assert_eq!(circumsphere_containment(&sphere, &[1.0, 1.0]), InSphere::INSIDE);
/// assert_eq!(circumsphere_containment(&sphere, &[2.0, 2.0]), InSphere::BOUNDARY);
/// assert_eq!(circumsphere_containment(&sphere, &[5.0, 5.0]), InSphere::OUTSIDE);
/// ```
#[must_use]
pub fn circumsphere_containment(sphere: &Circumsphere, r: &[f64]) -> InSphere {
    let d2 = squared_distance(&sphere.center, r);
    classify(d2 - sphere.radius_squared, sphere.radius_squared.max(d2))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::util::{circumsphere, euclidean_distance, midpoint};

    // =============================================================================
    // DIAMETRAL SPHERE (GABRIEL) TESTS
    // =============================================================================

    #[test]
    fn test_diametral_boundary_points_in_both_directions() {
        let p = [0.0, 0.0];
        let q = [2.0, 0.0];
        // On the circle of radius 1 around (1, 0).
        assert_eq!(
            diametral_sphere_containment(&p, &q, &[1.0, 1.0]),
            InSphere::BOUNDARY
        );
        // Just inside and just outside, well beyond the tolerance.
        assert_eq!(
            diametral_sphere_containment(&p, &q, &[1.0, 1.0 - 1e-6]),
            InSphere::INSIDE
        );
        assert_eq!(
            diametral_sphere_containment(&p, &q, &[1.0, 1.0 + 1e-6]),
            InSphere::OUTSIDE
        );
    }

    #[test]
    fn test_diametral_endpoints_are_on_the_sphere() {
        let p = [0.3, -1.0, 2.5];
        let q = [1.1, 4.0, -0.5];
        assert_eq!(diametral_sphere_containment(&p, &q, &p), InSphere::BOUNDARY);
        assert_eq!(diametral_sphere_containment(&p, &q, &q), InSphere::BOUNDARY);
    }

    #[test]
    fn test_diametral_matches_center_radius_formulation() {
        let p = [0.25, -3.0, 1.0];
        let q = [2.0, 1.5, -0.75];
        let center = midpoint(&p, &q);
        let radius = euclidean_distance(&p, &q) / 2.0;

        let samples: [[f64; 3]; 4] = [
            [1.0, -0.5, 0.0],
            [5.0, 5.0, 5.0],
            [0.3, -2.9, 1.0],
            [-4.0, 0.0, 0.0],
        ];
        for r in samples {
            let expected = if euclidean_distance(&center, &r) < radius {
                InSphere::INSIDE
            } else {
                InSphere::OUTSIDE
            };
            assert_eq!(diametral_sphere_containment(&p, &q, &r), expected, "sample {r:?}");
        }
    }

    // =============================================================================
    // CIRCUMSPHERE TESTS
    // =============================================================================

    #[test]
    fn test_circumsphere_containment_classification() {
        let sphere = circumsphere(&[&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0]])
            .unwrap();
        assert_eq!(
            circumsphere_containment(&sphere, &[0.25, 0.25, 0.25]),
            InSphere::INSIDE
        );
        assert_eq!(
            circumsphere_containment(&sphere, &[1.0, 1.0, 0.0]),
            InSphere::BOUNDARY
        );
        assert_eq!(
            circumsphere_containment(&sphere, &[2.0, 2.0, 2.0]),
            InSphere::OUTSIDE
        );
    }

    #[test]
    fn test_in_sphere_display() {
        assert_eq!(InSphere::INSIDE.to_string(), "INSIDE");
        assert_eq!(InSphere::BOUNDARY.to_string(), "BOUNDARY");
        assert_eq!(InSphere::OUTSIDE.to_string(), "OUTSIDE");
    }
}
