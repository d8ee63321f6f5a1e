//! Vector norm and distance computations.

/// Sum of squares of a coordinate slice.
///
/// # Examples
///
/// ```
/// use empty_space::geometry::util::squared_norm;
///
/// assert_eq!(squared_norm(&[3.0, 4.0]), 25.0);
/// assert_eq!(squared_norm(&[1.0, 2.0, 2.0]), 9.0);
/// ```
#[inline]
#[must_use]
pub fn squared_norm(coords: &[f64]) -> f64 {
    coords.iter().fold(0.0, |acc, &x| x.mul_add(x, acc))
}

/// Squared Euclidean distance between two points of equal dimension.
///
/// Only the common prefix is compared if the lengths differ; callers
/// validate dimensions once up front (see [`crate::geometry::point::dimension_of`]).
///
/// # Examples
///
/// ```
/// use empty_space::geometry::util::squared_distance;
///
/// assert_eq!(squared_distance(&[0.0, 0.0], &[1.0, 1.0]), 2.0);
/// ```
#[inline]
#[must_use]
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).fold(0.0, |acc, (&x, &y)| {
        let diff = x - y;
        diff.mul_add(diff, acc)
    })
}

/// Euclidean distance between two points of equal dimension.
///
/// # Examples
///
/// ```
/// use empty_space::geometry::util::euclidean_distance;
///
/// assert_eq!(euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
/// assert_eq!(euclidean_distance(&[1.0, 1.0, 1.0, 1.0], &[0.0, 0.0, 0.0, 0.0]), 2.0);
/// ```
#[inline]
#[must_use]
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Component-wise average of two points.
///
/// # Examples
///
/// ```
/// use empty_space::geometry::util::midpoint;
///
/// assert_eq!(midpoint(&[0.0, 0.0], &[1.0, 3.0]), vec![0.5, 1.5]);
/// ```
#[must_use]
pub fn midpoint(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(&x, &y)| (x + y) / 2.0).collect()
}
