//! Data and operations on d-dimensional points.
//!
//! A [`Point`] pairs a stable integer id with its coordinates. The id is the
//! point's index in the input it was built from, so identity checks anywhere
//! in the crate are plain index comparisons.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating raw coordinate rows.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum PointError {
    /// No rows were supplied.
    #[error("Point set is empty")]
    EmptyInput,

    /// The first row has no coordinates.
    #[error("Points must have at least one coordinate")]
    ZeroDimension,

    /// A row's length differs from the first row's length.
    #[error("Point {index} has {actual} coordinates, expected {expected}")]
    InconsistentDimension {
        /// Index of the offending row.
        index: usize,
        /// Dimension established by the first row.
        expected: usize,
        /// Length of the offending row.
        actual: usize,
    },

    /// A coordinate is NaN or infinite.
    #[error("Point {index} has a non-finite coordinate {value} on axis {axis}")]
    NonFiniteCoordinate {
        /// Index of the offending row.
        index: usize,
        /// Axis of the offending coordinate.
        axis: usize,
        /// The coordinate value.
        value: f64,
    },
}

/// A point of the analysed data set.
///
/// Points are immutable once created.
///
/// # Examples
///
/// ```rust
/// use empty_space::geometry::point::Point;
///
/// let p = Point::new(3, vec![1.0, 2.0]);
/// assert_eq!(p.id(), 3);
/// assert_eq!(p.dim(), 2);
/// assert_eq!(p.coords(), &[1.0, 2.0]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    id: usize,
    coords: Vec<f64>,
}

impl Point {
    /// Creates a point with the given id and coordinates.
    #[must_use]
    pub const fn new(id: usize, coords: Vec<f64>) -> Self {
        Self { id, coords }
    }

    /// The point's id (its index in the input set).
    #[inline]
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// The point's coordinates.
    #[inline]
    #[must_use]
    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    /// The number of coordinates.
    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.coords.len()
    }

    /// Validates raw coordinate rows and converts them into points with ids
    /// `0..rows.len()`.
    ///
    /// # Returns
    ///
    /// The points together with their common dimension.
    ///
    /// # Errors
    ///
    /// - [`PointError::EmptyInput`] if `rows` is empty
    /// - [`PointError::ZeroDimension`] if the first row is empty
    /// - [`PointError::InconsistentDimension`] if row lengths differ
    /// - [`PointError::NonFiniteCoordinate`] if any coordinate is NaN or infinite
    ///
    /// # Examples
    ///
    /// ```rust
    /// use empty_space::geometry::point::{Point, PointError};
    ///
    /// let (points, dim) = Point::from_rows(&[[0.0, 0.0], [1.0, 0.5]]).unwrap();
    /// assert_eq!(dim, 2);
    /// assert_eq!(points[1].id(), 1);
    ///
    /// let bad = Point::from_rows(&[vec![0.0, 0.0], vec![1.0]]);
    /// assert!(matches!(bad, Err(PointError::InconsistentDimension { index: 1, .. })));
    /// ```
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<(Vec<Self>, usize), PointError> {
        let dim = dimension_of(rows)?;
        let points = rows
            .iter()
            .enumerate()
            .map(|(index, row)| Self::new(index, row.as_ref().to_vec()))
            .collect();
        Ok((points, dim))
    }
}

impl AsRef<[f64]> for Point {
    fn as_ref(&self) -> &[f64] {
        &self.coords
    }
}

/// Checks that `rows` is a non-empty, rectangular, finite coordinate table and
/// returns its dimension.
///
/// # Errors
///
/// See [`Point::from_rows`].
pub fn dimension_of<R: AsRef<[f64]>>(rows: &[R]) -> Result<usize, PointError> {
    let first = rows.first().ok_or(PointError::EmptyInput)?;
    let expected = first.as_ref().len();
    if expected == 0 {
        return Err(PointError::ZeroDimension);
    }

    for (index, row) in rows.iter().enumerate() {
        let row = row.as_ref();
        if row.len() != expected {
            return Err(PointError::InconsistentDimension {
                index,
                expected,
                actual: row.len(),
            });
        }
        if let Some((axis, &value)) = row.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(PointError::NonFiniteCoordinate { index, axis, value });
        }
    }

    Ok(expected)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_assigns_sequential_ids() {
        let rows = vec![vec![0.0, 1.0, 2.0], vec![3.0, 4.0, 5.0], vec![6.0, 7.0, 8.0]];
        let (points, dim) = Point::from_rows(&rows).unwrap();

        assert_eq!(dim, 3);
        for (i, p) in points.iter().enumerate() {
            assert_eq!(p.id(), i);
            assert_eq!(p.coords(), rows[i].as_slice());
        }
    }

    #[test]
    fn test_from_rows_rejects_empty_and_zero_dimension() {
        let empty: Vec<Vec<f64>> = Vec::new();
        assert_eq!(Point::from_rows(&empty), Err(PointError::EmptyInput));

        let zero_dim: Vec<Vec<f64>> = vec![vec![], vec![]];
        assert_eq!(Point::from_rows(&zero_dim), Err(PointError::ZeroDimension));
    }

    #[test]
    fn test_from_rows_rejects_non_finite_coordinates() {
        let rows = vec![vec![0.0, 0.0], vec![1.0, f64::NAN]];
        let err = Point::from_rows(&rows).unwrap_err();
        assert!(matches!(
            err,
            PointError::NonFiniteCoordinate {
                index: 1,
                axis: 1,
                ..
            }
        ));

        let rows = vec![vec![f64::INFINITY, 0.0]];
        assert!(matches!(
            Point::from_rows(&rows),
            Err(PointError::NonFiniteCoordinate { index: 0, axis: 0, .. })
        ));
    }

    #[test]
    fn test_error_messages_name_the_offending_row() {
        let err = PointError::InconsistentDimension {
            index: 4,
            expected: 2,
            actual: 3,
        };
        assert_eq!(err.to_string(), "Point 4 has 3 coordinates, expected 2");
    }
}
