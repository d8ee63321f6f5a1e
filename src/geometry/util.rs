//! Geometric utility functions for d-dimensional geometry calculations.
//!
//! This module contains distance and midpoint helpers used by the Gabriel
//! predicates and the gap detector, and the circumsphere computation used by
//! the Bowyer–Watson triangulator. Dimensions are runtime values: every
//! function takes coordinate slices of equal length.

mod circumsphere;
mod norms;

pub use circumsphere::{Circumsphere, CircumsphereError, SINGULARITY_TOLERANCE, circumsphere};
pub use norms::{euclidean_distance, midpoint, squared_distance, squared_norm};
