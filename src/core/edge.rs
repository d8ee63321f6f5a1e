//! Canonical edge identifiers and the edge arena record.
//!
//! A [`PointGraph`](crate::core::graph::PointGraph) stores each undirected
//! edge exactly once, in an arena indexed by [`EdgeId`]. The unordered
//! endpoint pair is captured by an [`EdgeKey`] that:
//!
//! - identifies an edge purely by its two endpoint point ids
//! - canonicalizes endpoint ordering so `(a, b)` and `(b, a)` map to the same edge
//! - is `Copy`/`Hash`/`Ord` for fast use in sets and maps
//!
//! Point ids are stable input indices, so `EdgeKey` ordering is deterministic
//! across runs.

use serde::{Deserialize, Serialize};

/// Canonical identifier for an (undirected) edge.
///
/// # Examples
///
/// ```rust
/// use empty_space::core::edge::EdgeKey;
///
/// let e1 = EdgeKey::new(7, 2);
/// let e2 = EdgeKey::new(2, 7);
/// assert_eq!(e1, e2);
/// assert_eq!(e1.endpoints(), (2, 7));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    v0: usize,
    v1: usize,
}

impl EdgeKey {
    /// Creates a new canonical edge key with `v0 <= v1`.
    #[must_use]
    pub const fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Self { v0: a, v1: b }
        } else {
            Self { v0: b, v1: a }
        }
    }

    /// Returns the smaller endpoint id.
    #[inline]
    #[must_use]
    pub const fn v0(self) -> usize {
        self.v0
    }

    /// Returns the larger endpoint id.
    #[inline]
    #[must_use]
    pub const fn v1(self) -> usize {
        self.v1
    }

    /// Returns the two endpoints as a tuple.
    #[inline]
    #[must_use]
    pub const fn endpoints(self) -> (usize, usize) {
        (self.v0, self.v1)
    }

    /// Returns `true` if both endpoints are the same point.
    #[inline]
    #[must_use]
    pub const fn is_loop(self) -> bool {
        self.v0 == self.v1
    }

    /// Returns `true` if `point` is one of the endpoints.
    #[inline]
    #[must_use]
    pub const fn touches(self, point: usize) -> bool {
        self.v0 == point || self.v1 == point
    }

    /// Returns the endpoint opposite `point`, if `point` is an endpoint.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use empty_space::core::edge::EdgeKey;
    ///
    /// let e = EdgeKey::new(4, 9);
    /// assert_eq!(e.other(4), Some(9));
    /// assert_eq!(e.other(9), Some(4));
    /// assert_eq!(e.other(1), None);
    /// ```
    #[inline]
    #[must_use]
    pub const fn other(self, point: usize) -> Option<usize> {
        if self.v0 == point {
            Some(self.v1)
        } else if self.v1 == point {
            Some(self.v0)
        } else {
            None
        }
    }
}

impl From<(usize, usize)> for EdgeKey {
    #[inline]
    fn from((a, b): (usize, usize)) -> Self {
        Self::new(a, b)
    }
}

/// Index of an edge in a graph's edge arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) usize);

impl EdgeId {
    /// Position in the arena.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// An edge record in the arena.
///
/// `valid` starts `true` and is cleared exactly once, when the edge is swept
/// by the pruner; cleared edges are never revived.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    key: EdgeKey,
    valid: bool,
}

impl Edge {
    pub(crate) const fn new(key: EdgeKey) -> Self {
        Self { key, valid: true }
    }

    /// The endpoints of this edge.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> EdgeKey {
        self.key
    }

    /// Whether the edge is still part of the graph.
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    pub(crate) const fn invalidate(&mut self) {
        self.valid = false;
    }
}
