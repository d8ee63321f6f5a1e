//! In-memory proximity graph over a point set.
//!
//! [`PointGraph`] owns the points of one analysis run and an arena of
//! undirected [`Edge`]s. Every point keeps the list of arena indices of its
//! incident edges, so adjacency is symmetric by construction.
//!
//! # Invariants
//!
//! - no edge joins a point to itself
//! - for any unordered pair `{p, q}` at most one edge exists
//! - edges are never re-added once removed
//!
//! Removal is only available to the pruner, which applies it as the sweep
//! half of a mark-then-sweep pass.

use crate::core::collections::{FastHashSet, INLINE_CAPACITY, SmallBuffer};
use crate::core::edge::{Edge, EdgeId, EdgeKey};
use crate::geometry::point::Point;
use crate::geometry::util::{euclidean_distance, midpoint};

type Incidence = SmallBuffer<EdgeId, INLINE_CAPACITY>;

/// Points and their adjacency for one analysis run.
///
/// # Examples
///
/// ```rust
/// use empty_space::core::graph::PointGraph;
/// use empty_space::geometry::point::Point;
///
/// let (points, dim) = Point::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
/// let mut graph = PointGraph::new(points, dim);
///
/// assert!(graph.add_edge(0, 1).is_some());
/// assert!(graph.add_edge(1, 0).is_none()); // duplicate
/// assert!(graph.add_edge(2, 2).is_none()); // self-loop
/// assert_eq!(graph.edge_count(), 1);
/// assert!(graph.has_edge(1, 0));
/// ```
#[derive(Clone, Debug)]
pub struct PointGraph {
    points: Vec<Point>,
    dimension: usize,
    edges: Vec<Edge>,
    incident: Vec<Incidence>,
    retired: FastHashSet<EdgeKey>,
    live_edges: usize,
}

impl PointGraph {
    /// Creates a graph with the given points and no edges.
    ///
    /// The caller guarantees that every point has `dimension` coordinates and
    /// that point ids equal their positions (see [`Point::from_rows`]).
    #[must_use]
    pub fn new(points: Vec<Point>, dimension: usize) -> Self {
        debug_assert!(points.iter().enumerate().all(|(i, p)| p.id() == i));
        debug_assert!(points.iter().all(|p| p.dim() == dimension));
        let incident = vec![Incidence::new(); points.len()];
        Self {
            points,
            dimension,
            edges: Vec::new(),
            incident,
            retired: FastHashSet::default(),
            live_edges: 0,
        }
    }

    /// Number of points.
    #[inline]
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Dimension of every point.
    #[inline]
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// All points, in id order.
    #[inline]
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The point with the given id.
    #[inline]
    #[must_use]
    pub fn point(&self, id: usize) -> Option<&Point> {
        self.points.get(id)
    }

    /// Number of edges currently in the graph.
    #[inline]
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.live_edges
    }

    /// Number of edges ever added, including removed ones.
    #[inline]
    #[must_use]
    pub fn arena_len(&self) -> usize {
        self.edges.len()
    }

    /// The arena record for `id`.
    #[inline]
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0)
    }

    /// Iterates the live edges in arena order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, EdgeKey)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_valid())
            .map(|(i, e)| (EdgeId(i), e.key()))
    }

    /// Returns `true` if a live edge joins `a` and `b`.
    #[must_use]
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.find_edge(a, b).is_some()
    }

    /// Looks up the live edge joining `a` and `b`.
    #[must_use]
    pub fn find_edge(&self, a: usize, b: usize) -> Option<EdgeId> {
        let (Some(ia), Some(ib)) = (self.incident.get(a), self.incident.get(b)) else {
            return None;
        };
        // Either endpoint's list is authoritative; scan the shorter one.
        let (list, owner) = if ia.len() <= ib.len() { (ia, a) } else { (ib, b) };
        let target = if owner == a { b } else { a };
        list.iter()
            .copied()
            .find(|&id| self.edges[id.0].key().other(owner) == Some(target))
    }

    /// Adds an edge between `a` and `b`.
    ///
    /// # Returns
    ///
    /// The new edge's id, or `None` if `a == b`, either id is out of range,
    /// the pair is already connected, or an edge between the pair was removed
    /// earlier.
    pub fn add_edge(&mut self, a: usize, b: usize) -> Option<EdgeId> {
        if a == b || a >= self.points.len() || b >= self.points.len() || self.has_edge(a, b) {
            return None;
        }
        let key = EdgeKey::new(a, b);
        if self.retired.contains(&key) {
            return None;
        }
        let id = EdgeId(self.edges.len());
        self.edges.push(Edge::new(key));
        self.incident[a].push(id);
        self.incident[b].push(id);
        self.live_edges += 1;
        Some(id)
    }

    /// Ids of the points adjacent to `point`.
    pub fn neighbors(&self, point: usize) -> impl Iterator<Item = usize> + '_ {
        self.incident
            .get(point)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.edges[id.0].key().other(point))
    }

    /// Number of live edges incident to `point`.
    #[must_use]
    pub fn degree(&self, point: usize) -> usize {
        self.incident.get(point).map_or(0, Incidence::len)
    }

    /// Coordinates of both endpoints of `key`.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint is not a point of this graph.
    #[must_use]
    pub fn endpoint_coords(&self, key: EdgeKey) -> (&[f64], &[f64]) {
        (
            self.points[key.v0()].coords(),
            self.points[key.v1()].coords(),
        )
    }

    /// Euclidean length of the edge `key`.
    #[must_use]
    pub fn edge_length(&self, key: EdgeKey) -> f64 {
        let (p, q) = self.endpoint_coords(key);
        euclidean_distance(p, q)
    }

    /// Midpoint of the edge `key`.
    #[must_use]
    pub fn edge_midpoint(&self, key: EdgeKey) -> Vec<f64> {
        let (p, q) = self.endpoint_coords(key);
        midpoint(p, q)
    }

    /// Removes every listed edge. Ids that are already removed are ignored.
    ///
    /// Returns the number of edges actually removed.
    pub(crate) fn remove_edges(&mut self, ids: &[EdgeId]) -> usize {
        let mut removed = 0;
        for &id in ids {
            let Some(edge) = self.edges.get_mut(id.0) else {
                continue;
            };
            if !edge.is_valid() {
                continue;
            }
            edge.invalidate();
            let key = edge.key();
            self.retired.insert(key);
            let (a, b) = key.endpoints();
            self.incident[a].retain(|e| *e != id);
            self.incident[b].retain(|e| *e != id);
            removed += 1;
        }
        self.live_edges -= removed;
        removed
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_graph() -> PointGraph {
        let (points, dim) = Point::from_rows(&[[0.0, 0.0], [3.0, 0.0], [0.0, 4.0]]).unwrap();
        let mut graph = PointGraph::new(points, dim);
        graph.add_edge(0, 1).unwrap();
        graph.add_edge(1, 2).unwrap();
        graph.add_edge(2, 0).unwrap();
        graph
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let graph = triangle_graph();
        for p in 0..graph.point_count() {
            for q in graph.neighbors(p) {
                assert!(graph.neighbors(q).any(|r| r == p), "{p} -> {q} not mirrored");
            }
            assert_eq!(graph.degree(p), 2);
        }
    }

    #[test]
    fn test_add_edge_rejects_duplicates_loops_and_out_of_range() {
        let mut graph = triangle_graph();
        assert!(graph.add_edge(0, 1).is_none());
        assert!(graph.add_edge(1, 0).is_none());
        assert!(graph.add_edge(1, 1).is_none());
        assert!(graph.add_edge(0, 3).is_none());
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.arena_len(), 3);
    }

    #[test]
    fn test_edge_geometry_helpers() {
        let graph = triangle_graph();
        let hyp = EdgeKey::new(1, 2);
        assert!((graph.edge_length(hyp) - 5.0).abs() < 1e-12);
        assert_eq!(graph.edge_midpoint(hyp), vec![1.5, 2.0]);
    }

    #[test]
    fn test_removed_edges_stay_removed() {
        let mut graph = triangle_graph();
        let id = graph.find_edge(2, 1).unwrap();

        assert_eq!(graph.remove_edges(&[id, id]), 1);
        assert_eq!(graph.edge_count(), 2);
        assert!(!graph.has_edge(1, 2));
        assert!(!graph.edge(id).unwrap().is_valid());
        assert_eq!(graph.edges().count(), 2);
        assert_eq!(graph.degree(1), 1);

        // Removing again is a no-op, and the pair cannot be reconnected.
        assert_eq!(graph.remove_edges(&[id]), 0);
        assert!(graph.add_edge(1, 2).is_none());
        assert_eq!(graph.edge_count(), 2);
    }
}
