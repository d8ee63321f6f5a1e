//! Gabriel pruning: mark every edge, then sweep the invalid ones.
//!
//! An edge `(p, q)` is a Gabriel edge iff no other point lies strictly inside
//! the hypersphere with `pq` as a diameter. Points on the sphere (within
//! [`BOUNDARY_RELATIVE_TOLERANCE`](crate::geometry::predicates::BOUNDARY_RELATIVE_TOLERANCE))
//! do not invalidate the edge.
//!
//! Pruning is split into two phases so that the result does not depend on
//! evaluation order:
//!
//! 1. **Mark**: every live edge is tested against the full point set and the
//!    verdict written into its own slot. Tests only read the graph, so they
//!    run in parallel with `rayon`.
//! 2. **Sweep**: once all verdicts exist, every edge marked invalid is
//!    removed.
//!
//! [`GabrielPruner::steps`] exposes the mark phase one edge at a time.

use crate::core::edge::{EdgeId, EdgeKey};
use crate::core::graph::PointGraph;
use crate::geometry::predicates::{InSphere, diametral_sphere_containment};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of testing one edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeVerdict {
    /// No other point lies strictly inside the diametral sphere.
    Valid,
    /// `witness` lies strictly inside the diametral sphere.
    Invalid {
        /// Lowest id among the points inside the sphere.
        witness: usize,
    },
}

impl EdgeVerdict {
    /// Returns `true` for [`EdgeVerdict::Valid`].
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Counts reported by [`GabrielPruner::prune`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneSummary {
    /// Edges tested.
    pub evaluated: usize,
    /// Edges removed.
    pub removed: usize,
    /// Edges remaining after the sweep.
    pub retained: usize,
}

/// Removes non-Gabriel edges from a [`PointGraph`].
///
/// # Examples
///
/// ```rust
/// use empty_space::core::builder::GabrielBuilder;
/// use empty_space::core::pruning::GabrielPruner;
///
/// // A point just above the middle of the base of an obtuse triangle.
/// let rows = [[0.0, 0.0], [4.0, 0.0], [2.0, 0.5]];
/// let mut graph = GabrielBuilder::new().skeleton(&rows).unwrap();
/// assert_eq!(graph.edge_count(), 3);
///
/// let summary = GabrielPruner::default().prune(&mut graph);
/// assert_eq!(summary.removed, 1);
/// assert!(!graph.has_edge(0, 1));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GabrielPruner {
    parallel: bool,
}

impl Default for GabrielPruner {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl GabrielPruner {
    /// A pruner that evaluates edges on the calling thread only.
    #[must_use]
    pub const fn sequential() -> Self {
        Self { parallel: false }
    }

    /// Whether the mark phase runs on the rayon pool.
    #[must_use]
    pub const fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Tests `key` against every point of `graph` other than its endpoints.
    #[must_use]
    pub fn evaluate(graph: &PointGraph, key: EdgeKey) -> EdgeVerdict {
        let (p, q) = graph.endpoint_coords(key);
        graph
            .points()
            .iter()
            .filter(|r| !key.touches(r.id()))
            .find(|r| diametral_sphere_containment(p, q, r.coords()) == InSphere::INSIDE)
            .map_or(EdgeVerdict::Valid, |r| EdgeVerdict::Invalid { witness: r.id() })
    }

    /// Mark phase: the verdict for every live edge, in arena order.
    #[must_use]
    pub fn mark(&self, graph: &PointGraph) -> Vec<(EdgeId, EdgeVerdict)> {
        let edges: Vec<(EdgeId, EdgeKey)> = graph.edges().collect();
        if self.parallel {
            edges
                .par_iter()
                .map(|&(id, key)| (id, Self::evaluate(graph, key)))
                .collect()
        } else {
            edges
                .iter()
                .map(|&(id, key)| (id, Self::evaluate(graph, key)))
                .collect()
        }
    }

    /// Marks every edge, then removes those marked invalid.
    pub fn prune(&self, graph: &mut PointGraph) -> PruneSummary {
        let verdicts = self.mark(graph);
        let invalid: Vec<EdgeId> = verdicts
            .iter()
            .filter(|(_, verdict)| !verdict.is_valid())
            .map(|&(id, _)| id)
            .collect();
        let removed = graph.remove_edges(&invalid);
        tracing::debug!(
            "[gabriel] mark: {} edges, {} invalid; sweep removed {removed}",
            verdicts.len(),
            invalid.len()
        );
        PruneSummary {
            evaluated: verdicts.len(),
            removed,
            retained: graph.edge_count(),
        }
    }

    /// Iterates the verdicts one edge at a time, in arena order.
    ///
    /// The graph is borrowed immutably, so nothing is removed while stepping.
    /// Collect the steps and pass them to [`GabrielPruner::apply`] to sweep.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use empty_space::core::builder::GabrielBuilder;
    /// use empty_space::core::pruning::GabrielPruner;
    ///
    /// let rows = [[0.0, 0.0], [4.0, 0.0], [2.0, 0.5]];
    /// let mut graph = GabrielBuilder::new().skeleton(&rows).unwrap();
    ///
    /// let steps: Vec<_> = GabrielPruner::steps(&graph).collect();
    /// assert_eq!(steps.iter().filter(|(_, v)| !v.is_valid()).count(), 1);
    ///
    /// assert_eq!(GabrielPruner::apply(&mut graph, steps), 1);
    /// assert_eq!(graph.edge_count(), 2);
    /// ```
    #[must_use]
    pub fn steps(graph: &PointGraph) -> PruneSteps<'_> {
        PruneSteps {
            graph,
            next: 0,
        }
    }

    /// Sweep phase for verdicts gathered with [`GabrielPruner::steps`].
    ///
    /// Returns the number of edges removed. Verdicts for edges that no longer
    /// exist are ignored.
    pub fn apply<I>(graph: &mut PointGraph, verdicts: I) -> usize
    where
        I: IntoIterator<Item = (EdgeKey, EdgeVerdict)>,
    {
        let invalid: Vec<EdgeId> = verdicts
            .into_iter()
            .filter(|(_, verdict)| !verdict.is_valid())
            .filter_map(|(key, _)| graph.find_edge(key.v0(), key.v1()))
            .collect();
        graph.remove_edges(&invalid)
    }
}

/// Stepwise mark phase returned by [`GabrielPruner::steps`].
#[derive(Clone, Debug)]
pub struct PruneSteps<'g> {
    graph: &'g PointGraph,
    next: usize,
}

impl Iterator for PruneSteps<'_> {
    type Item = (EdgeKey, EdgeVerdict);

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.graph.arena_len() {
            let id = EdgeId(self.next);
            self.next += 1;
            if let Some(edge) = self.graph.edge(id).filter(|e| e.is_valid()) {
                let key = edge.key();
                return Some((key, GabrielPruner::evaluate(self.graph, key)));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.graph.arena_len() - self.next))
    }
}

// =============================================================================
// TESTS
// =============================================================================
