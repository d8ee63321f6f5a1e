//! # empty-space
//!
//! Locate the empty regions of an n-dimensional point cloud.
//!
//! The analysis builds a [Gabriel graph](https://en.wikipedia.org/wiki/Gabriel_graph)
//! over the data, treats the midpoint of every Gabriel edge as a candidate
//! location of empty space, keeps the unusually long edges, and clusters their
//! midpoints into a handful of *ghost points*. Ghost points and data can then
//! be embedded together into a low-dimensional space for inspection.
//!
//! # Pipeline
//!
//! | Stage | Type |
//! |---|---|
//! | triangulate, connect simplex vertices | [`GabrielBuilder`](core::builder::GabrielBuilder) |
//! | drop edges whose diametral sphere holds a point | [`GabrielPruner`](core::pruning::GabrielPruner) |
//! | edge midpoints and lengths | [`GapDetector`](core::gaps::GapDetector) |
//! | keep lengths above `mean + std` | [`GapFilter`](core::gaps::GapFilter) |
//! | k-means over a range of `k`, best silhouette | [`ClusterSelector`](analysis::selection::ClusterSelector) |
//! | metric MDS of data and ghosts together | [`joint_embed`](analysis::embedding::joint_embed) |
//!
//! # Basic Usage
//!
//! ```rust
//! use empty_space::prelude::*;
//!
//! // Two slabs of points with a corridor between them.
//! let mut rows = Vec::new();
//! for y in 0..12 {
//!     for x in [0.0, 1.0, 10.0, 11.0] {
//!         rows.push([x, f64::from(y)]);
//!     }
//! }
//!
//! let graph = build_gabriel_graph(&rows).unwrap();
//! let ghosts = find_empty_space(&graph, 6).unwrap();
//! assert!(ghosts.iter().all(|g| g.coordinates[0] > 1.0 && g.coordinates[0] < 10.0));
//!
//! let joint = joint_embed(&rows, &ghosts, 2).unwrap();
//! assert_eq!(joint.points.len(), rows.len());
//! assert_eq!(joint.ghost_points.len(), ghosts.len());
//! ```
//!
//! The whole pipeline is also available in one call through
//! [`EmptySpace::analyze`](analysis::empty_space::EmptySpace::analyze).
//!
//! # Determinism
//!
//! Clustering and embedding draw from seeded [`StdRng`](rand::rngs::StdRng)s;
//! equal seeds on equal input give equal output. Parallel stages write only
//! their own result slots and are combined in a fixed order afterwards.
//!
//! # Logging
//!
//! Progress is reported through [`tracing`] at `debug` level, oddities at
//! `warn`. The crate never installs a subscriber.

#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// Graph data structures and the Gabriel construction.
pub mod core {
    /// Triangulation skeleton and Gabriel graph construction
    pub mod builder;
    /// Hash and small-vector aliases
    pub mod collections;
    pub mod edge;
    /// Gap candidates and the significance filter
    pub mod gaps;
    pub mod graph;
    /// Mark-then-sweep pruning of non-Gabriel edges
    pub mod pruning;
    /// Triangulator capability and the built-in Bowyer–Watson
    pub mod triangulation;

    pub use builder::*;
    pub use edge::*;
    pub use gaps::*;
    pub use graph::*;
    pub use pruning::*;
    pub use triangulation::*;
    // collections stays namespaced; the prelude re-exports the common aliases.
}

/// Points, distance utilities and sphere predicates.
pub mod geometry {
    pub mod point;
    pub mod predicates;
    /// Distances, midpoints and circumspheres
    pub mod util;

    pub use point::*;
    pub use predicates::*;
    pub use util::*;
}

/// Clustering, model selection and embedding of gap candidates.
pub mod analysis {
    pub mod clustering;
    /// Full pipeline and its configuration
    pub mod empty_space;
    pub mod embedding;
    pub mod selection;
    pub mod silhouette;

    pub use clustering::*;
    pub use embedding::*;
    pub use empty_space::*;
    pub use selection::*;
    pub use silhouette::*;
}

/// A prelude module that re-exports commonly used types and functions.
pub mod prelude {
    pub use crate::analysis::{
        clustering::*, embedding::*, empty_space::*, selection::*, silhouette::*,
    };
    pub use crate::core::collections::{
        FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
        fast_hash_set_with_capacity,
    };
    pub use crate::core::{builder::*, edge::*, gaps::*, graph::*, pruning::*, triangulation::*};
    pub use crate::geometry::{point::*, predicates::*, util::*};
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        analysis::{
            clustering::KMeans, embedding::Mds, empty_space::EmptySpaceReport,
            selection::GhostPoint,
        },
        core::{builder::GabrielBuilder, graph::PointGraph, pruning::GabrielPruner},
        geometry::point::Point,
        is_normal,
    };

    #[test]
    fn normal_types() {
        assert!(is_normal::<Point>());
        assert!(is_normal::<PointGraph>());
        assert!(is_normal::<GabrielBuilder>());
        assert!(is_normal::<GabrielPruner>());
        assert!(is_normal::<KMeans>());
        assert!(is_normal::<Mds>());
        assert!(is_normal::<GhostPoint>());
        assert!(is_normal::<EmptySpaceReport>());
    }

    #[test]
    fn test_prelude_exports() {
        use crate::prelude::*;

        let mut set: FastHashSet<EdgeKey> = FastHashSet::default();
        set.insert(EdgeKey::new(1, 0));
        assert!(set.contains(&EdgeKey::new(0, 1)));

        let graph = build_gabriel_graph(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(
            diametral_sphere_containment(&[0.0, 0.0], &[2.0, 0.0], &[1.0, 0.0]),
            InSphere::INSIDE
        );
    }
}
