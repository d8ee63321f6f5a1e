//! Gap candidates along Gabriel edges and their statistical filter.
//!
//! Every surviving edge of a Gabriel graph spans an empty diametral ball, so
//! its midpoint is a point of empty space and its length measures how much
//! room there is. [`GapDetector`] projects the edge set to
//! [`GapCandidate`]s; [`GapFilter`] keeps only the unusually long ones.

use crate::core::graph::PointGraph;
use serde::{Deserialize, Serialize};

/// Midpoint and length of one Gabriel edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GapCandidate {
    /// Edge midpoint.
    pub midpoint: Vec<f64>,
    /// Edge length.
    pub length: f64,
}

/// Emits one [`GapCandidate`] per live edge, in edge-arena order.
#[derive(Clone, Copy, Debug, Default)]
pub struct GapDetector;

impl GapDetector {
    /// Projects the edges of `graph` to gap candidates.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use empty_space::core::builder::build_gabriel_graph;
    /// use empty_space::core::gaps::GapDetector;
    ///
    /// let graph = build_gabriel_graph(&[[0.0, 0.0], [2.0, 0.0], [0.0, 2.0]]).unwrap();
    /// let gaps = GapDetector::detect(&graph);
    /// assert_eq!(gaps.len(), graph.edge_count());
    /// assert!(gaps.iter().any(|g| g.midpoint == vec![1.0, 1.0]));
    /// ```
    #[must_use]
    pub fn detect(graph: &PointGraph) -> Vec<GapCandidate> {
        graph
            .edges()
            .map(|(_, key)| GapCandidate {
                midpoint: graph.edge_midpoint(key),
                length: graph.edge_length(key),
            })
            .collect()
    }
}

/// Summary of one filter pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GapStatistics {
    /// Mean candidate length.
    pub mean: f64,
    /// Population standard deviation of candidate lengths.
    pub std: f64,
    /// `mean + multiplier * std`; kept candidates are strictly longer.
    pub threshold: f64,
    /// Candidates kept.
    pub kept: usize,
    /// Candidates seen.
    pub total: usize,
}

/// Keeps candidates whose length exceeds `mean + std_multiplier * std`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GapFilter {
    std_multiplier: f64,
}

impl Default for GapFilter {
    fn default() -> Self {
        Self {
            std_multiplier: 1.0,
        }
    }
}

impl GapFilter {
    /// Creates a filter with the given standard-deviation multiplier.
    #[must_use]
    pub const fn new(std_multiplier: f64) -> Self {
        Self { std_multiplier }
    }

    /// The standard-deviation multiplier.
    #[must_use]
    pub const fn std_multiplier(&self) -> f64 {
        self.std_multiplier
    }

    /// Filters `candidates`, preserving their order.
    ///
    /// An empty input yields an empty output with zeroed statistics. When all
    /// lengths are equal nothing is strictly above the mean, so nothing is
    /// kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use empty_space::core::gaps::{GapCandidate, GapFilter};
    ///
    /// let gap = |length| GapCandidate { midpoint: vec![0.0], length };
    /// let (kept, stats) = GapFilter::default().filter(vec![gap(1.0), gap(1.0), gap(1.0), gap(5.0)]);
    ///
    /// assert_eq!(stats.mean, 2.0);
    /// assert_eq!(kept.len(), 1);
    /// assert_eq!(kept[0].length, 5.0);
    /// ```
    #[must_use]
    pub fn filter(&self, candidates: Vec<GapCandidate>) -> (Vec<GapCandidate>, GapStatistics) {
        let total = candidates.len();
        if total == 0 {
            return (candidates, GapStatistics::default());
        }

        #[expect(
            clippy::cast_precision_loss,
            reason = "candidate counts are far below 2^52"
        )]
        let n = total as f64;
        let mean = candidates.iter().map(|c| c.length).sum::<f64>() / n;
        let variance = candidates
            .iter()
            .map(|c| (c.length - mean).powi(2))
            .sum::<f64>()
            / n;
        let std = variance.sqrt();
        let threshold = self.std_multiplier.mul_add(std, mean);

        let kept: Vec<GapCandidate> = candidates
            .into_iter()
            .filter(|c| c.length > threshold)
            .collect();
        let stats = GapStatistics {
            mean,
            std,
            threshold,
            kept: kept.len(),
            total,
        };
        tracing::debug!(
            "[gaps] mean={mean:.6} std={std:.6} threshold={threshold:.6}: kept {} of {total}",
            kept.len()
        );
        (kept, stats)
    }
}

// =============================================================================
// TESTS
// =============================================================================
