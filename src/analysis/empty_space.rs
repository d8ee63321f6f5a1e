//! End-to-end empty-space analysis.
//!
//! ```text
//! rows ─► Gabriel graph ─► gap candidates ─► significant gaps ─► ghost points ─► joint embedding
//! ```
//!
//! [`EmptySpace`] runs the whole pipeline from one [`EmptySpaceConfig`];
//! [`find_empty_space`] runs the middle stages on an existing graph.

use crate::analysis::clustering::KMeans;
use crate::analysis::embedding::{EmbeddingError, Mds, MdsInit, joint_embed_with};
use crate::analysis::selection::{ClusterSelectionError, ClusterSelector, GhostPoint, Selection};
use crate::analysis::silhouette::Silhouette;
use crate::core::builder::{GabrielGraphError, build_gabriel_graph};
use crate::core::gaps::{GapDetector, GapFilter, GapStatistics};
use crate::core::graph::PointGraph;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters of one analysis run.
///
/// Every random choice is derived from `seed`, so two runs with equal
/// configurations on equal data give equal reports.
///
/// # Examples
///
/// ```rust
/// use empty_space::analysis::empty_space::EmptySpaceConfig;
///
/// let config = EmptySpaceConfig::builder()
///     .max_clusters(6)
///     .seed(42)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_clusters, 6);
/// assert_eq!(config.target_dim, 2);
///
/// // Validation happens at build time.
/// assert!(EmptySpaceConfig::builder().target_dim(0).build().is_err());
/// ```
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"), derive(Deserialize))]
#[serde(try_from = "EmptySpaceConfigBuilder")]
pub struct EmptySpaceConfig {
    /// Exclusive upper bound of the cluster-count search; must be at least 3.
    #[builder(default = "10")]
    pub max_clusters: usize,
    /// Dimension of the joint embedding.
    #[builder(default = "2")]
    pub target_dim: usize,
    /// Gaps longer than `mean + gap_std_multiplier * std` are kept.
    #[builder(default = "1.0")]
    pub gap_std_multiplier: f64,
    /// Base seed for clustering and embedding.
    #[builder(default = "0")]
    pub seed: u64,
    /// Lloyd iterations per k-means restart.
    #[builder(default = "300")]
    pub kmeans_max_iter: usize,
    /// Number of k-means restarts.
    #[builder(default = "10")]
    pub kmeans_restarts: usize,
    /// Relative k-means convergence tolerance.
    #[builder(default = "1e-4")]
    pub kmeans_tolerance: f64,
    /// SMACOF iterations per restart.
    #[builder(default = "300")]
    pub mds_max_iter: usize,
    /// SMACOF convergence threshold on the normalized stress.
    #[builder(default = "1e-3")]
    pub mds_eps: f64,
    /// Number of SMACOF restarts.
    #[builder(default = "4")]
    pub mds_restarts: usize,
}

impl Default for EmptySpaceConfig {
    fn default() -> Self {
        Self {
            max_clusters: 10,
            target_dim: 2,
            gap_std_multiplier: 1.0,
            seed: 0,
            kmeans_max_iter: 300,
            kmeans_restarts: 10,
            kmeans_tolerance: 1e-4,
            mds_max_iter: 300,
            mds_eps: 1e-3,
            mds_restarts: 4,
        }
    }
}

impl EmptySpaceConfig {
    /// A builder seeded with the defaults.
    #[must_use]
    pub fn builder() -> EmptySpaceConfigBuilder {
        EmptySpaceConfigBuilder::default()
    }
}

/// Deserialization runs the builder, so missing fields take their defaults
/// and out-of-range values are rejected.
impl TryFrom<EmptySpaceConfigBuilder> for EmptySpaceConfig {
    type Error = EmptySpaceConfigBuilderError;

    fn try_from(builder: EmptySpaceConfigBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}

impl EmptySpaceConfigBuilder {
    // `max_clusters` is left to the selector, which reports it as a range error.
    fn validate(&self) -> Result<(), String> {
        if self.target_dim == Some(0) {
            return Err("target_dim must be at least 1".to_string());
        }
        if let Some(m) = self.gap_std_multiplier {
            if !(m.is_finite() && m >= 0.0) {
                return Err(format!(
                    "gap_std_multiplier must be finite and non-negative, got {m}"
                ));
            }
        }
        if self.kmeans_restarts == Some(0) || self.mds_restarts == Some(0) {
            return Err("restart counts must be at least 1".to_string());
        }
        for (name, value) in [
            ("kmeans_tolerance", self.kmeans_tolerance),
            ("mds_eps", self.mds_eps),
        ] {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(format!("{name} must be finite and positive, got {v}"));
                }
            }
        }
        Ok(())
    }
}

/// Errors raised by [`EmptySpace::analyze`].
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum EmptySpaceError {
    /// Graph construction failed.
    #[error(transparent)]
    Graph(#[from] GabrielGraphError),

    /// Ghost-point selection failed.
    #[error(transparent)]
    Selection(#[from] ClusterSelectionError),

    /// The joint embedding failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// Everything one analysis run produces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmptySpaceReport {
    /// Ghost points in the original space, in cluster-label order.
    pub ghost_points: Vec<GhostPoint>,
    /// Data points in the embedded space, in input order.
    pub embedded_points: Vec<Vec<f64>>,
    /// Ghost points in the embedded space, aligned with `ghost_points`.
    pub embedded_ghost_points: Vec<Vec<f64>>,
    /// Number of ghost points chosen.
    pub k: usize,
    /// Silhouette score of every cluster count tried.
    pub scores: Vec<(usize, f64)>,
    /// Statistics of the gap filter.
    pub gap_statistics: GapStatistics,
    /// Number of edges in the Gabriel graph.
    pub edge_count: usize,
}

/// The configured pipeline.
///
/// # Examples
///
/// ```rust
/// use empty_space::analysis::empty_space::{EmptySpace, EmptySpaceConfig};
///
/// // Two slabs of points, nine units apart.
/// let mut rows = Vec::new();
/// for y in 0..10 {
///     for x in [0.0, 1.0, 10.0, 11.0] {
///         rows.push([x, f64::from(y)]);
///     }
/// }
///
/// let report = EmptySpace::new(EmptySpaceConfig::default()).analyze(&rows).unwrap();
/// assert_eq!(report.embedded_points.len(), rows.len());
/// assert_eq!(report.embedded_ghost_points.len(), report.ghost_points.len());
/// // Every ghost point sits in the corridor between the slabs.
/// assert!(report.ghost_points.iter().all(|g| (g.coordinates[0] - 5.5).abs() < 1e-9));
/// assert_eq!(report.ghost_points.len(), report.k);
/// ```
#[derive(Clone, Debug, Default)]
pub struct EmptySpace {
    config: EmptySpaceConfig,
}

impl EmptySpace {
    /// Creates a pipeline from `config`.
    #[must_use]
    pub const fn new(config: EmptySpaceConfig) -> Self {
        Self { config }
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &EmptySpaceConfig {
        &self.config
    }

    fn selector(&self) -> ClusterSelector {
        let kmeans = KMeans {
            max_iter: self.config.kmeans_max_iter,
            restarts: self.config.kmeans_restarts,
            tolerance: self.config.kmeans_tolerance,
            seed: self.config.seed,
        };
        ClusterSelector::new(kmeans, Silhouette)
    }

    fn embedder(&self) -> Mds {
        Mds {
            max_iter: self.config.mds_max_iter,
            eps: self.config.mds_eps,
            restarts: self.config.mds_restarts,
            seed: self.config.seed,
            init: MdsInit::Random,
        }
    }

    /// Detects, filters and clusters the gaps of `graph`.
    ///
    /// # Errors
    ///
    /// Propagates [`ClusterSelectionError`] from the selector; see
    /// [`ClusterSelector::select`].
    pub fn select(&self, graph: &PointGraph) -> Result<(Selection, GapStatistics), ClusterSelectionError> {
        let candidates = GapDetector::detect(graph);
        let (significant, stats) = GapFilter::new(self.config.gap_std_multiplier).filter(candidates);
        let selection = self.selector().select(&significant, self.config.max_clusters)?;
        Ok((selection, stats))
    }

    /// Runs the whole pipeline on `rows`.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's error; no partial report is produced.
    pub fn analyze<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<EmptySpaceReport, EmptySpaceError> {
        let graph = build_gabriel_graph(rows)?;
        let (selection, gap_statistics) = self.select(&graph)?;
        let (embedded_points, embedded_ghost_points) = joint_embed_with(
            &self.embedder(),
            rows,
            &selection.ghost_points,
            self.config.target_dim,
        )?
        .into_parts();

        Ok(EmptySpaceReport {
            ghost_points: selection.ghost_points,
            embedded_points,
            embedded_ghost_points,
            k: selection.k,
            scores: selection.scores,
            gap_statistics,
            edge_count: graph.edge_count(),
        })
    }
}

/// Ghost points of `graph` with default parameters and the given bound.
///
/// # Errors
///
/// - [`ClusterSelectionError::InvalidClusterRange`] if `max_clusters < 3`
/// - [`ClusterSelectionError::ClusteringFailure`] if no significant gap
///   exists or a fit or score fails; every `k` in `[2, max_clusters)` is
///   fitted, so fewer than `max_clusters - 1` distinct gap midpoints fail
///   the whole search rather than narrowing it
pub fn find_empty_space(graph: &PointGraph, max_clusters: usize) -> Result<Vec<GhostPoint>, ClusterSelectionError> {
    let config = EmptySpaceConfig {
        max_clusters,
        ..EmptySpaceConfig::default()
    };
    EmptySpace::new(config)
        .select(graph)
        .map(|(selection, _)| selection.ghost_points)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_match_default() {
        assert_eq!(EmptySpaceConfig::builder().build().unwrap(), EmptySpaceConfig::default());
    }

    #[test]
    fn test_builder_validation() {
        assert!(EmptySpaceConfig::builder().target_dim(0).build().is_err());
        assert!(EmptySpaceConfig::builder().gap_std_multiplier(-1.0).build().is_err());
        assert!(EmptySpaceConfig::builder().gap_std_multiplier(f64::NAN).build().is_err());
        assert!(EmptySpaceConfig::builder().kmeans_restarts(0).build().is_err());
        assert!(EmptySpaceConfig::builder().mds_restarts(0).build().is_err());
        assert!(EmptySpaceConfig::builder().kmeans_tolerance(0.0).build().is_err());
        assert!(EmptySpaceConfig::builder().mds_eps(f64::INFINITY).build().is_err());
        // Range errors are reported by the selector, not the builder.
        assert!(EmptySpaceConfig::builder().max_clusters(2).build().is_ok());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: EmptySpaceConfig = serde_json::from_str(r#"{"max_clusters": 5, "seed": 9}"#).unwrap();
        assert_eq!(config.max_clusters, 5);
        assert_eq!(config.seed, 9);
        assert_eq!(config.kmeans_restarts, EmptySpaceConfig::default().kmeans_restarts);

        let round_trip: EmptySpaceConfig =
            serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(round_trip, config);
    }

    #[test]
    fn test_config_deserialization_is_validated() {
        for json in [
            r#"{"target_dim": 0}"#,
            r#"{"gap_std_multiplier": -1.0}"#,
            r#"{"kmeans_tolerance": -1.0}"#,
            r#"{"mds_restarts": 0}"#,
        ] {
            assert!(
                serde_json::from_str::<EmptySpaceConfig>(json).is_err(),
                "{json} should be rejected"
            );
        }
    }

    #[test]
    fn test_analyze_surfaces_stage_errors() {
        let too_few = [[0.0, 0.0], [1.0, 1.0]];
        assert!(matches!(
            EmptySpace::default().analyze(&too_few),
            Err(EmptySpaceError::Graph(GabrielGraphError::InsufficientData { .. }))
        ));

        let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let config = EmptySpaceConfig::builder().max_clusters(2).build().unwrap();
        assert!(matches!(
            EmptySpace::new(config).analyze(&square),
            Err(EmptySpaceError::Selection(
                ClusterSelectionError::InvalidClusterRange { max_clusters: 2 }
            ))
        ));
    }
}
