//! End-to-end scenarios for the empty-space pipeline.
//!
//! The main fixture is two vertical lattices separated by a wide corridor:
//!
//! ```text
//! x = 0, 1        x = 10, 11
//! ·  ·            ·  ·
//! ·  ·            ·  ·      y = 0 ..= 24
//! ·  ·            ·  ·
//! ```
//!
//! Inside a lattice every Gabriel edge has length 1 or √2; across the corridor
//! they have length 9 or √82. Only the crossing edges clear the `mean + std`
//! threshold, and their midpoints all lie on the line `x = 5.5`.

use approx::assert_relative_eq;
use empty_space::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

fn two_lattices() -> Vec<[f64; 2]> {
    let mut rows = Vec::with_capacity(100);
    for y in 0..25 {
        for x in [0.0, 1.0, 10.0, 11.0] {
            rows.push([x, f64::from(y)]);
        }
    }
    rows
}

// =============================================================================
// GRAPH CONSTRUCTION
// =============================================================================

#[test]
fn unit_square_keeps_sides_and_one_diagonal() {
    init_tracing();
    let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let graph = build_gabriel_graph(&square).unwrap();

    assert_eq!(graph.edge_count(), 5);
    let lengths: Vec<f64> = graph.edges().map(|(_, key)| graph.edge_length(key)).collect();
    let sides = lengths.iter().filter(|&&l| (l - 1.0).abs() < 1e-12).count();
    let diagonals = lengths
        .iter()
        .filter(|&&l| (l - std::f64::consts::SQRT_2).abs() < 1e-12)
        .count();
    assert_eq!(sides, 4);
    assert_eq!(diagonals, 1);
}

#[test]
fn two_points_in_the_plane_are_insufficient() {
    init_tracing();
    let result = build_gabriel_graph(&[[0.0, 0.0], [1.0, 1.0]]);
    assert_eq!(
        result.unwrap_err(),
        GabrielGraphError::InsufficientData {
            points: 2,
            dimension: 2
        }
    );
}

#[test]
fn two_lattices_edge_inventory() {
    init_tracing();
    let graph = build_gabriel_graph(&two_lattices()).unwrap();

    let lengths: Vec<f64> = graph.edges().map(|(_, key)| graph.edge_length(key)).collect();
    let count_near = |target: f64| lengths.iter().filter(|&&l| (l - target).abs() < 1e-9).count();

    assert_eq!(count_near(1.0), 146);
    assert_eq!(count_near(std::f64::consts::SQRT_2), 48);
    assert_eq!(count_near(9.0), 25);
    assert_eq!(count_near(82.0_f64.sqrt()), 24);
    assert_eq!(graph.edge_count(), 243);
}

// =============================================================================
// GAP DETECTION AND SELECTION
// =============================================================================

#[test]
fn only_corridor_gaps_are_significant() {
    init_tracing();
    let graph = build_gabriel_graph(&two_lattices()).unwrap();
    let (kept, stats) = GapFilter::default().filter(GapDetector::detect(&graph));

    assert_eq!(stats.total, 243);
    assert_eq!(stats.kept, 49);
    assert_eq!(kept.len(), 49);
    assert!(stats.threshold > 2.0_f64.sqrt() && stats.threshold < 9.0);
    for gap in &kept {
        assert_relative_eq!(gap.midpoint[0], 5.5, epsilon = 1e-9);
        assert!(gap.length > stats.threshold);
    }
}

#[test]
fn ghost_points_sit_in_the_corridor() {
    init_tracing();
    let graph = build_gabriel_graph(&two_lattices()).unwrap();
    let ghosts = find_empty_space(&graph, 10).unwrap();

    // A uniform line of midpoints splits best into two halves.
    assert_eq!(ghosts.len(), 2);
    let mut ys = Vec::new();
    for ghost in &ghosts {
        assert_relative_eq!(ghost.coordinates[0], 5.5, epsilon = 1e-9);
        assert!(ghost.avg_gap_length >= 9.0 && ghost.avg_gap_length <= 82.0_f64.sqrt());
        ys.push(ghost.coordinates[1]);
    }
    ys.sort_by(f64::total_cmp);
    assert!(ys[0] < 12.0 && ys[1] > 12.0);
}

#[test]
fn selection_reports_every_k_tried() {
    init_tracing();
    let graph = build_gabriel_graph(&two_lattices()).unwrap();
    let config = EmptySpaceConfig::builder().max_clusters(6).build().unwrap();
    let (selection, _) = EmptySpace::new(config).select(&graph).unwrap();

    let ks: Vec<usize> = selection.scores.iter().map(|&(k, _)| k).collect();
    assert_eq!(ks, vec![2, 3, 4, 5]);
    assert_eq!(best_score(&selection.scores).map(|(k, _)| k), Some(selection.k));
    assert_eq!(selection.labels.len(), 49);
}

#[test]
fn cluster_range_below_three_is_rejected() {
    init_tracing();
    let graph = build_gabriel_graph(&two_lattices()).unwrap();
    assert_eq!(
        find_empty_space(&graph, 2).unwrap_err(),
        ClusterSelectionError::InvalidClusterRange { max_clusters: 2 }
    );
}

#[test]
fn square_has_too_few_gaps_for_any_k() {
    init_tracing();
    // Only the diagonal is longer than mean + std, and one midpoint cannot
    // be split into two clusters.
    let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let graph = build_gabriel_graph(&square).unwrap();
    assert_eq!(
        find_empty_space(&graph, 5).unwrap_err(),
        ClusterSelectionError::ClusteringFailure(ClusteringFailure::Fit {
            k: 2,
            source: ClusteringError::TooFewDistinctPoints { k: 2, distinct: 1 },
        })
    );
}

#[test]
fn sparse_gaps_fail_instead_of_shrinking_the_search() {
    init_tracing();
    // Four significant gaps cannot support k = 4 ..= 9.
    let candidates: Vec<GapCandidate> = [0.0, 10.0, 20.0, 30.0]
        .into_iter()
        .map(|x| GapCandidate {
            midpoint: vec![x, 0.0],
            length: 5.0,
        })
        .collect();
    assert!(matches!(
        ClusterSelector::with_seed(0).select(&candidates, 10),
        Err(ClusterSelectionError::ClusteringFailure(
            ClusteringFailure::Fit { .. } | ClusteringFailure::Score { .. }
        ))
    ));
}

/// Two jittered strips, `x` near {0, 1} and {5, 6}, 25 rows each.
fn jittered_strips(seed: u64) -> Vec<[f64; 2]> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(100);
    for y in 0..25 {
        for x in [0.0, 1.0, 5.0, 6.0] {
            rows.push([
                x + rng.random_range(-0.1..0.1),
                f64::from(y) + rng.random_range(-0.1..0.1),
            ]);
        }
    }
    rows
}

#[test]
fn random_clusters_put_ghosts_between_them() {
    init_tracing();
    for seed in [1, 2, 3] {
        let graph = build_gabriel_graph(&jittered_strips(seed)).unwrap();
        let (kept, stats) = GapFilter::default().filter(GapDetector::detect(&graph));
        assert!(stats.kept >= 20, "seed {seed}: only {} significant gaps", stats.kept);
        assert!(kept.iter().all(|g| g.midpoint[0] > 1.1 && g.midpoint[0] < 4.9));

        let ghosts = find_empty_space(&graph, 10).unwrap();
        assert!(ghosts.len() >= 2);
        for ghost in &ghosts {
            assert!(
                ghost.coordinates[0] > 1.1 && ghost.coordinates[0] < 4.9,
                "seed {seed}: ghost at {:?} outside the corridor",
                ghost.coordinates
            );
        }
    }
}

// =============================================================================
// FULL PIPELINE
// =============================================================================

#[test]
fn analyze_is_deterministic_for_a_seed() {
    init_tracing();
    let rows = two_lattices();
    let config = EmptySpaceConfig::builder()
        .seed(7)
        .mds_restarts(1)
        .mds_max_iter(50)
        .build()
        .unwrap();

    let first = EmptySpace::new(config.clone()).analyze(&rows).unwrap();
    let second = EmptySpace::new(config).analyze(&rows).unwrap();
    assert_eq!(first, second);

    assert_eq!(first.edge_count, 243);
    assert_eq!(first.k, first.ghost_points.len());
    assert_eq!(first.embedded_points.len(), rows.len());
    assert_eq!(first.embedded_ghost_points.len(), first.k);
    assert!(
        first
            .embedded_points
            .iter()
            .chain(&first.embedded_ghost_points)
            .all(|row| row.len() == 2 && row.iter().all(|x| x.is_finite()))
    );
}

#[test]
fn report_survives_json() {
    init_tracing();
    let config = EmptySpaceConfig::builder()
        .mds_restarts(1)
        .mds_max_iter(20)
        .build()
        .unwrap();
    let report = EmptySpace::new(config).analyze(&two_lattices()).unwrap();

    let json = serde_json::to_string(&report).unwrap();
    let restored: EmptySpaceReport = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.k, report.k);
    assert_eq!(restored.edge_count, report.edge_count);
    assert_eq!(restored.gap_statistics.kept, report.gap_statistics.kept);
    assert_eq!(restored.scores.len(), report.scores.len());
    for (a, b) in restored.ghost_points.iter().zip(&report.ghost_points) {
        for (x, y) in a.coordinates.iter().zip(&b.coordinates) {
            assert_relative_eq!(x, y, max_relative = 1e-12);
        }
    }
    for (a, b) in restored.embedded_points.iter().zip(&report.embedded_points) {
        for (x, y) in a.iter().zip(b) {
            assert_relative_eq!(x, y, epsilon = 1e-12, max_relative = 1e-12);
        }
    }
}
