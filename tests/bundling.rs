mod common;

use argoatlas::bundling::{render_edges, total_ink, EdgeBundler};
use argoatlas::graph::proximity::ProximityGraph;
use argoatlas::graph::Graph;
use argoatlas::{Atlas, AtlasParams};

use common::{assert_lonlat_close, report};

/// Three vessels sailing due east on parallel lanes 0.01° apart.
fn parallel_lanes(atlas: &Atlas) {
    for (id, lat) in [(1, 0.0), (2, 0.01), (3, 0.02)] {
        atlas.ingest(&report(id, 0, [0.0, lat], 90.0)).unwrap();
        atlas.ingest(&report(id, 60, [1.0, lat], 0.0)).unwrap();
    }
}

#[test]
fn test_parallel_lanes_are_bundled() {
    let atlas = Atlas::new(AtlasParams::default());
    parallel_lanes(&atlas);
    // a far away lane stays on its own
    atlas.ingest(&report(9, 0, [20.0, 40.0], 90.0)).unwrap();
    atlas.ingest(&report(9, 60, [21.0, 40.0], 0.0)).unwrap();

    let summary = atlas.run_bundling().unwrap();
    assert_eq!(summary.merges, 2);
    assert_eq!(summary.nodes, 2);
    assert!(summary.ink_after < summary.ink_before);

    let edges = atlas.bundled_edges().unwrap();
    // 2·3 + 1 for the bundle, 1 for the lone lane
    assert_eq!(edges.len(), 8);
    assert!(edges
        .iter()
        .any(|e| e.source == [20.0, 40.0] && e.target == [21.0, 40.0]));
}

#[test]
fn test_bundle_shares_one_spine() {
    let atlas = Atlas::new(AtlasParams::default());
    parallel_lanes(&atlas);
    atlas.run_bundling().unwrap();
    let edges = atlas.bundled_edges().unwrap();
    assert_eq!(edges.len(), 7);

    // the spine m1 → m2 is the only edge three fan edges lead into
    let spine = edges
        .iter()
        .find(|e| edges.iter().filter(|o| o.target == e.source).count() == 3)
        .unwrap();
    let from_m2 = edges.iter().filter(|e| e.source == spine.target).count();
    assert_eq!(from_m2, 3);
    // control points lie on the line between the lane centroids
    assert_lonlat_close(spine.source, [spine.source[0], 0.01], 1e-9);
    assert_lonlat_close(spine.target, [spine.target[0], 0.01], 1e-9);
    assert!(spine.source[0] <= spine.target[0]);
}

#[test]
fn test_bundling_never_adds_ink() {
    let mut graph = Graph::new();
    let mut quads = Vec::new();
    for i in 0..12 {
        let y = (i % 4) as f64 * 0.006;
        let x = (i / 4) as f64 * 0.3;
        let a = graph.add_vertex([x, y]);
        let b = graph.add_vertex([x + 1.0, y + 0.2]);
        graph.add_edge(a, b).unwrap();
        quads.push([x, y, x + 1.0, y + 0.2]);
    }

    let mut proximity = ProximityGraph::build(&graph, 0.05, 8);
    let before = total_ink(&proximity);
    let summary = EdgeBundler::default()
        .run_with_cancel(&mut proximity, || false)
        .unwrap();

    assert!(summary.ink_after <= before + 1e-6);
    assert!(summary.passes >= 1);
    let segments: usize = proximity.nodes().iter().map(|n| n.segments.len()).sum();
    assert_eq!(segments, quads.len());
    assert!(render_edges(&proximity).len() >= quads.len());
}

#[test]
fn test_empty_atlas_bundles_nothing() {
    let atlas = Atlas::new(AtlasParams::default());
    let summary = atlas.run_bundling().unwrap();
    assert_eq!(summary.nodes, 0);
    assert!(atlas.bundled_edges().unwrap().is_empty());
}

fn shared_route_drawing() -> Vec<argoatlas::bundling::BundleEdge> {
    let atlas = Atlas::new(AtlasParams::default());
    // two vessels over the same points in opposite directions
    atlas.ingest(&report(1, 0, [0.0, 0.0], 90.0)).unwrap();
    atlas.ingest(&report(1, 60, [1.0, 0.0], 0.0)).unwrap();
    atlas.ingest(&report(2, 0, [1.0, 0.0], 270.0)).unwrap();
    atlas.ingest(&report(2, 60, [0.0, 0.0], 0.0)).unwrap();
    for id in 3..8 {
        let lat = (id - 2) as f64 * 0.008;
        atlas.ingest(&report(id, 0, [0.0, lat], 90.0)).unwrap();
        atlas.ingest(&report(id, 60, [1.0, lat], 0.0)).unwrap();
    }
    atlas.run_bundling().unwrap();
    atlas.bundled_edges().unwrap()
}

#[test]
fn test_same_input_gives_same_drawing() {
    let reference = shared_route_drawing();
    assert!(!reference.is_empty());
    for _ in 0..10 {
        assert_eq!(shared_route_drawing(), reference);
    }
}
