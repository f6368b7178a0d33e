mod common;

use argoatlas::constants::{ResolutionLevel, VesselId};
use argoatlas::flows::hex_grid::cell_center;
use argoatlas::{Atlas, AtlasParams};
use hifitime::Unit;

use common::{assert_lonlat_close, back_and_forth, report, t0, zigzag};

#[test]
fn test_ingest_counts_adjacent_transitions() {
    let atlas = Atlas::new(AtlasParams::default());
    let (path, a, b) = back_and_forth([4.3, 51.9], ResolutionLevel::Fine, 4);

    let summary = atlas.ingest_all(&zigzag(1, &path, 0)).unwrap();
    assert_eq!(summary.waypoints, 5);

    let flows = atlas.flows(ResolutionLevel::Fine, 1).unwrap();
    assert_eq!(flows.len(), 2);
    assert!(flows.iter().all(|f| f.count == 2));

    let forward = flows
        .iter()
        .find(|f| f.source == cell_center(a))
        .unwrap();
    assert_lonlat_close(forward.target, cell_center(b), 1e-12);
    assert!((forward.intensity - 3.0_f64.log10()).abs() < 1e-12);
}

#[test]
fn test_stationary_vessel_has_no_flow() {
    let atlas = Atlas::new(AtlasParams::default());
    let reports: Vec<_> = (0..20)
        .map(|i| report(7, i, [4.3, 51.9], if i % 2 == 0 { 0.0 } else { 180.0 }))
        .collect();
    atlas.ingest_all(&reports).unwrap();

    for level in ResolutionLevel::ALL {
        assert!(atlas.flows(level, 1).unwrap().is_empty());
    }
}

#[test]
fn test_full_reaggregation_is_idempotent() {
    let atlas = Atlas::new(AtlasParams::default());
    let (path, _, _) = back_and_forth([4.3, 51.9], ResolutionLevel::Fine, 6);
    atlas.ingest_all(&zigzag(1, &path, 0)).unwrap();
    let (path, _, _) = back_and_forth([-70.5, 41.5], ResolutionLevel::Fine, 3);
    atlas.ingest_all(&zigzag(2, &path, 0)).unwrap();

    let incremental: Vec<_> = ResolutionLevel::ALL
        .iter()
        .map(|&level| atlas.flows(level, 1).unwrap())
        .collect();

    atlas.aggregate_all().unwrap();
    atlas.aggregate_all().unwrap();
    let rebuilt: Vec<_> = ResolutionLevel::ALL
        .iter()
        .map(|&level| atlas.flows(level, 1).unwrap())
        .collect();

    assert_eq!(rebuilt, incremental);

    // new waypoints after a rebuild are counted exactly once
    let (path, _, b) = back_and_forth([4.3, 51.9], ResolutionLevel::Fine, 7);
    atlas.ingest_all(&zigzag(1, &path[7..], 7)).unwrap();
    let forward = atlas
        .flows(ResolutionLevel::Fine, 1)
        .unwrap()
        .into_iter()
        .find(|f| f.target == cell_center(b))
        .unwrap();
    assert_eq!(forward.count, 4);
}

#[test]
fn test_cleanup_removes_old_low_traffic_flows() {
    let atlas = Atlas::new(AtlasParams::default());
    let (busy, _, _) = back_and_forth([4.3, 51.9], ResolutionLevel::Fine, 4);
    atlas.ingest_all(&zigzag(1, &busy, 0)).unwrap();
    let (quiet, _, _) = back_and_forth([10.0, 55.0], ResolutionLevel::Fine, 1);
    atlas.ingest_all(&zigzag(2, &quiet, 0)).unwrap();
    assert_eq!(atlas.flows(ResolutionLevel::Fine, 1).unwrap().len(), 3);

    // recent: kept whatever the count
    assert_eq!(atlas.cleanup_at(t0() + Unit::Day * 2_i64, 7.0).unwrap(), 0);

    let deleted = atlas.cleanup_at(t0() + Unit::Day * 30_i64, 7.0).unwrap();
    assert!(deleted >= 1);
    let remaining = atlas.flows(ResolutionLevel::Fine, 1).unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|f| f.count >= 2));
}

#[test]
fn test_sweep_keeps_flows() {
    let atlas = Atlas::new(AtlasParams::default());
    let (path, _, _) = back_and_forth([4.3, 51.9], ResolutionLevel::Fine, 2);
    atlas.ingest_all(&zigzag(1, &path, 0)).unwrap();
    atlas
        .ingest(&report(2, 60 * 24 * 20, [4.0, 52.0], 0.0))
        .unwrap();

    let swept = atlas.sweep_inactive_at(t0() + Unit::Day * 21_i64).unwrap();
    assert_eq!(swept, vec![VesselId(1)]);
    assert_eq!(atlas.trajectories().unwrap().len(), 1);
    assert_eq!(atlas.flows(ResolutionLevel::Fine, 1).unwrap().len(), 2);
}

#[test]
fn test_flow_stats_and_clear() {
    let atlas = Atlas::new(AtlasParams::default());
    let (path, _, _) = back_and_forth([4.3, 51.9], ResolutionLevel::Fine, 3);
    atlas.ingest_all(&zigzag(1, &path, 0)).unwrap();

    let stats = atlas.flow_stats(1).unwrap();
    let fine = stats
        .iter()
        .find(|s| s.resolution == ResolutionLevel::Fine)
        .unwrap();
    assert_eq!(fine.total, 2);
    assert_eq!(fine.transitions, 3);
    assert_eq!(fine.busiest[0].count, 2);

    atlas.clear_flows().unwrap();
    assert!(atlas.flows(ResolutionLevel::Fine, 1).unwrap().is_empty());
    // trajectories are not touched by clear
    assert_eq!(atlas.trajectories().unwrap()[0].waypoints.len(), 4);
}

fn fleet() -> Vec<Vec<argoatlas::reports::PositionReport>> {
    let origins = [[4.3, 51.9], [-70.5, 41.5], [10.0, 55.0], [139.7, 35.2], [-43.1, -23.0], [103.8, 1.2]];
    origins
        .iter()
        .enumerate()
        .map(|(i, &origin)| {
            let (path, _, _) = back_and_forth(origin, ResolutionLevel::Fine, 40);
            zigzag(i as u32 + 1, &path, 0)
        })
        .collect()
}

#[test]
fn test_ingest_during_full_aggregation_counts_once() {
    let fleet = fleet();

    let sequential = Atlas::new(AtlasParams::default());
    for reports in &fleet {
        sequential.ingest_all(reports).unwrap();
    }
    let expected: Vec<_> = ResolutionLevel::ALL
        .iter()
        .map(|&level| sequential.flows(level, 1).unwrap())
        .collect();

    let atlas = Atlas::new(AtlasParams::default());
    std::thread::scope(|scope| {
        for reports in &fleet {
            let atlas = &atlas;
            scope.spawn(move || {
                for report in reports {
                    atlas.ingest(report).unwrap();
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..20 {
                atlas.aggregate_all().unwrap();
            }
        });
    });

    let concurrent: Vec<_> = ResolutionLevel::ALL
        .iter()
        .map(|&level| atlas.flows(level, 1).unwrap())
        .collect();
    assert_eq!(concurrent, expected);

    // a rebuild after the fact agrees as well
    atlas.aggregate_all().unwrap();
    let rebuilt: Vec<_> = ResolutionLevel::ALL
        .iter()
        .map(|&level| atlas.flows(level, 1).unwrap())
        .collect();
    assert_eq!(rebuilt, expected);
}
