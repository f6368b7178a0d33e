use argoatlas::constants::VesselId;
use argoatlas::reports::csv_reader::read_reports_from_path;
use argoatlas::{Atlas, AtlasParams};

#[test]
fn test_replay_sample_file() {
    let reports = read_reports_from_path("tests/data/ais_sample.csv").unwrap();
    // the row with a non-numeric MMSI is dropped at decoding
    assert_eq!(reports.len(), 15);

    let atlas = Atlas::new(AtlasParams::default());
    let summary = atlas.ingest_all(&reports).unwrap();
    assert_eq!(summary.reports, 15);
    // one row without latitude, one flagged inaccurate
    assert_eq!(summary.rejected, 2);
    assert!(summary.waypoints >= 4);

    let trajectories = atlas.trajectories().unwrap();
    assert_eq!(trajectories.len(), 2);
    assert_eq!(trajectories[0].vessel_id, VesselId(244_660_000));

    // the first report of each vessel is its first waypoint
    assert_eq!(trajectories[0].waypoints[0].position, [4.3, 51.9]);
    assert_eq!(trajectories[1].waypoints[0].position, [-89.99, 29.93]);
    // the course change at 00:04 is a waypoint
    assert!(trajectories[0]
        .waypoints
        .iter()
        .any(|w| w.position == [4.3550, 51.9050]));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = read_reports_from_path("tests/data/does_not_exist.csv").unwrap_err();
    assert!(matches!(err, argoatlas::AtlasError::IoError(_)));
}
