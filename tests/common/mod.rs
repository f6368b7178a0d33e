#![allow(dead_code)]

use approx::assert_abs_diff_eq;
use argoatlas::constants::{LonLat, ResolutionLevel, VesselId};
use argoatlas::flows::hex_grid::{cell_center, cell_of};
use argoatlas::reports::PositionReport;
use h3o::CellIndex;
use hifitime::{Epoch, Unit};

pub fn t0() -> Epoch {
    Epoch::from_gregorian_utc_at_midnight(2024, 5, 1)
}

pub fn report(id: u32, minute: i64, position: LonLat, course: f64) -> PositionReport {
    PositionReport {
        vessel_id: VesselId(id),
        time: t0() + Unit::Minute * minute,
        longitude: Some(position[0]),
        latitude: Some(position[1]),
        course_over_ground: Some(course),
        speed_over_ground: Some(12.0),
        turn_rate: Some(0.0),
        position_accurate: true,
    }
}

/// Reports along `path`, one per minute from `start_minute`, with a course flipping by 180°
/// so that every report becomes a waypoint.
pub fn zigzag(id: u32, path: &[LonLat], start_minute: i64) -> Vec<PositionReport> {
    path.iter()
        .enumerate()
        .map(|(i, &p)| {
            let course = if i % 2 == 0 { 0.0 } else { 180.0 };
            report(id, start_minute + i as i64, p, course)
        })
        .collect()
}

pub fn neighbor(cell: CellIndex) -> CellIndex {
    cell.grid_disk::<Vec<_>>(1)
        .into_iter()
        .find(|c| *c != cell)
        .expect("a cell always has neighbors")
}

/// `hops + 1` cell centers going back and forth between the cell of `start` and a neighbor.
pub fn back_and_forth(start: LonLat, level: ResolutionLevel, hops: usize) -> (Vec<LonLat>, CellIndex, CellIndex) {
    let a = cell_of(start, level).unwrap();
    let b = neighbor(a);
    let path = (0..=hops)
        .map(|i| if i % 2 == 0 { cell_center(a) } else { cell_center(b) })
        .collect();
    (path, a, b)
}

pub fn assert_lonlat_close(actual: LonLat, expected: LonLat, epsilon: f64) {
    assert_abs_diff_eq!(actual[0], expected[0], epsilon = epsilon);
    assert_abs_diff_eq!(actual[1], expected[1], epsilon = epsilon);
}
