//! Mapping of positions onto the H3 hexagonal grid.
//!
//! A segment contributes a flow at a resolution only if its endpoints fall in two **distinct,
//! adjacent** cells: sub-cell motion is not a flow, and a jump over several cells is not
//! collapsed into a single hop.
use h3o::{CellIndex, LatLng, Resolution};

use crate::atlas_errors::AtlasError;
use crate::constants::{LonLat, ResolutionLevel};

/// Cell containing a `[lon, lat]` position at `level`.
pub fn cell_of(position: LonLat, level: ResolutionLevel) -> Result<CellIndex, AtlasError> {
    let resolution = Resolution::try_from(level.h3_level())
        .map_err(|e| AtlasError::InvalidParameter(e.to_string()))?;
    let latlng = LatLng::new(position[1], position[0])?;
    Ok(latlng.to_cell(resolution))
}

/// Center of a cell as `[lon, lat]`.
pub fn cell_center(cell: CellIndex) -> LonLat {
    let center = LatLng::from(cell);
    [center.lng(), center.lat()]
}

/// `true` if `a` and `b` share an edge. Cells of different resolutions are never neighbors.
pub fn are_neighbors(a: CellIndex, b: CellIndex) -> bool {
    a.is_neighbor_with(b).unwrap_or(false)
}

/// Directed cell transition of a segment at `level`, if it is a flow.
///
/// Return
/// ----------
/// * `Ok(Some((source, target)))` for two distinct adjacent cells.
/// * `Ok(None)` for a segment inside one cell or between non-adjacent cells.
/// * `Err(AtlasError::InvalidCoordinates)` if an endpoint is not a valid position.
pub fn transition(
    start: LonLat,
    end: LonLat,
    level: ResolutionLevel,
) -> Result<Option<(CellIndex, CellIndex)>, AtlasError> {
    let source = cell_of(start, level)?;
    let target = cell_of(end, level)?;

    if source == target || !are_neighbors(source, target) {
        return Ok(None);
    }
    Ok(Some((source, target)))
}

#[cfg(test)]
mod hex_grid_test {
    use super::*;

    #[test]
    fn test_levels_use_h3_resolutions_3_to_5() {
        for (level, expected) in [
            (ResolutionLevel::Coarse, Resolution::Three),
            (ResolutionLevel::Medium, Resolution::Four),
            (ResolutionLevel::Fine, Resolution::Five),
        ] {
            assert_eq!(cell_of([4.3, 51.9], level).unwrap().resolution(), expected);
        }
    }

    #[test]
    fn test_same_cell_is_not_a_flow() {
        let p = [4.30, 51.90];
        let q = [4.3001, 51.9001];
        assert_eq!(transition(p, q, ResolutionLevel::Coarse).unwrap(), None);
    }

    #[test]
    fn test_adjacent_cells_are_a_flow() {
        let source = cell_of([4.3, 51.9], ResolutionLevel::Medium).unwrap();
        let neighbor = source
            .grid_disk::<Vec<_>>(1)
            .into_iter()
            .find(|c| *c != source)
            .unwrap();

        let flow = transition(cell_center(source), cell_center(neighbor), ResolutionLevel::Medium)
            .unwrap()
            .unwrap();
        assert_eq!(flow, (source, neighbor));
    }

    #[test]
    fn test_distant_cells_are_not_a_flow() {
        // Rotterdam → New York is many cells apart at every level
        let flow = transition([4.3, 51.9], [-74.0, 40.7], ResolutionLevel::Coarse).unwrap();
        assert_eq!(flow, None);
    }

    #[test]
    fn test_center_round_trip() {
        let cell = cell_of([-70.0, 42.0], ResolutionLevel::Fine).unwrap();
        assert_eq!(cell_of(cell_center(cell), ResolutionLevel::Fine).unwrap(), cell);
    }

    #[test]
    fn test_invalid_position() {
        assert!(cell_of([0.0, f64::NAN], ResolutionLevel::Fine).is_err());
    }
}
