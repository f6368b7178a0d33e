//! # Position reports: the input of the ingestion path
//!
//! A [`PositionReport`] is the typed form of one AIS position/status message. It is produced by
//! the external transport (or by the decoders of this module) and consumed by
//! [`Atlas::ingest`](crate::atlas::Atlas::ingest).
//!
//! Modules
//! -----------------
//! * [`ais_message`](crate::reports::ais_message) – decoding of the AIS stream JSON envelope.
//! * [`csv_reader`](crate::reports::csv_reader) – batch replay from AIS CSV exports.
//!
//! Validation
//! -----------------
//! [`PositionReport::to_sample`] is the single gate between raw reports and the simplifier:
//! * reports flagged `position_accurate = false` are rejected,
//! * reports with a missing or out-of-range longitude/latitude are rejected,
//! * a missing or non-finite course, speed or turn rate only drops **that** channel.
use hifitime::Epoch;

use crate::atlas_errors::AtlasError;
use crate::constants::{Degree, Knot, LonLat, VesselId};
use crate::geodesy::is_valid_lon_lat;

pub use crate::time::parse_utc;

pub mod ais_message;
pub mod csv_reader;

/// One position/status report for one vessel.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    pub vessel_id: VesselId,
    pub time: Epoch,
    pub longitude: Option<Degree>,
    pub latitude: Option<Degree>,
    /// Course over ground (degrees, `[0, 360)`).
    pub course_over_ground: Option<Degree>,
    /// Speed over ground (knots).
    pub speed_over_ground: Option<Knot>,
    /// Rate of turn (AIS ROT indicator).
    pub turn_rate: Option<f64>,
    pub position_accurate: bool,
}

/// A validated report: the position is present and valid, the other channels are optional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: Epoch,
    pub position: LonLat,
    pub course: Option<f64>,
    pub speed: Option<f64>,
    pub turn_rate: Option<f64>,
}

impl Sample {
    /// Build a sample with only a position (all other channels missing).
    pub fn at(time: Epoch, lon: Degree, lat: Degree) -> Self {
        Sample {
            time,
            position: [lon, lat],
            course: None,
            speed: None,
            turn_rate: None,
        }
    }

    pub fn with_course(mut self, course: f64) -> Self {
        self.course = Some(course);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_turn_rate(mut self, turn_rate: f64) -> Self {
        self.turn_rate = Some(turn_rate);
        self
    }
}

impl PositionReport {
    /// Validate the report and extract the simplifier input.
    ///
    /// Return
    /// ----------
    /// * `Ok(Sample)` for an accurate report carrying a valid position.
    /// * `Err(AtlasError::RejectedReport)` otherwise; the caller is expected to skip the report.
    pub fn to_sample(&self) -> Result<Sample, AtlasError> {
        if !self.position_accurate {
            return Err(AtlasError::RejectedReport(format!(
                "vessel {}: position flagged inaccurate",
                self.vessel_id
            )));
        }

        let (lon, lat) = match (self.longitude, self.latitude) {
            (Some(lon), Some(lat)) if is_valid_lon_lat(lon, lat) => (lon, lat),
            _ => {
                return Err(AtlasError::RejectedReport(format!(
                    "vessel {}: missing or invalid position ({:?}, {:?})",
                    self.vessel_id, self.longitude, self.latitude
                )))
            }
        };

        Ok(Sample {
            time: self.time,
            position: [lon, lat],
            course: self.course_over_ground.filter(|v| v.is_finite()),
            speed: self.speed_over_ground.filter(|v| v.is_finite()),
            turn_rate: self.turn_rate.filter(|v| v.is_finite()),
        })
    }
}
