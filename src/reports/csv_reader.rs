//! Batch replay of AIS CSV exports.
//!
//! Expected header (extra columns are ignored, column order is free):
//!
//! ```text
//! MMSI,BaseDateTime,LAT,LON,SOG,COG,ROT,PositionAccuracy
//! ```
//!
//! `SOG`, `COG`, `ROT` and `PositionAccuracy` are optional. Rows that cannot be decoded are
//! skipped with a warning rather than aborting the whole file.
use std::io::Read;

use serde::Deserialize;
use tracing::warn;

use crate::atlas_errors::AtlasError;
use crate::constants::VesselId;
use crate::reports::{parse_utc, PositionReport};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "MMSI")]
    mmsi: u32,
    #[serde(rename = "BaseDateTime")]
    base_date_time: String,
    #[serde(rename = "LAT", default)]
    lat: Option<f64>,
    #[serde(rename = "LON", default)]
    lon: Option<f64>,
    #[serde(rename = "SOG", default)]
    sog: Option<f64>,
    #[serde(rename = "COG", default)]
    cog: Option<f64>,
    #[serde(rename = "ROT", default)]
    rot: Option<f64>,
    #[serde(rename = "PositionAccuracy", default)]
    position_accuracy: Option<u8>,
}

impl TryFrom<CsvRow> for PositionReport {
    type Error = AtlasError;

    fn try_from(row: CsvRow) -> Result<Self, Self::Error> {
        Ok(PositionReport {
            vessel_id: VesselId(row.mmsi),
            time: parse_utc(&row.base_date_time)?,
            longitude: row.lon,
            latitude: row.lat,
            course_over_ground: row.cog,
            speed_over_ground: row.sog,
            turn_rate: row.rot,
            position_accurate: row.position_accuracy.map_or(true, |flag| flag != 0),
        })
    }
}

/// Read every decodable report from a CSV source, in file order.
///
/// Arguments
/// -----------------
/// * `source`: any reader over CSV text with a header row.
///
/// Return
/// ----------
/// * The decoded reports; undecodable rows are logged and skipped.
/// * `Err(AtlasError::CsvError)` only when the header itself cannot be read.
pub fn read_reports<R: Read>(source: R) -> Result<Vec<PositionReport>, AtlasError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source);
    reader.headers()?;

    let mut reports = Vec::new();
    let mut skipped = 0usize;
    for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
        match row.map_err(AtlasError::from).and_then(PositionReport::try_from) {
            Ok(report) => reports.push(report),
            Err(err) => {
                skipped += 1;
                warn!(line = line + 2, %err, "skipping undecodable CSV row");
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, kept = reports.len(), "CSV replay finished with skipped rows");
    }
    Ok(reports)
}

/// Open a CSV file and read its reports. See [`read_reports`].
pub fn read_reports_from_path(path: impl AsRef<std::path::Path>) -> Result<Vec<PositionReport>, AtlasError> {
    let file = std::fs::File::open(path)?;
    read_reports(std::io::BufReader::new(file))
}
