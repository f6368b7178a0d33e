use thiserror::Error;

use crate::constants::VesselId;

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid trajectory for vessel {0}: {1}")]
    InvalidTrajectory(VesselId, String),

    #[error("Rejected position report: {0}")]
    RejectedReport(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unable to parse epoch: {0}")]
    EpochParsingError(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("System clock unavailable: {0}")]
    ClockUnavailable(String),

    #[error("Vertex not found: {0}")]
    VertexNotFound(usize),

    #[error("Job {0} is already running")]
    JobAlreadyRunning(&'static str),

    #[error("Job {0} was cancelled")]
    JobCancelled(&'static str),
}

impl From<h3o::error::InvalidLatLng> for AtlasError {
    fn from(err: h3o::error::InvalidLatLng) -> Self {
        AtlasError::InvalidCoordinates(err.to_string())
    }
}

impl PartialEq for AtlasError {
    fn eq(&self, other: &Self) -> bool {
        use AtlasError::*;
        match (self, other) {
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (InvalidTrajectory(a, x), InvalidTrajectory(b, y)) => a == b && x == y,
            (RejectedReport(a), RejectedReport(b)) => a == b,
            (InvalidCoordinates(a), InvalidCoordinates(b)) => a == b,
            (EpochParsingError(a), EpochParsingError(b)) => a == b,
            (StorageUnavailable(a), StorageUnavailable(b)) => a == b,
            (ClockUnavailable(a), ClockUnavailable(b)) => a == b,
            (VertexNotFound(a), VertexNotFound(b)) => a == b,
            (JobAlreadyRunning(a), JobAlreadyRunning(b)) => a == b,
            (JobCancelled(a), JobCancelled(b)) => a == b,

            // Wrapped foreign errors are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (JsonError(_), JsonError(_)) => true,

            _ => false,
        }
    }
}
