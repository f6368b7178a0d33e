//! Time helpers: UTC parsing, day-based durations and `serde` support for [`Epoch`].
//!
//! Every timestamp in the crate is a [`hifitime::Epoch`]. On disk (trajectory snapshots) epochs
//! are written as floating-point UNIX seconds so snapshots stay readable by other tools.
use std::str::FromStr;

use hifitime::{Duration, Epoch};

use crate::atlas_errors::AtlasError;
use crate::constants::SECONDS_PER_DAY;

/// Parse a UTC timestamp such as `2023-05-04 10:16:29.474218962 +0000 UTC` or
/// `2023-01-01T00:00:03`.
///
/// The AIS stream writes the zone as `+0000 UTC`; it is reduced to the `UTC` suffix
/// understood by [`Epoch::from_str`]. Timestamps without a zone are read as UTC.
pub fn parse_utc(s: &str) -> Result<Epoch, AtlasError> {
    let trimmed = s.trim();
    let normalized = match trimmed.strip_suffix("+0000 UTC") {
        Some(stamp) => format!("{} UTC", stamp.trim_end()),
        None => trimmed.to_string(),
    };
    Epoch::from_str(&normalized).map_err(|_| AtlasError::EpochParsingError(s.to_string()))
}

/// Current UTC time from the system clock.
pub fn now() -> Result<Epoch, AtlasError> {
    Epoch::now().map_err(|e| AtlasError::ClockUnavailable(e.to_string()))
}

/// A duration of `days` (fractional days allowed).
#[inline]
pub fn days(days: f64) -> Duration {
    Duration::from_seconds(days * SECONDS_PER_DAY)
}

/// `true` when `then` lies strictly more than `max_age` before `now`.
#[inline]
pub fn is_older_than(then: Epoch, now: Epoch, max_age: Duration) -> bool {
    then < now - max_age
}

/// `#[serde(with = "crate::time::unix_seconds")]` for [`Epoch`] fields.
pub mod unix_seconds {
    use hifitime::Epoch;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(epoch: &Epoch, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(epoch.to_unix_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Epoch, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        if !seconds.is_finite() {
            return Err(serde::de::Error::custom("non-finite UNIX timestamp"));
        }
        Ok(Epoch::from_unix_seconds(seconds))
    }
}

#[cfg(test)]
mod time_test {
    use super::*;

    #[test]
    fn test_parse_utc() {
        let a = parse_utc("2023-05-04 10:16:29.5 +0000 UTC").unwrap();
        let b = Epoch::from_gregorian_utc(2023, 5, 4, 10, 16, 29, 500_000_000);
        assert_eq!(a, b);

        let c = parse_utc("2023-01-01T00:00:03").unwrap();
        assert_eq!(c, Epoch::from_gregorian_utc(2023, 1, 1, 0, 0, 3, 0));

        let d = parse_utc("2024-03-01 10:16:29.474218962 +0000 UTC").unwrap();
        assert_eq!(d, Epoch::from_gregorian_utc(2024, 3, 1, 10, 16, 29, 474_218_962));

        assert!(parse_utc("yesterday").is_err());
        assert!(parse_utc("2023-13-01T00:00:00").is_err());
    }

    #[test]
    fn test_is_older_than() {
        let now = Epoch::from_gregorian_utc_at_midnight(2024, 1, 10);
        let eight_days_ago = now - days(8.0);
        let six_days_ago = now - days(6.0);
        assert!(is_older_than(eight_days_ago, now, days(7.0)));
        assert!(!is_older_than(six_days_ago, now, days(7.0)));
    }
}
