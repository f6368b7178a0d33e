//! # Trajectories: per-vessel simplified tracks
//!
//! A [`Trajectory`] is the whole per-vessel state of the ingestion path: the retained
//! waypoints plus the rolling statistics the simplifier needs to decide whether the next report
//! is a meaningful change of course or speed.
//!
//! Modules
//! -----------------
//! * [`cusum`](crate::trajectories::cusum) – two-sided CUSUM detector for one scalar channel.
//! * [`simplifier`](crate::trajectories::simplifier) – [`Simplifier::observe`](crate::trajectories::simplifier::Simplifier::observe), the waypoint decision.
//! * [`store`](crate::trajectories::store) – the [`TrajectoryStore`](crate::trajectories::store::TrajectoryStore) contract, an in-memory store and JSON snapshots.
//!
//! Data model
//! -----------------
//! * **Key:** [`VesselId`] (MMSI).
//! * **Waypoints:** `[lon, lat]` + time, oldest first, at most `max_waypoints` retained.
//! * **Channels:** one [`CusumChannel`] for each of latitude, longitude, course over ground,
//!   speed over ground and turn rate.
//! * **Absolute numbering:** `total_waypoints` counts every waypoint ever accepted, so the
//!   retained waypoint `i` has absolute index `total_waypoints - waypoints.len() + i`. The flow
//!   aggregator uses these indices as watermarks.
//!
//! Defaults
//! -----------------
//! A trajectory is created from its first accepted report with that report as the single
//! waypoint, all accumulators at zero and empty windows.
use hifitime::Epoch;
use serde::{Deserialize, Serialize};

use crate::atlas_errors::AtlasError;
use crate::constants::{LonLat, VesselId};
use crate::geodesy::is_valid_lon_lat;

pub mod cusum;
pub mod simplifier;
pub mod store;

use cusum::CusumChannel;

/// The monitored signals of a vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Latitude,
    Longitude,
    Course,
    Speed,
    TurnRate,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Latitude,
        Channel::Longitude,
        Channel::Course,
        Channel::Speed,
        Channel::TurnRate,
    ];
}

/// An accepted, retained point of a simplified trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: LonLat,
    #[serde(with = "crate::time::unix_seconds")]
    pub time: Epoch,
}

/// CUSUM state of every channel of one vessel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSet {
    pub latitude: CusumChannel,
    pub longitude: CusumChannel,
    pub course: CusumChannel,
    pub speed: CusumChannel,
    pub turn_rate: CusumChannel,
}

impl ChannelSet {
    pub fn get(&self, channel: Channel) -> &CusumChannel {
        match channel {
            Channel::Latitude => &self.latitude,
            Channel::Longitude => &self.longitude,
            Channel::Course => &self.course,
            Channel::Speed => &self.speed,
            Channel::TurnRate => &self.turn_rate,
        }
    }

    pub fn get_mut(&mut self, channel: Channel) -> &mut CusumChannel {
        match channel {
            Channel::Latitude => &mut self.latitude,
            Channel::Longitude => &mut self.longitude,
            Channel::Course => &mut self.course,
            Channel::Speed => &mut self.speed,
            Channel::TurnRate => &mut self.turn_rate,
        }
    }

    /// Zero every accumulator (windows are kept).
    pub fn reset_all(&mut self) {
        for channel in Channel::ALL {
            self.get_mut(channel).reset();
        }
    }
}

/// Simplified trajectory and detector state of one vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub vessel_id: VesselId,
    /// Retained waypoints, oldest first.
    pub waypoints: Vec<Waypoint>,
    /// Number of waypoints ever accepted (retained or trimmed).
    pub total_waypoints: u64,
    /// Time of the last accepted waypoint.
    #[serde(with = "crate::time::unix_seconds")]
    pub last_waypoint: Epoch,
    /// Time of the last report that reached the simplifier (drives the retention sweep).
    #[serde(with = "crate::time::unix_seconds")]
    pub last_report: Epoch,
    pub channels: ChannelSet,
}

impl Trajectory {
    /// Start a trajectory from its first waypoint.
    pub fn new(vessel_id: VesselId, first: Waypoint) -> Self {
        Trajectory {
            vessel_id,
            waypoints: vec![first],
            total_waypoints: 1,
            last_waypoint: first.time,
            last_report: first.time,
            channels: ChannelSet::default(),
        }
    }

    /// Append a waypoint, dropping the oldest ones beyond `max_waypoints`.
    pub fn push_waypoint(&mut self, waypoint: Waypoint, max_waypoints: usize) {
        self.waypoints.push(waypoint);
        self.total_waypoints += 1;
        self.last_waypoint = waypoint.time;
        if self.waypoints.len() > max_waypoints {
            let excess = self.waypoints.len() - max_waypoints;
            self.waypoints.drain(..excess);
        }
    }

    /// Absolute index of the first retained waypoint.
    #[inline]
    pub fn first_retained_index(&self) -> u64 {
        self.total_waypoints - self.waypoints.len() as u64
    }

    /// Retained segments as `(absolute index of the end waypoint, start, end)`.
    pub fn segments(&self) -> impl Iterator<Item = (u64, &Waypoint, &Waypoint)> + '_ {
        let offset = self.first_retained_index();
        self.waypoints
            .windows(2)
            .enumerate()
            .map(move |(i, pair)| (offset + i as u64 + 1, &pair[0], &pair[1]))
    }

    /// Waypoint positions only, oldest first.
    pub fn points(&self) -> Vec<LonLat> {
        self.waypoints.iter().map(|w| w.position).collect()
    }

    /// Check a trajectory loaded from storage.
    ///
    /// Arguments
    /// -----------------
    /// * `window_size`: maximum CUSUM window length of the running simplifier.
    /// * `max_waypoints`: maximum retained waypoints of the running simplifier.
    ///
    /// Return
    /// ----------
    /// * `Err(AtlasError::InvalidTrajectory)` naming the first violated invariant.
    pub fn validate(
        &self,
        window_size: usize,
        max_waypoints: usize,
    ) -> Result<(), AtlasError> {
        let invalid = |msg: String| AtlasError::InvalidTrajectory(self.vessel_id, msg);

        if self.waypoints.is_empty() {
            return Err(invalid("no waypoint".into()));
        }
        if self.waypoints.len() > max_waypoints {
            return Err(invalid(format!(
                "{} waypoints retained, maximum is {max_waypoints}",
                self.waypoints.len()
            )));
        }
        if (self.waypoints.len() as u64) > self.total_waypoints {
            return Err(invalid("total_waypoints smaller than retained waypoints".into()));
        }
        if let Some(w) = self
            .waypoints
            .iter()
            .find(|w| !is_valid_lon_lat(w.position[0], w.position[1]))
        {
            return Err(invalid(format!("invalid waypoint position {:?}", w.position)));
        }
        for channel in Channel::ALL {
            self.channels
                .get(channel)
                .check(window_size)
                .map_err(|msg| invalid(format!("{channel:?}: {msg}")))?;
        }
        Ok(())
    }
}
