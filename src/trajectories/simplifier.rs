//! CUSUM trajectory simplifier.
//!
//! For each report of a vessel, every monitored channel (latitude, longitude, course, speed,
//! turn rate) is fed to its [`CusumChannel`](crate::trajectories::cusum::CusumChannel). If **any**
//! channel fires, the report position becomes a new waypoint and every accumulator of the vessel
//! is reset; otherwise only the rolling state is persisted.
//!
//! The first report of a vessel always becomes its first waypoint.
use tracing::debug;

use crate::atlas_errors::AtlasError;
use crate::constants::VesselId;
use crate::params::AtlasParams;
use crate::reports::Sample;
use crate::time::days;
use crate::trajectories::cusum::ChannelOutcome;
use crate::trajectories::store::TrajectoryStore;
use crate::trajectories::{Channel, Trajectory, Waypoint};

/// Waypoint decision for one vessel at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simplifier {
    pub window_size: usize,
    pub decision_interval: f64,
    pub max_waypoints: usize,
}

impl Default for Simplifier {
    fn default() -> Self {
        Self::from(&AtlasParams::default())
    }
}

impl From<&AtlasParams> for Simplifier {
    fn from(params: &AtlasParams) -> Self {
        Simplifier {
            window_size: params.window_size,
            decision_interval: params.decision_interval,
            max_waypoints: params.max_waypoints,
        }
    }
}

fn channel_value(sample: &Sample, channel: Channel) -> Option<f64> {
    match channel {
        Channel::Latitude => Some(sample.position[1]),
        Channel::Longitude => Some(sample.position[0]),
        Channel::Course => sample.course,
        Channel::Speed => sample.speed,
        Channel::TurnRate => sample.turn_rate,
    }
}

impl Simplifier {
    /// Start the trajectory of a vessel from its first sample.
    pub fn start(&self, vessel_id: VesselId, sample: &Sample) -> Trajectory {
        let mut trajectory = Trajectory::new(
            vessel_id,
            Waypoint {
                position: sample.position,
                time: sample.time,
            },
        );
        // Seed the windows so the second report is compared against the first one.
        for channel in Channel::ALL {
            trajectory
                .channels
                .get_mut(channel)
                .update(channel_value(sample, channel), self.decision_interval, self.window_size);
        }
        trajectory
    }

    /// Feed one sample to an existing trajectory.
    ///
    /// Arguments
    /// -----------------
    /// * `trajectory`: the vessel state, updated in place.
    /// * `sample`: a validated report of the same vessel.
    ///
    /// Return
    /// ----------
    /// * `Some(waypoint)` when at least one channel fired (the waypoint is already appended).
    /// * `None` otherwise.
    ///
    /// Notes
    /// ----------
    /// * Every channel is evaluated even once one has fired, so all windows stay aligned.
    /// * A missing channel value only skips that channel.
    pub fn step(&self, trajectory: &mut Trajectory, sample: &Sample) -> Option<Waypoint> {
        let mut fired = Vec::new();
        for channel in Channel::ALL {
            let outcome = trajectory.channels.get_mut(channel).update(
                channel_value(sample, channel),
                self.decision_interval,
                self.window_size,
            );
            if outcome == ChannelOutcome::Fired {
                fired.push(channel);
            }
        }
        trajectory.last_report = sample.time;

        if fired.is_empty() {
            return None;
        }

        trajectory.channels.reset_all();
        let waypoint = Waypoint {
            position: sample.position,
            time: sample.time,
        };
        trajectory.push_waypoint(waypoint, self.max_waypoints);
        debug!(
            vessel = %trajectory.vessel_id,
            ?fired,
            waypoints = trajectory.waypoints.len(),
            "waypoint accepted"
        );
        Some(waypoint)
    }

    /// `observe(vessel, sample) -> Option<Waypoint>` against a store.
    ///
    /// Loads the trajectory of `vessel_id` (creating it on the first report), applies
    /// [`step`](Simplifier::step) and writes the state back.
    ///
    /// Return
    /// ----------
    /// * `Ok(Some(waypoint))` for the first report of a vessel and whenever a channel fires.
    /// * `Ok(None)` when the state was only updated, or for a stale report (not newer than the
    ///   last one processed for this vessel), which is ignored.
    /// * `Err(AtlasError)` if the store is unavailable.
    pub fn observe(
        &self,
        store: &dyn TrajectoryStore,
        vessel_id: VesselId,
        sample: &Sample,
    ) -> Result<Option<Waypoint>, AtlasError> {
        let Some(mut trajectory) = store.find(vessel_id)? else {
            let trajectory = self.start(vessel_id, sample);
            let first = trajectory.waypoints[0];
            store.upsert(trajectory)?;
            debug!(vessel = %vessel_id, "trajectory created");
            return Ok(Some(first));
        };

        if sample.time <= trajectory.last_report {
            debug!(vessel = %vessel_id, "stale report ignored");
            return Ok(None);
        }

        let waypoint = self.step(&mut trajectory, sample);
        store.upsert(trajectory)?;
        Ok(waypoint)
    }

    /// Delete trajectories without any report for more than `inactivity_days`.
    pub fn sweep_inactive(
        &self,
        store: &dyn TrajectoryStore,
        now: hifitime::Epoch,
        inactivity_days: f64,
    ) -> Result<Vec<VesselId>, AtlasError> {
        store.delete_inactive(now - days(inactivity_days))
    }
}
