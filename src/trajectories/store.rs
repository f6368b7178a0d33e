//! Trajectory storage.
//!
//! The atlas only needs keyed upsert / find / delete and a full scan. [`TrajectoryStore`] is that
//! contract; [`MemoryTrajectoryStore`] is the in-process implementation used by default and in
//! tests. A document database adapter lives outside this crate.
//!
//! Snapshots
//! -----------------
//! [`MemoryTrajectoryStore::save_snapshot`] / [`MemoryTrajectoryStore::load_snapshot`] write and
//! read every trajectory as one JSON array. Each trajectory is validated on load; invalid
//! entries are skipped and logged, they never poison the store.
use std::collections::HashMap;
use std::sync::RwLock;

use ahash::RandomState;
use hifitime::Epoch;
use tracing::{info, warn};

use crate::atlas_errors::AtlasError;
use crate::constants::VesselId;
use crate::trajectories::Trajectory;

/// Keyed storage of trajectories.
///
/// Implementations must make every single call atomic. Callers guarantee that reports of one
/// vessel are processed sequentially, so a find-then-upsert on one key needs no extra locking.
pub trait TrajectoryStore: Send + Sync {
    fn find(&self, id: VesselId) -> Result<Option<Trajectory>, AtlasError>;

    fn upsert(&self, trajectory: Trajectory) -> Result<(), AtlasError>;

    /// Return `true` if a trajectory was removed.
    fn delete(&self, id: VesselId) -> Result<bool, AtlasError>;

    fn all(&self) -> Result<Vec<Trajectory>, AtlasError>;

    fn len(&self) -> Result<usize, AtlasError> {
        Ok(self.all()?.len())
    }

    fn is_empty(&self) -> Result<bool, AtlasError> {
        Ok(self.len()? == 0)
    }

    /// Delete every trajectory whose last report is strictly before `cutoff`.
    ///
    /// Return
    /// ----------
    /// * The ids of the deleted trajectories.
    fn delete_inactive(&self, cutoff: Epoch) -> Result<Vec<VesselId>, AtlasError> {
        let mut deleted = Vec::new();
        for trajectory in self.all()? {
            if trajectory.last_report < cutoff && self.delete(trajectory.vessel_id)? {
                deleted.push(trajectory.vessel_id);
            }
        }
        Ok(deleted)
    }
}

type TrajectoryMap = HashMap<VesselId, Trajectory, RandomState>;

/// In-memory [`TrajectoryStore`] backed by a `RwLock<HashMap>`.
#[derive(Debug, Default)]
pub struct MemoryTrajectoryStore {
    inner: RwLock<TrajectoryMap>,
}

fn poisoned<T>(_: T) -> AtlasError {
    AtlasError::StorageUnavailable("trajectory store lock poisoned".into())
}

impl MemoryTrajectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every trajectory to `path` as a JSON array.
    pub fn save_snapshot(&self, path: impl AsRef<std::path::Path>) -> Result<usize, AtlasError> {
        let mut all = self.all()?;
        all.sort_by_key(|t| t.vessel_id);
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer(std::io::BufWriter::new(file), &all)?;
        info!(count = all.len(), path = %path.as_ref().display(), "trajectory snapshot written");
        Ok(all.len())
    }

    /// Replace the content of the store with the snapshot at `path`.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: a file written by [`save_snapshot`](MemoryTrajectoryStore::save_snapshot).
    /// * `window_size`, `max_waypoints`: limits used to validate each trajectory.
    ///
    /// Return
    /// ----------
    /// * The number of trajectories loaded (invalid ones are skipped).
    pub fn load_snapshot(
        &self,
        path: impl AsRef<std::path::Path>,
        window_size: usize,
        max_waypoints: usize,
    ) -> Result<usize, AtlasError> {
        let file = std::fs::File::open(path.as_ref())?;
        let loaded: Vec<Trajectory> = serde_json::from_reader(std::io::BufReader::new(file))?;

        let mut map = TrajectoryMap::default();
        for trajectory in loaded {
            match trajectory.validate(window_size, max_waypoints) {
                Ok(()) => {
                    map.insert(trajectory.vessel_id, trajectory);
                }
                Err(err) => warn!(%err, "skipping invalid trajectory from snapshot"),
            }
        }

        let count = map.len();
        *self.inner.write().map_err(poisoned)? = map;
        info!(count, path = %path.as_ref().display(), "trajectory snapshot loaded");
        Ok(count)
    }
}

impl TrajectoryStore for MemoryTrajectoryStore {
    fn find(&self, id: VesselId) -> Result<Option<Trajectory>, AtlasError> {
        Ok(self.inner.read().map_err(poisoned)?.get(&id).cloned())
    }

    fn upsert(&self, trajectory: Trajectory) -> Result<(), AtlasError> {
        self.inner
            .write()
            .map_err(poisoned)?
            .insert(trajectory.vessel_id, trajectory);
        Ok(())
    }

    fn delete(&self, id: VesselId) -> Result<bool, AtlasError> {
        Ok(self.inner.write().map_err(poisoned)?.remove(&id).is_some())
    }

    fn all(&self) -> Result<Vec<Trajectory>, AtlasError> {
        Ok(self.inner.read().map_err(poisoned)?.values().cloned().collect())
    }

    fn len(&self) -> Result<usize, AtlasError> {
        Ok(self.inner.read().map_err(poisoned)?.len())
    }

    fn delete_inactive(&self, cutoff: Epoch) -> Result<Vec<VesselId>, AtlasError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        let stale: Vec<VesselId> = map
            .values()
            .filter(|t| t.last_report < cutoff)
            .map(|t| t.vessel_id)
            .collect();
        for id in &stale {
            map.remove(id);
        }
        Ok(stale)
    }
}

#[cfg(test)]
mod store_test {
    use super::*;
    use crate::trajectories::Waypoint;

    fn trajectory(id: u32, day: u8) -> Trajectory {
        Trajectory::new(
            VesselId(id),
            Waypoint {
                position: [10.0, 55.0],
                time: Epoch::from_gregorian_utc_at_midnight(2024, 1, day),
            },
        )
    }

    #[test]
    fn test_upsert_find_delete() {
        let store = MemoryTrajectoryStore::new();
        assert!(store.is_empty().unwrap());

        store.upsert(trajectory(1, 1)).unwrap();
        store.upsert(trajectory(2, 1)).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert!(store.find(VesselId(1)).unwrap().is_some());

        assert!(store.delete(VesselId(1)).unwrap());
        assert!(!store.delete(VesselId(1)).unwrap());
        assert!(store.find(VesselId(1)).unwrap().is_none());
    }

    #[test]
    fn test_delete_inactive() {
        let store = MemoryTrajectoryStore::new();
        store.upsert(trajectory(1, 1)).unwrap();
        store.upsert(trajectory(2, 9)).unwrap();

        let cutoff = Epoch::from_gregorian_utc_at_midnight(2024, 1, 5);
        let deleted = store.delete_inactive(cutoff).unwrap();
        assert_eq!(deleted, vec![VesselId(1)]);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_snapshot_skips_invalid_entries() {
        let store = MemoryTrajectoryStore::new();
        store.upsert(trajectory(1, 1)).unwrap();
        let mut broken = trajectory(2, 1);
        broken.channels.latitude.control_positive = -3.0;
        store.upsert(broken).unwrap();

        let path = std::env::temp_dir().join(format!("argoatlas_snapshot_{}.json", std::process::id()));
        assert_eq!(store.save_snapshot(&path).unwrap(), 2);

        let reloaded = MemoryTrajectoryStore::new();
        assert_eq!(reloaded.load_snapshot(&path, 5, 500).unwrap(), 1);
        assert!(reloaded.find(VesselId(1)).unwrap().is_some());
        assert!(reloaded.find(VesselId(2)).unwrap().is_none());

        std::fs::remove_file(&path).unwrap();
    }
}
