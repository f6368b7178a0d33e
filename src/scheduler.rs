//! # Scheduler: periodic batch jobs
//!
//! Four independent timer-driven jobs run against a shared [`Atlas`]:
//!
//! | Job           | Operation                                   | Default period |
//! |---------------|---------------------------------------------|----------------|
//! | `aggregation` | [`Atlas::aggregate_all`]                    | 1 h            |
//! | `cleanup`     | [`Atlas::cleanup`] with the flow retention  | 24 h           |
//! | `bundling`    | [`Atlas::run_bundling_with_cancel`]         | 6 h            |
//! | `sweep`       | [`Atlas::sweep_inactive`]                   | 1 h            |
//!
//! Each job runs on the blocking pool of the tokio runtime. A failed run is logged and retried
//! at the next tick; it never stops the other jobs nor the ingestion path. Cancellation is
//! cooperative: [`Scheduler::cancel`] stops every timer, and the bundling job polls the same
//! signal before each pass.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::atlas::Atlas;
use crate::atlas_errors::AtlasError;

/// Exclusive run flag of a job, released on drop.
#[derive(Debug)]
pub struct JobGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> JobGuard<'a> {
    /// Take `flag`, or fail with `AtlasError::JobAlreadyRunning(job)` if it is already taken.
    pub fn acquire(flag: &'a AtomicBool, job: &'static str) -> Result<Self, AtlasError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AtlasError::JobAlreadyRunning(job))?;
        Ok(JobGuard { flag })
    }
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    Aggregation,
    Cleanup,
    Bundling,
    Sweep,
}

impl Job {
    pub const ALL: [Job; 4] = [Job::Aggregation, Job::Cleanup, Job::Bundling, Job::Sweep];

    pub fn name(self) -> &'static str {
        match self {
            Job::Aggregation => "aggregation",
            Job::Cleanup => "cleanup",
            Job::Bundling => "bundling",
            Job::Sweep => "sweep",
        }
    }

    /// Period of the job in `atlas`'s parameters.
    pub fn period(self, atlas: &Atlas) -> Duration {
        let params = atlas.params();
        match self {
            Job::Aggregation => params.aggregation_period,
            Job::Cleanup => params.cleanup_period,
            Job::Bundling => params.bundling_period,
            Job::Sweep => params.sweep_period,
        }
    }

    /// Run the job once, synchronously.
    ///
    /// Return
    /// ----------
    /// * A short description of the outcome, for the logs.
    pub fn run_once<F>(self, atlas: &Atlas, should_cancel: F) -> Result<String, AtlasError>
    where
        F: FnMut() -> bool,
    {
        match self {
            Job::Aggregation => atlas.aggregate_all().map(|flows| format!("flows={flows}")),
            Job::Cleanup => atlas
                .cleanup(atlas.params().flow_retention_days)
                .map(|deleted| format!("deleted={deleted}")),
            Job::Bundling => atlas
                .run_bundling_with_cancel(should_cancel)
                .map(|s| format!("passes={}, merges={}, nodes={}", s.passes, s.merges, s.nodes)),
            Job::Sweep => atlas
                .sweep_inactive()
                .map(|deleted| format!("deleted={}", deleted.len())),
        }
    }
}

/// Handle over the running jobs.
#[derive(Debug)]
pub struct Scheduler {
    cancel: watch::Sender<bool>,
    tasks: Vec<(Job, JoinHandle<()>)>,
}

impl Scheduler {
    /// Start every job. Must be called from within a tokio runtime.
    pub fn start(atlas: Arc<Atlas>) -> Self {
        Self::start_jobs(atlas, &Job::ALL)
    }

    /// Start a subset of the jobs.
    pub fn start_jobs(atlas: Arc<Atlas>, jobs: &[Job]) -> Self {
        let (cancel, _) = watch::channel(false);
        let tasks = jobs
            .iter()
            .map(|&job| {
                let handle = tokio::spawn(job_loop(job, Arc::clone(&atlas), cancel.subscribe()));
                (job, handle)
            })
            .collect();
        info!(jobs = ?jobs, "scheduler started");
        Scheduler { cancel, tasks }
    }

    /// Signal every job to stop. Running bundling passes finish first.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Cancel and wait for every job to stop.
    pub async fn shutdown(self) {
        self.cancel();
        for (job, handle) in self.tasks {
            if let Err(err) = handle.await {
                warn!(job = job.name(), %err, "job task ended abnormally");
            }
        }
        info!("scheduler stopped");
    }
}

async fn job_loop(job: Job, atlas: Arc<Atlas>, mut cancel: watch::Receiver<bool>) {
    let period = job.period(&atlas);
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = cancel.changed() => {
                // a dropped sender also means stop
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
                continue;
            }
        }
        if *cancel.borrow() {
            break;
        }

        let worker_atlas = Arc::clone(&atlas);
        let worker_cancel = cancel.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            job.run_once(&worker_atlas, || *worker_cancel.borrow())
        })
        .await;

        match outcome {
            Ok(Ok(message)) => info!(job = job.name(), %message, "job run complete"),
            Ok(Err(AtlasError::JobAlreadyRunning(_))) => {
                debug!(job = job.name(), "previous run still in progress, tick skipped")
            }
            Ok(Err(AtlasError::JobCancelled(_))) => {
                info!(job = job.name(), "job run cancelled");
                break;
            }
            Ok(Err(err)) => warn!(job = job.name(), %err, "job run failed"),
            Err(err) => warn!(job = job.name(), %err, "job task panicked"),
        }
    }
    debug!(job = job.name(), "job loop stopped");
}
