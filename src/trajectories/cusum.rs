//! # Two-sided CUSUM change detector
//!
//! One [`CusumChannel`] monitors one scalar signal of a vessel (latitude, longitude, course,
//! speed or turn rate). It keeps the last *N* raw values and two non-negative accumulators.
//!
//! For a new value `s`, with `target = mean(window)` and decision interval `h`:
//!
//! ```text
//! positive' = max(0, positive + s - target - h/2)
//! negative' = max(0, negative - s + target - h/2)
//! fires     = positive' > h  ||  negative' > h
//! ```
//!
//! The reference value `h/2` absorbs noise smaller than half the decision interval, so a
//! constant signal never accumulates. A sustained shift of `δ > h/2` accumulates `δ - h/2` per
//! sample and fires after roughly `h / (δ - h/2)` samples.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Per-channel CUSUM state.
///
/// Invariants
/// -----------------
/// * `deltas.len() <= window_size` of the owning simplifier.
/// * `control_positive >= 0`, `control_negative >= 0`, both finite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CusumChannel {
    /// Recent raw samples, oldest first.
    pub deltas: SmallVec<[f64; 8]>,
    pub control_positive: f64,
    pub control_negative: f64,
}

/// Result of feeding one value to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// Value missing or not finite: state untouched.
    Skipped,
    /// Accumulators updated, no change detected.
    Quiet,
    /// One accumulator exceeded the decision interval.
    Fired,
}

impl CusumChannel {
    /// Mean of the window, or `None` for an empty window.
    pub fn target(&self) -> Option<f64> {
        if self.deltas.is_empty() {
            None
        } else {
            Some(self.deltas.iter().sum::<f64>() / self.deltas.len() as f64)
        }
    }

    /// Feed one value and update the accumulators and the window.
    ///
    /// Arguments
    /// -----------------
    /// * `value`: the new sample; `None` or a non-finite value skips the channel.
    /// * `h`: decision interval (`> 0`).
    /// * `window_size`: maximum number of retained samples (`>= 1`).
    ///
    /// Return
    /// ----------
    /// * The [`ChannelOutcome`]. Firing does **not** reset the accumulators here: resetting is a
    ///   trajectory-wide decision taken by the simplifier once all channels were evaluated.
    pub fn update(&mut self, value: Option<f64>, h: f64, window_size: usize) -> ChannelOutcome {
        let Some(sample) = value.filter(|v| v.is_finite()) else {
            return ChannelOutcome::Skipped;
        };

        // An empty window has no baseline yet: the first sample is its own target.
        let target = self.target().unwrap_or(sample);
        let k = h / 2.0;

        self.control_positive = (self.control_positive + sample - target - k).max(0.0);
        self.control_negative = (self.control_negative - sample + target - k).max(0.0);

        self.push(sample, window_size);

        if self.control_positive > h || self.control_negative > h {
            ChannelOutcome::Fired
        } else {
            ChannelOutcome::Quiet
        }
    }

    /// Zero both accumulators, keep the window.
    #[inline]
    pub fn reset(&mut self) {
        self.control_positive = 0.0;
        self.control_negative = 0.0;
    }

    fn push(&mut self, sample: f64, window_size: usize) {
        self.deltas.push(sample);
        if self.deltas.len() > window_size {
            let excess = self.deltas.len() - window_size;
            self.deltas.drain(..excess);
        }
    }

    /// Check the structural invariants of a channel loaded from storage.
    pub fn check(&self, window_size: usize) -> Result<(), String> {
        if self.deltas.len() > window_size {
            return Err(format!(
                "window holds {} samples, maximum is {window_size}",
                self.deltas.len()
            ));
        }
        if self.deltas.iter().any(|v| !v.is_finite()) {
            return Err("window contains a non-finite sample".into());
        }
        let valid = |c: f64| c.is_finite() && c >= 0.0;
        if !valid(self.control_positive) || !valid(self.control_negative) {
            return Err(format!(
                "control sums must be finite and non-negative (got {}, {})",
                self.control_positive, self.control_negative
            ));
        }
        Ok(())
    }
}
