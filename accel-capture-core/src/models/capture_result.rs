use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sample::{Baseline, Sample};

/// A reconstructed pre/post-trigger window, ready for the result sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedWindow {
    pub id: String,
    pub captured_at: DateTime<Utc>,
    pub baseline: Baseline,
    pub x: Vec<i16>,
    pub y: Vec<i16>,
    pub z: Vec<i16>,
    pub samples_before: usize,
    pub samples_after: usize,
    /// `samples_before + 1 + samples_after` at the time of the trigger.
    pub requested_total: usize,
    /// The buffer could not hold the whole window. The delivered samples are
    /// the newest `total_samples()` of it, still in chronological order.
    pub truncated: bool,
}

impl CapturedWindow {
    pub fn new(
        baseline: Baseline,
        axes: [Vec<i16>; 3],
        samples_before: usize,
        samples_after: usize,
        truncated: bool,
    ) -> Self {
        let [x, y, z] = axes;
        Self {
            id: Uuid::new_v4().to_string(),
            captured_at: Utc::now(),
            baseline,
            x,
            y,
            z,
            samples_before,
            samples_after,
            requested_total: samples_before + 1 + samples_after,
            truncated,
        }
    }

    /// Number of samples actually delivered per axis.
    pub fn total_samples(&self) -> usize {
        self.x.len()
    }

    /// Position of the trigger reported to clients: `requested_total - samples_after`.
    pub fn trigger_offset(&self) -> usize {
        self.requested_total - self.samples_after
    }

    /// The `i`-th sample of the window in chronological order.
    pub fn sample(&self, i: usize) -> Sample {
        Sample::new(self.x[i], self.y[i], self.z[i])
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.total_samples()).map(move |i| self.sample(i))
    }

    /// Samples lost from the start of the window to truncation.
    pub fn dropped_samples(&self) -> usize {
        self.requested_total.saturating_sub(self.total_samples())
    }

    /// Index of the trigger sample in the delivered vectors, or `None` if it
    /// was overwritten before the window was read.
    pub fn trigger_index(&self) -> Option<usize> {
        self.samples_before
            .checked_sub(self.dropped_samples())
            .filter(|&i| i < self.total_samples())
    }

    /// The sample that fired the trigger, if it was delivered.
    pub fn trigger_sample(&self) -> Option<Sample> {
        self.trigger_index().map(|i| self.sample(i))
    }
}
