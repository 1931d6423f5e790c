use crate::models::config::MAX_CALIBRATION_SAMPLES;
use crate::models::error::CaptureError;
use crate::models::sample::{Baseline, Sample};

/// Default number of samples averaged during calibration.
pub const DEFAULT_CALIBRATION_SAMPLES: u32 = 5000;

/// One-shot rest-state calibration.
///
/// Averages `sample_count` consecutive samples per axis with a signed 32-bit
/// running sum and a truncating division.
#[derive(Debug, Clone, Copy)]
pub struct BaselineEstimator {
    sample_count: u32,
}

impl BaselineEstimator {
    pub fn new(sample_count: u32) -> Self {
        Self { sample_count }
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Pull `sample_count` samples from `next_sample` and average them.
    ///
    /// Blocks for as long as `next_sample` does; bound it from the outside
    /// (the session's reader honours shutdown and the ready timeout).
    pub fn estimate<F>(&self, mut next_sample: F) -> Result<Baseline, CaptureError>
    where
        F: FnMut() -> Result<Sample, CaptureError>,
    {
        if self.sample_count == 0 || self.sample_count > MAX_CALIBRATION_SAMPLES {
            return Err(CaptureError::CalibrationFailed(format!(
                "sample count must be in 1..={}, got {}",
                MAX_CALIBRATION_SAMPLES, self.sample_count
            )));
        }

        let mut sums = [0i32; 3];
        for _ in 0..self.sample_count {
            let sample = next_sample()?;
            for (sum, value) in sums.iter_mut().zip(sample.to_array()) {
                *sum += value as i32;
            }
        }

        let n = self.sample_count as i32;
        Ok(Baseline::new(
            (sums[0] / n) as i16,
            (sums[1] / n) as i16,
            (sums[2] / n) as i16,
        ))
    }
}

impl Default for BaselineEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_CALIBRATION_SAMPLES)
    }
}
