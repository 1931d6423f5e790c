/// Pre/post-trigger window, expressed in time and derived sample counts.
///
/// `samples_before` and `samples_after` are private so they can only change
/// through the recompute paths below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSpec {
    time_before_ms: u32,
    time_after_ms: u32,
    sample_rate_hz: f64,
    samples_before: usize,
    samples_after: usize,
}

impl WindowSpec {
    pub fn new(time_before_ms: u32, time_after_ms: u32, sample_rate_hz: f64) -> Self {
        let mut spec = Self {
            time_before_ms,
            time_after_ms,
            sample_rate_hz,
            samples_before: 0,
            samples_after: 0,
        };
        spec.recompute_both();
        spec
    }

    pub fn set_time_before_ms(&mut self, ms: u32) {
        self.time_before_ms = ms;
        self.recompute_before();
    }

    pub fn set_time_after_ms(&mut self, ms: u32) {
        self.time_after_ms = ms;
        self.recompute_after();
    }

    pub fn set_sample_rate_hz(&mut self, hz: f64) {
        self.sample_rate_hz = hz;
        self.recompute_both();
    }

    pub fn recompute_before(&mut self) {
        self.samples_before = samples_for(self.sample_rate_hz, self.time_before_ms);
    }

    pub fn recompute_after(&mut self) {
        self.samples_after = samples_for(self.sample_rate_hz, self.time_after_ms);
    }

    pub fn recompute_both(&mut self) {
        self.recompute_before();
        self.recompute_after();
    }

    pub fn time_before_ms(&self) -> u32 {
        self.time_before_ms
    }

    pub fn time_after_ms(&self) -> u32 {
        self.time_after_ms
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    pub fn samples_before(&self) -> usize {
        self.samples_before
    }

    pub fn samples_after(&self) -> usize {
        self.samples_after
    }

    /// Pre-trigger samples, the trigger sample itself, and post-trigger samples.
    pub fn total_samples(&self) -> usize {
        self.samples_before + 1 + self.samples_after
    }
}

/// `ceil(rate * ms / 1000)`: a requested span is never under-covered.
fn samples_for(sample_rate_hz: f64, ms: u32) -> usize {
    (sample_rate_hz * ms as f64 / 1000.0).ceil() as usize
}
