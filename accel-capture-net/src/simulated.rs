//! Paced accelerometer simulator.
//!
//! Stands in for the hardware sensor. The device sits at rest with 1 g on Z,
//! picks up a little noise, and is knocked along X at a fixed interval so the
//! trigger path has something to fire on.

use std::time::{Duration, Instant};

use accel_capture_core::models::config::{GRange, OutputDataRate};
use accel_capture_core::models::error::CaptureError;
use accel_capture_core::models::sample::{RawSample, Sample};
use accel_capture_core::traits::sample_source::SampleSource;

/// Shock amplitude in g.
const SHOCK_G: i32 = 3;

/// Simulated sensor paced by the configured output data rate.
pub struct SimulatedSensor {
    odr: OutputDataRate,
    range: GRange,
    period: Duration,
    next_due: Instant,
    tick: u64,
    latest: Sample,
    rng: u64,
    noise: i32,
    shock_every: u64,
    shock_len: u64,
}

impl SimulatedSensor {
    /// One shock of about 10 ms every two seconds, ±16 counts of noise.
    pub fn new(odr: OutputDataRate, range: GRange) -> Self {
        let hz = odr.hz();
        Self {
            odr,
            range,
            period: Duration::from_secs_f64(1.0 / hz),
            next_due: Instant::now(),
            tick: 0,
            latest: Sample::new(0, 0, clamp(range.counts_per_g())),
            rng: 0x9E37_79B9_7F4A_7C15,
            noise: 16,
            shock_every: ((hz * 2.0) as u64).max(2),
            shock_len: ((hz / 100.0) as u64).max(1),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        // xorshift gets stuck at zero
        self.rng = seed.max(1);
        self
    }

    /// Peak noise in counts per axis.
    pub fn with_noise(mut self, amplitude: i32) -> Self {
        self.noise = amplitude.max(0);
        self
    }

    /// Knock the sensor every `every` samples for `len` samples.
    pub fn with_shocks(mut self, every: u64, len: u64) -> Self {
        self.shock_every = every.max(1);
        self.shock_len = len.min(self.shock_every);
        self
    }

    /// Generate the next sample regardless of pacing.
    fn generate(&mut self) -> Sample {
        let counts_per_g = self.range.counts_per_g();
        let mut x = self.next_noise();
        let y = self.next_noise();
        let z = counts_per_g + self.next_noise();

        let phase = self.tick % self.shock_every;
        if phase < self.shock_len {
            // Alternate the sign so both edges see it.
            let sign = if phase % 2 == 0 { 1 } else { -1 };
            x += sign * SHOCK_G * counts_per_g;
        }
        self.tick += 1;

        self.latest = Sample::new(clamp(x), clamp(y), clamp(z));
        self.latest
    }

    fn next_noise(&mut self) -> i32 {
        if self.noise == 0 {
            return 0;
        }
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 7;
        self.rng ^= self.rng << 17;
        let span = (2 * self.noise + 1) as u64;
        (self.rng % span) as i32 - self.noise
    }

    /// Whether the next output period has elapsed. Advances the schedule if so.
    fn tick_due(&mut self) -> bool {
        let now = Instant::now();
        if now < self.next_due {
            return false;
        }
        self.next_due += self.period;
        // After a long stall, resume pacing from now rather than bursting.
        if self.next_due + self.period * 64 < now {
            self.next_due = now + self.period;
        }
        true
    }
}

impl SampleSource for SimulatedSensor {
    fn poll_sync(&mut self) -> Result<Option<RawSample>, CaptureError> {
        if self.tick_due() {
            Ok(Some(self.generate().to_raw()))
        } else {
            Ok(None)
        }
    }

    fn read_async(&mut self) -> Result<RawSample, CaptureError> {
        if self.tick_due() {
            self.generate();
        }
        Ok(self.latest.to_raw())
    }

    fn device_name(&self) -> String {
        format!("simulated ±{}g @ {} Hz", self.range.g(), self.odr.hz())
    }
}

fn clamp(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}
