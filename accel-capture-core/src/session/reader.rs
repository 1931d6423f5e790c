use std::time::{Duration, Instant};

use crate::models::config::ReadMode;
use crate::models::error::CaptureError;
use crate::models::sample::Sample;
use crate::session::shutdown::ShutdownSignal;
use crate::traits::sample_source::SampleSource;

/// Polls between timeout checks; `Instant::now` is too slow to call on every spin.
const TIMEOUT_CHECK_INTERVAL: u32 = 256;

/// Pulls formatted samples from a `SampleSource` according to the read mode.
///
/// In sync mode this busy-polls the data-ready flag with no backoff. The spin
/// gives up with `Cancelled` once shutdown is requested and with `Timeout`
/// after `ready_timeout`, if one is set.
#[derive(Debug)]
pub struct SampleReader {
    read_mode: ReadMode,
    shutdown: ShutdownSignal,
    ready_timeout: Option<Duration>,
    not_ready_polls: u64,
}

impl SampleReader {
    pub fn new(read_mode: ReadMode, shutdown: ShutdownSignal, ready_timeout: Option<Duration>) -> Self {
        Self {
            read_mode,
            shutdown,
            ready_timeout,
            not_ready_polls: 0,
        }
    }

    pub fn next_sample<S: SampleSource + ?Sized>(&mut self, source: &mut S) -> Result<Sample, CaptureError> {
        match self.read_mode {
            ReadMode::Async => Ok(Sample::from_raw(&source.read_async()?)),
            ReadMode::Sync => self.poll_until_ready(source),
        }
    }

    /// Not-ready polls since the last call.
    pub fn take_not_ready_polls(&mut self) -> u64 {
        std::mem::take(&mut self.not_ready_polls)
    }

    fn poll_until_ready<S: SampleSource + ?Sized>(&mut self, source: &mut S) -> Result<Sample, CaptureError> {
        let started = self.ready_timeout.map(|timeout| (Instant::now(), timeout));
        let mut spins: u32 = 0;

        loop {
            if let Some(raw) = source.poll_sync()? {
                return Ok(Sample::from_raw(&raw));
            }
            self.not_ready_polls += 1;

            if self.shutdown.is_requested() {
                return Err(CaptureError::Cancelled);
            }

            spins = spins.wrapping_add(1);
            if let Some((start, timeout)) = started {
                if spins % TIMEOUT_CHECK_INTERVAL == 0 && start.elapsed() >= timeout {
                    return Err(CaptureError::Timeout);
                }
            }

            std::hint::spin_loop();
        }
    }
}
