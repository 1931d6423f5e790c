use crate::models::error::CaptureError;
use crate::models::sample::RawSample;

/// Interface for sensors that deliver raw tri-axial samples.
///
/// Implemented by:
/// - `SimulatedSensor` (accel-capture-net)
/// - Future: register-level SPI / I²C drivers
///
/// Called only from the acquisition thread.
pub trait SampleSource: Send {
    /// Non-blocking read gated on the sensor's data-ready flag.
    ///
    /// `Ok(None)` means no new sample yet; the caller retries.
    fn poll_sync(&mut self) -> Result<Option<RawSample>, CaptureError>;

    /// Read the output registers unconditionally. May return the same sample
    /// twice when called faster than the output data rate.
    fn read_async(&mut self) -> Result<RawSample, CaptureError>;

    /// Whether the sensor is present and answering.
    fn is_available(&self) -> bool {
        true
    }

    /// Human-readable name used in logs.
    fn device_name(&self) -> String;
}
