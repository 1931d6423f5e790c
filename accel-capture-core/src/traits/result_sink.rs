use crate::models::capture_result::CapturedWindow;
use crate::models::error::CaptureError;
use crate::models::sample::Sample;

/// Destination for acquisition results (usually a network client).
///
/// See `processing::wire` for the byte framing a stream transport uses.
pub trait ResultSink: Send {
    /// Forward one sample in streaming mode.
    fn send_sample(&mut self, sample: &Sample) -> Result<(), CaptureError>;

    /// Forward one completed trigger capture.
    fn send_capture(&mut self, capture: &CapturedWindow) -> Result<(), CaptureError>;
}
