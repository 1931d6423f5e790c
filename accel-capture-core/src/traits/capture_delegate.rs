use crate::models::capture_result::CapturedWindow;
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;

/// Event delegate for capture session notifications.
///
/// All methods are called from the acquisition thread and must return quickly;
/// a slow delegate delays the next sample read.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called after a capture has been handed to the result sink.
    fn on_capture_emitted(&self, capture: &CapturedWindow);

    /// Called when a window did not fit into the ring buffers.
    fn on_window_truncated(&self, requested: usize, delivered: usize);

    /// Called when the acquisition loop stops because of an error.
    fn on_error(&self, error: &CaptureError);
}
