use thiserror::Error;

/// Errors that can occur while configuring or running a capture session.
///
/// A truncated capture window is not an error; see `WindowRead::Truncated`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("invalid ring buffer capacity {0}: must be a non-zero power of two")]
    InvalidCapacity(usize),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("calibration failed: {0}")]
    CalibrationFailed(String),

    #[error("device not available: {0}")]
    DeviceNotAvailable(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out waiting for sample data")]
    Timeout,

    #[error("cancelled by shutdown request")]
    Cancelled,

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl From<std::io::Error> for CaptureError {
    fn from(e: std::io::Error) -> Self {
        CaptureError::Transport(e.to_string())
    }
}
