//! # accel-capture-core
//!
//! Transport-agnostic accelerometer acquisition, trigger and capture engine.
//!
//! Provides per-axis ring buffers, baseline calibration, threshold evaluation,
//! capture-window sizing, the little-endian wire format, and the capture
//! session state machine. Sensor drivers implement `SampleSource`, result
//! transports implement `ResultSink` and `CommandChannel`; both plug into the
//! generic `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! accel-capture-core (this crate)
//! ├── traits/       ← SampleSource, ResultSink, CommandChannel, CaptureDelegate
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, Sample, trigger settings
//! ├── processing/   ← SampleRingBuffer, ThresholdEngine, WindowSpec, BaselineEstimator, wire codec
//! └── session/      ← CaptureSession, CommandProcessor, SampleReader, ShutdownSignal
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::capture_result::CapturedWindow;
pub use models::config::{CaptureConfiguration, GRange, OutputDataRate, ReadMode, UseMode};
pub use models::error::CaptureError;
pub use models::sample::{Axis, AxisMask, Baseline, CaptureDiagnostics, RawSample, Sample};
pub use models::state::CaptureState;
pub use models::trigger::{CombineLogic, EdgePolicy, ThresholdConfig, TriggerMode, TriggerSettings};
pub use processing::baseline::BaselineEstimator;
pub use processing::ring_buffer::{SampleRingBuffer, WindowRead};
pub use processing::threshold::ThresholdEngine;
pub use processing::window::WindowSpec;
pub use session::commands::{parse_commands, CommandProcessor, ConfigCommand, SharedSettings};
pub use session::controller::{CaptureSession, SessionMonitor};
pub use session::reader::SampleReader;
pub use session::shutdown::ShutdownSignal;
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::command_channel::CommandChannel;
pub use traits::result_sink::ResultSink;
pub use traits::sample_source::SampleSource;
