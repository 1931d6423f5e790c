//! # accel-capture-net
//!
//! TCP backend for accel-capture.
//!
//! Provides:
//! - `TcpServer`: accepts one client and splits it into a `TcpResultSink` and a `TcpCommandChannel`
//! - `SimulatedSensor`: paced sample source for running without hardware
//! - `cli`: startup flags layered over the JSON configuration
//!
//! ## Usage
//! ```ignore
//! use accel_capture_core::{CaptureConfiguration, CaptureSession};
//! use accel_capture_net::{SimulatedSensor, TcpServer};
//!
//! let config = CaptureConfiguration::default();
//! let server = TcpServer::bind("0.0.0.0:60000")?;
//! let (sink, commands) = server.accept()?;
//! let sensor = SimulatedSensor::new(config.output_data_rate, config.g_range);
//! let session = CaptureSession::new(sensor, sink, config)?;
//! ```

pub mod cli;
pub mod simulated;
pub mod tcp;

pub use simulated::SimulatedSensor;
pub use tcp::{ConnectionCloser, TcpCommandChannel, TcpResultSink, TcpServer};
