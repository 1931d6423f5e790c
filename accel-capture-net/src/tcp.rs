//! Single-client TCP transport.
//!
//! One accepted connection carries both directions: results flow out through
//! `TcpResultSink`, configuration commands flow in through `TcpCommandChannel`.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use accel_capture_core::models::capture_result::CapturedWindow;
use accel_capture_core::models::error::CaptureError;
use accel_capture_core::models::sample::Sample;
use accel_capture_core::processing::wire;
use accel_capture_core::traits::command_channel::{CommandChannel, MAX_COMMAND_LEN};
use accel_capture_core::traits::result_sink::ResultSink;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 60000;

/// Listening socket that hands out one client connection.
pub struct TcpServer {
    listener: TcpListener,
}

impl TcpServer {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, CaptureError> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| CaptureError::Transport(format!("failed to bind listener: {}", e)))?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, CaptureError> {
        Ok(self.listener.local_addr()?)
    }

    /// Block until a client connects and split the connection into its two halves.
    pub fn accept(&self) -> Result<(TcpResultSink, TcpCommandChannel), CaptureError> {
        let (stream, peer) = self.listener.accept()?;
        log::info!("Client connected from {}", peer);

        stream.set_nodelay(true)?;
        let reader = stream.try_clone()?;

        Ok((
            TcpResultSink { stream, peer },
            TcpCommandChannel {
                stream: reader,
                buf: [0; MAX_COMMAND_LEN],
            },
        ))
    }
}

/// Writes samples and captures to the client in the little-endian wire format.
pub struct TcpResultSink {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TcpResultSink {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl ResultSink for TcpResultSink {
    fn send_sample(&mut self, sample: &Sample) -> Result<(), CaptureError> {
        // One write per axis value, matching the streaming frame layout.
        for value in sample.to_array() {
            self.stream.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }

    fn send_capture(&mut self, capture: &CapturedWindow) -> Result<(), CaptureError> {
        self.stream.write_all(&wire::encode_capture(capture))?;
        log::debug!(
            "Sent capture {} ({} samples) to {}",
            capture.id,
            capture.total_samples(),
            self.peer
        );
        Ok(())
    }
}

/// Reads command messages of at most `MAX_COMMAND_LEN` bytes.
pub struct TcpCommandChannel {
    stream: TcpStream,
    buf: [u8; MAX_COMMAND_LEN],
}

impl TcpCommandChannel {
    /// Handle that can close the connection from another thread.
    pub fn closer(&self) -> Result<ConnectionCloser, CaptureError> {
        Ok(ConnectionCloser(self.stream.try_clone()?))
    }
}

impl CommandChannel for TcpCommandChannel {
    fn recv_command(&mut self) -> Result<Option<String>, CaptureError> {
        loop {
            match self.stream.read(&mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(String::from_utf8_lossy(&self.buf[..n]).into_owned())),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Shuts down both directions of a client connection, waking a blocked reader.
pub struct ConnectionCloser(TcpStream);

impl ConnectionCloser {
    pub fn close(&self) {
        match self.0.shutdown(Shutdown::Both) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotConnected => {}
            Err(e) => log::warn!("Failed to close client connection: {}", e),
        }
    }
}
