//! Byte framing of results sent to a remote client.
//!
//! All values are little-endian.
//!
//! Streaming frame (one per sample):
//! ```text
//! [0-1] x (i16)  [2-3] y (i16)  [4-5] z (i16)
//! ```
//!
//! Capture frame (one per trigger):
//! ```text
//! [0-5]    baseline x, y, z (i16 ×3)
//! [6-9]    total samples delivered (u32)
//! [10-13]  trigger offset = requested total - samples after (u32)
//! [14..]   total × (x, y, z) i16, chronological
//! ```
//!
//! A truncated capture carries only the newest `total` samples of its window,
//! so its trigger sits at `trigger offset - 1 - (requested total - total)`.

use crate::models::capture_result::CapturedWindow;
use crate::models::sample::Sample;

/// Size of one encoded sample triple.
pub const SAMPLE_FRAME_SIZE: usize = 6;

/// Size of the capture frame header (baseline + total + trigger offset).
pub const CAPTURE_HEADER_SIZE: usize = 14;

pub fn encode_sample(sample: &Sample) -> [u8; SAMPLE_FRAME_SIZE] {
    let mut frame = [0u8; SAMPLE_FRAME_SIZE];
    frame[0..2].copy_from_slice(&sample.x.to_le_bytes());
    frame[2..4].copy_from_slice(&sample.y.to_le_bytes());
    frame[4..6].copy_from_slice(&sample.z.to_le_bytes());
    frame
}

pub fn encode_capture_header(capture: &CapturedWindow) -> [u8; CAPTURE_HEADER_SIZE] {
    let mut header = [0u8; CAPTURE_HEADER_SIZE];
    header[0..6].copy_from_slice(&encode_sample(&capture.baseline.as_sample()));
    header[6..10].copy_from_slice(&(capture.total_samples() as u32).to_le_bytes());
    header[10..14].copy_from_slice(&(capture.trigger_offset() as u32).to_le_bytes());
    header
}

/// Encode a whole capture frame into one buffer.
pub fn encode_capture(capture: &CapturedWindow) -> Vec<u8> {
    let mut data =
        Vec::with_capacity(CAPTURE_HEADER_SIZE + capture.total_samples() * SAMPLE_FRAME_SIZE);
    data.extend_from_slice(&encode_capture_header(capture));
    for sample in capture.samples() {
        data.extend_from_slice(&encode_sample(&sample));
    }
    data
}
