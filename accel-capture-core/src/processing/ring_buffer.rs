use crate::models::error::CaptureError;

/// Outcome of a windowed read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRead {
    /// All requested samples were copied.
    Complete(usize),
    /// More samples were requested than the buffer holds. The newest
    /// `delivered` (= capacity) samples of the window were copied in order;
    /// the oldest part of the window had already been overwritten.
    Truncated { requested: usize, delivered: usize },
}

impl WindowRead {
    pub fn delivered(&self) -> usize {
        match *self {
            WindowRead::Complete(n) => n,
            WindowRead::Truncated { delivered, .. } => delivered,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, WindowRead::Truncated { .. })
    }
}

/// Fixed-capacity circular store of recent samples for one axis.
///
/// Capacity is a power of two so a slot is `cursor & mask`. The buffer never
/// resizes and never hands samples out destructively: it only keeps the most
/// recent `capacity` pushes, and windowed reads copy around an anchor slot.
///
/// Not internally synchronized; the acquisition thread owns all three axes.
#[derive(Debug)]
pub struct SampleRingBuffer {
    buffer: Box<[i16]>,
    cursor: u64,
    mask: usize,
}

impl SampleRingBuffer {
    pub fn new(capacity: usize) -> Result<Self, CaptureError> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(CaptureError::InvalidCapacity(capacity));
        }
        Ok(Self {
            buffer: vec![0; capacity].into_boxed_slice(),
            cursor: 0,
            mask: capacity - 1,
        })
    }

    /// Write one sample and return the slot it landed in.
    pub fn push(&mut self, sample: i16) -> usize {
        let slot = (self.cursor as usize) & self.mask;
        self.buffer[slot] = sample;
        self.cursor += 1;
        slot
    }

    /// Copy a window of `total` samples starting `samples_before` slots ahead of `anchor`.
    ///
    /// `out` is cleared first. Reads wrap transparently. When `total` exceeds the
    /// capacity, the read starts at the oldest slot still holding part of the
    /// window, so the `capacity` samples copied stay chronological and end at
    /// `anchor + total - samples_before - 1`. `WindowRead::Truncated` is returned.
    pub fn read_window(
        &self,
        anchor: usize,
        samples_before: usize,
        total: usize,
        out: &mut Vec<i16>,
    ) -> WindowRead {
        let capacity = self.capacity();
        let count = total.min(capacity);

        out.clear();
        out.reserve(count);

        let start = if total > capacity {
            anchor
                .wrapping_add(total.saturating_sub(samples_before))
                .wrapping_sub(capacity)
        } else {
            anchor.wrapping_sub(samples_before)
        };

        let mut index = start & self.mask;
        for _ in 0..count {
            out.push(self.buffer[index]);
            index = (index + 1) & self.mask;
        }

        if total > capacity {
            WindowRead::Truncated {
                requested: total,
                delivered: capacity,
            }
        } else {
            WindowRead::Complete(count)
        }
    }

    /// Total number of samples ever pushed.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}
