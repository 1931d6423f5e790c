/// Two-slot buffer for streaming mode.
///
/// The producer fills the active slot, then `flip` makes it readable and
/// moves writing to the other slot, so the value handed to the transport is
/// never the one being overwritten.
#[derive(Debug, Clone)]
pub struct DoubleBuffer<T> {
    slots: [T; 2],
    active: usize,
}

impl<T: Copy + Default> DoubleBuffer<T> {
    pub fn new() -> Self {
        Self {
            slots: [T::default(); 2],
            active: 0,
        }
    }

    /// Write `value` into the active slot, flip, and return the just-filled slot.
    pub fn fill_and_flip(&mut self, value: T) -> &T {
        let filled = self.active;
        self.slots[filled] = value;
        self.active ^= 1;
        &self.slots[filled]
    }
}

impl<T: Copy + Default> Default for DoubleBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
