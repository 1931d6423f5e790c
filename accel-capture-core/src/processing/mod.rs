pub mod baseline;
pub mod double_buffer;
pub mod ring_buffer;
pub mod threshold;
pub mod window;
pub mod wire;
