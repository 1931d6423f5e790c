pub mod capture_delegate;
pub mod command_channel;
pub mod result_sink;
pub mod sample_source;
