use crate::models::error::CaptureError;

/// Maximum length in bytes of one command message.
pub const MAX_COMMAND_LEN: usize = 256;

/// Source of live reconfiguration commands.
pub trait CommandChannel: Send {
    /// Block until one full command message arrives.
    ///
    /// Returns `Ok(None)` once the peer has closed the channel.
    fn recv_command(&mut self) -> Result<Option<String>, CaptureError>;
}
