use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::sample::{Axis, AxisMask, CaptureDiagnostics};
use crate::models::trigger::{CombineLogic, EdgePolicy, TriggerMode, TriggerSettings};
use crate::session::shutdown::ShutdownSignal;
use crate::traits::command_channel::CommandChannel;

/// Trigger settings shared between the acquisition and command threads.
pub type SharedSettings = Arc<Mutex<TriggerSettings>>;

/// One configuration mutation decoded from a command message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCommand {
    SetTriggerMode(TriggerMode),
    SetEdge(EdgePolicy),
    SetLogic(CombineLogic),
    SetAxes(AxisMask),
    SetOffset(Axis, u16),
    SetFixedThreshold(Axis, i16),
    SetTimeBefore(u32),
    SetTimeAfter(u32),
}

impl ConfigCommand {
    pub fn apply(self, settings: &mut TriggerSettings) {
        let threshold = &mut settings.threshold;
        match self {
            Self::SetTriggerMode(mode) => threshold.mode = mode,
            Self::SetEdge(edge) => threshold.edge = edge,
            Self::SetLogic(logic) => threshold.logic = logic,
            Self::SetAxes(axes) => threshold.axes = axes,
            Self::SetOffset(axis, offset) => threshold.offsets[axis.index()] = offset,
            Self::SetFixedThreshold(axis, value) => threshold.fixed_thresholds[axis.index()] = value,
            Self::SetTimeBefore(ms) => settings.window.set_time_before_ms(ms),
            Self::SetTimeAfter(ms) => settings.window.set_time_after_ms(ms),
        }
    }
}

/// Result of parsing one command message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommands {
    pub commands: Vec<ConfigCommand>,
    /// Unknown flags plus flags whose argument was missing or out of range.
    pub ignored: usize,
    /// `exit` was seen; tokens after it were not parsed.
    pub exit: bool,
}

/// Parse a whitespace-separated command message.
///
/// Malformed or out-of-range tokens are skipped, leaving the previous value
/// in place. A flag consumes the following token even when it fails to parse.
pub fn parse_commands(message: &str) -> ParsedCommands {
    let mut parsed = ParsedCommands::default();
    let mut tokens = message
        .split(|c: char| c.is_whitespace() || c == '\0')
        .filter(|t| !t.is_empty());

    while let Some(token) = tokens.next() {
        if token == "exit" {
            parsed.exit = true;
            break;
        }

        let arg = match token {
            "-trig" | "-edge" | "-logic" | "-axes" | "-t1" | "-t2" | "-xO" | "-yO" | "-zO"
            | "-xF" | "-yF" | "-zF" => tokens.next(),
            _ => {
                parsed.ignored += 1;
                continue;
            }
        };

        match arg.and_then(|arg| parse_flag(token, arg)) {
            Some(command) => parsed.commands.push(command),
            None => parsed.ignored += 1,
        }
    }

    parsed
}

fn parse_flag(flag: &str, arg: &str) -> Option<ConfigCommand> {
    let command = match flag {
        "-trig" => ConfigCommand::SetTriggerMode(match arg {
            "fixed" => TriggerMode::Fixed,
            "offset" => TriggerMode::Offset,
            _ => return None,
        }),
        "-edge" => ConfigCommand::SetEdge(EdgePolicy::parse(arg)?),
        "-logic" => ConfigCommand::SetLogic(CombineLogic::parse(arg)?),
        "-axes" => ConfigCommand::SetAxes(AxisMask::parse(arg)?),
        "-t1" => ConfigCommand::SetTimeBefore(arg.parse().ok()?),
        "-t2" => ConfigCommand::SetTimeAfter(arg.parse().ok()?),
        "-xO" => ConfigCommand::SetOffset(Axis::X, arg.parse().ok()?),
        "-yO" => ConfigCommand::SetOffset(Axis::Y, arg.parse().ok()?),
        "-zO" => ConfigCommand::SetOffset(Axis::Z, arg.parse().ok()?),
        "-xF" => ConfigCommand::SetFixedThreshold(Axis::X, arg.parse().ok()?),
        "-yF" => ConfigCommand::SetFixedThreshold(Axis::Y, arg.parse().ok()?),
        "-zF" => ConfigCommand::SetFixedThreshold(Axis::Z, arg.parse().ok()?),
        _ => return None,
    };
    Some(command)
}

/// Runtime reconfiguration loop.
///
/// Reads messages from a `CommandChannel` and applies them to the shared
/// settings. All commands of one message are applied under a single lock, so
/// the acquisition thread never sees half a message. Nothing is sent back to
/// the client.
pub struct CommandProcessor<C: CommandChannel> {
    channel: C,
    settings: SharedSettings,
    shutdown: ShutdownSignal,
    diagnostics: Arc<Mutex<CaptureDiagnostics>>,
}

impl<C: CommandChannel> CommandProcessor<C> {
    pub fn new(
        channel: C,
        settings: SharedSettings,
        shutdown: ShutdownSignal,
        diagnostics: Arc<Mutex<CaptureDiagnostics>>,
    ) -> Self {
        Self {
            channel,
            settings,
            shutdown,
            diagnostics,
        }
    }

    /// Process messages until `exit`, channel close, or an external shutdown.
    ///
    /// Both `exit` and a closed channel request shutdown for the whole process.
    pub fn run(&mut self) -> Result<(), CaptureError> {
        log::info!("Runtime configuration listening");

        while !self.shutdown.is_requested() {
            let message = match self.channel.recv_command() {
                Ok(Some(message)) => message,
                Ok(None) => {
                    log::info!("Command channel closed, shutting down");
                    self.shutdown.request();
                    break;
                }
                Err(e) => {
                    log::error!("Command channel failed: {}", e);
                    self.shutdown.request();
                    return Err(e);
                }
            };

            if self.handle_message(&message) {
                log::info!("Client requested exit, shutting down");
                self.shutdown.request();
                break;
            }
        }

        Ok(())
    }

    /// Apply one message. Returns `true` if it contained `exit`.
    pub fn handle_message(&self, message: &str) -> bool {
        let parsed = parse_commands(message);

        if !parsed.commands.is_empty() {
            let mut settings = self.settings.lock();
            for command in &parsed.commands {
                command.apply(&mut settings);
                log::debug!("Applied {:?}", command);
            }
        }
        if parsed.ignored > 0 {
            log::debug!("Ignored {} malformed token(s) in {:?}", parsed.ignored, message.trim());
        }

        {
            let mut diagnostics = self.diagnostics.lock();
            diagnostics.commands_applied += parsed.commands.len() as u64;
            diagnostics.tokens_ignored += parsed.ignored as u64;
        }

        parsed.exit
    }

    /// Run the loop on a dedicated thread.
    pub fn spawn(mut self) -> Result<thread::JoinHandle<Result<(), CaptureError>>, CaptureError>
    where
        C: 'static,
    {
        thread::Builder::new()
            .name("runtime-config".into())
            .spawn(move || self.run())
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn command thread: {}", e)))
    }
}
