//! Argument parsing for running from the command line

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};

use accel_capture_core::models::config::{
    CaptureConfiguration, GRange, OutputDataRate, ReadMode, UseMode,
};
use accel_capture_core::models::error::CaptureError;
use accel_capture_core::models::sample::{Axis, AxisMask};
use accel_capture_core::models::trigger::{CombineLogic, EdgePolicy, TriggerMode};

use crate::tcp::DEFAULT_PORT;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON configuration file; the flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Stream every sample, or capture windows around triggers
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,
    /// Output data rate code (0 = 0.781 Hz up to 15 = 25600 Hz)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..16))]
    pub odr: Option<u8>,
    /// Wait for data-ready before each read, or read the registers directly
    #[arg(long, value_enum)]
    pub read: Option<ReadArg>,
    /// Full-scale range in g
    #[arg(long, value_parser = valid_g_range)]
    pub g_range: Option<GRange>,
    /// Ring buffer capacity in samples per axis (power of two)
    #[arg(long, value_parser = valid_capacity)]
    pub capacity: Option<usize>,
    /// TCP port to accept the client on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,
    /// Address to listen on
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,
    /// Give up waiting for data-ready after this many milliseconds
    #[arg(long)]
    pub ready_timeout_ms: Option<u64>,
    #[command(flatten)]
    pub trigger: TriggerArgs,
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

/// Initial trigger settings; the same values the client can change at runtime
#[derive(clap::Args, Debug, Default)]
pub struct TriggerArgs {
    /// Threshold table used for triggering
    #[arg(long, value_enum)]
    pub trig: Option<TrigArg>,
    /// Trigger edge: pos, neg or both
    #[arg(long, value_parser = valid_edge)]
    pub edge: Option<EdgePolicy>,
    /// Per-axis combination: and, or, 0 (and) or 1 (or)
    #[arg(long, value_parser = valid_logic)]
    pub logic: Option<CombineLogic>,
    /// Axes that take part in triggering: x, y, xy, z, xz, yz or xyz
    #[arg(long, value_parser = valid_axes)]
    pub axes: Option<AxisMask>,
    /// Milliseconds captured before the trigger
    #[arg(long)]
    pub t1: Option<u32>,
    /// Milliseconds captured after the trigger
    #[arg(long)]
    pub t2: Option<u32>,
    /// X offset from the baseline in counts (offset mode)
    #[arg(long)]
    pub x_offset: Option<u16>,
    /// Y offset from the baseline in counts (offset mode)
    #[arg(long)]
    pub y_offset: Option<u16>,
    /// Z offset from the baseline in counts (offset mode)
    #[arg(long)]
    pub z_offset: Option<u16>,
    /// X threshold in counts (fixed mode)
    #[arg(long, allow_negative_numbers = true)]
    pub x_threshold: Option<i16>,
    /// Y threshold in counts (fixed mode)
    #[arg(long, allow_negative_numbers = true)]
    pub y_threshold: Option<i16>,
    /// Z threshold in counts (fixed mode)
    #[arg(long, allow_negative_numbers = true)]
    pub z_threshold: Option<i16>,
}

impl TriggerArgs {
    fn apply(&self, config: &mut CaptureConfiguration) {
        let threshold = &mut config.threshold;
        if let Some(trig) = self.trig {
            threshold.mode = trig.into();
        }
        if let Some(edge) = self.edge {
            threshold.edge = edge;
        }
        if let Some(logic) = self.logic {
            threshold.logic = logic;
        }
        if let Some(axes) = self.axes {
            threshold.axes = axes;
        }

        let offsets = [self.x_offset, self.y_offset, self.z_offset];
        let fixed = [self.x_threshold, self.y_threshold, self.z_threshold];
        for axis in Axis::ALL {
            if let Some(offset) = offsets[axis.index()] {
                threshold.offsets[axis.index()] = offset;
            }
            if let Some(value) = fixed[axis.index()] {
                threshold.fixed_thresholds[axis.index()] = value;
            }
        }

        if let Some(ms) = self.t1 {
            config.time_before_ms = ms;
        }
        if let Some(ms) = self.t2 {
            config.time_after_ms = ms;
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrigArg {
    Fixed,
    Offset,
}

impl From<TrigArg> for TriggerMode {
    fn from(trig: TrigArg) -> Self {
        match trig {
            TrigArg::Fixed => TriggerMode::Fixed,
            TrigArg::Offset => TriggerMode::Offset,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Stream,
    Trig,
}

impl From<ModeArg> for UseMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Stream => UseMode::Streaming,
            ModeArg::Trig => UseMode::Triggered,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadArg {
    Sync,
    Async,
}

impl From<ReadArg> for ReadMode {
    fn from(read: ReadArg) -> Self {
        match read {
            ReadArg::Sync => ReadMode::Sync,
            ReadArg::Async => ReadMode::Async,
        }
    }
}

impl Args {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Load the configuration file (or defaults) and apply flag overrides.
    pub fn configuration(&self) -> Result<CaptureConfiguration, CaptureError> {
        let mut config = match &self.config {
            Some(path) => CaptureConfiguration::load(path)?,
            None => CaptureConfiguration::default(),
        };

        if let Some(mode) = self.mode {
            config.use_mode = mode.into();
        }
        if let Some(code) = self.odr {
            config.output_data_rate = OutputDataRate::from_code(code).ok_or_else(|| {
                CaptureError::ConfigurationFailed(format!("unknown output data rate code: {}", code))
            })?;
        }
        if let Some(read) = self.read {
            config.read_mode = read.into();
        }
        if let Some(range) = self.g_range {
            config.g_range = range;
        }
        if let Some(capacity) = self.capacity {
            config.buffer_capacity = capacity;
        }
        if self.ready_timeout_ms.is_some() {
            config.ready_timeout_ms = self.ready_timeout_ms;
        }
        self.trigger.apply(&mut config);

        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(config)
    }
}

fn valid_g_range(s: &str) -> Result<GRange, String> {
    let g: u8 = s.parse().map_err(|_| format!("not a number: {}", s))?;
    GRange::try_from(g)
}

fn valid_edge(s: &str) -> Result<EdgePolicy, String> {
    EdgePolicy::parse(s).ok_or_else(|| format!("expected pos, neg or both, got {}", s))
}

fn valid_logic(s: &str) -> Result<CombineLogic, String> {
    CombineLogic::parse(s).ok_or_else(|| format!("expected and, or, 0 or 1, got {}", s))
}

fn valid_axes(s: &str) -> Result<AxisMask, String> {
    AxisMask::parse(s).ok_or_else(|| format!("not an axis combination: {}", s))
}

fn valid_capacity(s: &str) -> Result<usize, String> {
    let capacity: usize = s.parse().map_err(|_| format!("not a number: {}", s))?;
    if capacity == 0 || !capacity.is_power_of_two() {
        return Err(format!("{} is not a power of two", capacity));
    }
    Ok(capacity)
}
