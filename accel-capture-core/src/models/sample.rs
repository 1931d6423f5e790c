use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of accelerometer axes.
pub const AXIS_COUNT: usize = 3;

/// Size in bytes of one raw burst read: `[xL, xH, yL, yH, zL, zH]`.
pub const RAW_SAMPLE_LEN: usize = 6;

/// Raw register payload for one acquisition tick.
pub type RawSample = [u8; RAW_SAMPLE_LEN];

/// Accelerometer axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; AXIS_COUNT] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Bit for this axis in an `AxisMask` (bit0 = X, bit1 = Y, bit2 = Z).
    pub fn bit(self) -> u8 {
        1 << self.index()
    }
}

/// One signed 16-bit tri-axial sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Sample {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Decode a raw burst read. Each axis is `(high << 8) | low` cast to i16.
    pub fn from_raw(raw: &RawSample) -> Self {
        Self {
            x: convert_raw(raw[0], raw[1]),
            y: convert_raw(raw[2], raw[3]),
            z: convert_raw(raw[4], raw[5]),
        }
    }

    /// Encode back into the sensor's register layout.
    pub fn to_raw(self) -> RawSample {
        let [xl, xh] = self.x.to_le_bytes();
        let [yl, yh] = self.y.to_le_bytes();
        let [zl, zh] = self.z.to_le_bytes();
        [xl, xh, yl, yh, zl, zh]
    }

    pub fn axis(&self, axis: Axis) -> i16 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn to_array(self) -> [i16; AXIS_COUNT] {
        [self.x, self.y, self.z]
    }
}

impl From<[i16; AXIS_COUNT]> for Sample {
    fn from(v: [i16; AXIS_COUNT]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Combine a low/high register pair into a signed 16-bit value.
pub fn convert_raw(low: u8, high: u8) -> i16 {
    (((high as u16) << 8) | low as u16) as i16
}

/// Set of axes participating in trigger detection. Never empty.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AxisMask(u8);

impl AxisMask {
    pub const X: AxisMask = AxisMask(0b001);
    pub const Y: AxisMask = AxisMask(0b010);
    pub const XY: AxisMask = AxisMask(0b011);
    pub const Z: AxisMask = AxisMask(0b100);
    pub const XZ: AxisMask = AxisMask(0b101);
    pub const YZ: AxisMask = AxisMask(0b110);
    pub const XYZ: AxisMask = AxisMask(0b111);

    /// Build a mask from its 3-bit pattern. Returns `None` for 0 or anything above 0b111.
    pub fn from_bits(bits: u8) -> Option<Self> {
        if bits == 0 || bits > 0b111 {
            None
        } else {
            Some(AxisMask(bits))
        }
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, axis: Axis) -> bool {
        self.0 & axis.bit() != 0
    }

    /// Parse the command form: `x`, `y`, `xy`, `z`, `xz`, `yz`, `xyz`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "xy" => Some(Self::XY),
            "z" => Some(Self::Z),
            "xz" => Some(Self::XZ),
            "yz" => Some(Self::YZ),
            "xyz" => Some(Self::XYZ),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            0b001 => "x",
            0b010 => "y",
            0b011 => "xy",
            0b100 => "z",
            0b101 => "xz",
            0b110 => "yz",
            _ => "xyz",
        }
    }
}

impl fmt::Debug for AxisMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AxisMask({})", self.name())
    }
}

impl fmt::Display for AxisMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for AxisMask {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        AxisMask::parse(&s).ok_or_else(|| format!("invalid axis mask: {}", s))
    }
}

impl From<AxisMask> for String {
    fn from(mask: AxisMask) -> Self {
        mask.name().to_string()
    }
}

/// Per-axis rest-state reference established by calibration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Baseline {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    pub fn axis(&self, axis: Axis) -> i16 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn as_sample(&self) -> Sample {
        Sample::new(self.x, self.y, self.z)
    }
}

/// Counters for debugging a capture session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    pub samples_acquired: u64,
    pub not_ready_polls: u64,
    pub triggers: u64,
    pub captures_emitted: u64,
    pub truncated_windows: u64,
    pub samples_streamed: u64,
    pub commands_applied: u64,
    pub tokens_ignored: u64,
}
