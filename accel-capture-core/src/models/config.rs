use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;
use super::trigger::ThresholdConfig;

/// Sensor output data rate, one of the sixteen hardware settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct OutputDataRate(u8);

impl OutputDataRate {
    const HZ: [f64; 16] = [
        0.781, 1.563, 3.125, 6.25, 12.5, 25.0, 50.0, 100.0, 200.0, 400.0, 800.0, 1600.0, 3200.0,
        6400.0, 12800.0, 25600.0,
    ];

    pub const HZ_100: OutputDataRate = OutputDataRate(0x7);
    pub const HZ_25600: OutputDataRate = OutputDataRate(0xF);

    /// Look up a rate by its register code (0x0..=0xF).
    pub fn from_code(code: u8) -> Option<Self> {
        if (code as usize) < Self::HZ.len() {
            Some(OutputDataRate(code))
        } else {
            None
        }
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn hz(self) -> f64 {
        Self::HZ[self.0 as usize]
    }
}

impl TryFrom<u8> for OutputDataRate {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        OutputDataRate::from_code(code).ok_or_else(|| format!("unknown output data rate code: {}", code))
    }
}

impl From<OutputDataRate> for u8 {
    fn from(odr: OutputDataRate) -> Self {
        odr.0
    }
}

/// Full-scale measurement range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GRange {
    G2,
    G4,
    G8,
    G16,
}

impl GRange {
    pub fn from_g(g: u8) -> Option<Self> {
        match g {
            2 => Some(Self::G2),
            4 => Some(Self::G4),
            8 => Some(Self::G8),
            16 => Some(Self::G16),
            _ => None,
        }
    }

    pub fn g(self) -> u8 {
        match self {
            Self::G2 => 2,
            Self::G4 => 4,
            Self::G8 => 8,
            Self::G16 => 16,
        }
    }

    /// Signed 16-bit counts corresponding to 1 g at this range.
    pub fn counts_per_g(self) -> i32 {
        32768 / self.g() as i32
    }
}

impl TryFrom<u8> for GRange {
    type Error = String;

    fn try_from(g: u8) -> Result<Self, Self::Error> {
        GRange::from_g(g).ok_or_else(|| format!("unsupported g-range: {}", g))
    }
}

impl From<GRange> for u8 {
    fn from(range: GRange) -> Self {
        range.g()
    }
}

/// Static acquisition mode, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseMode {
    Streaming,
    Triggered,
}

/// How the session asks the sensor for data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// Busy-poll the data-ready flag before each read.
    Sync,
    /// Read whatever is in the output registers; may repeat samples.
    Async,
}

/// Startup configuration for a capture session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureConfiguration {
    pub output_data_rate: OutputDataRate,
    pub g_range: GRange,
    pub use_mode: UseMode,
    pub read_mode: ReadMode,

    /// Samples per axis held by each ring buffer. Must be a power of two.
    pub buffer_capacity: usize,

    pub threshold: ThresholdConfig,
    pub time_before_ms: u32,
    pub time_after_ms: u32,

    /// Samples averaged by the baseline calibration.
    pub calibration_samples: u32,

    /// Give up on a sync poll after this long (None = wait forever).
    pub ready_timeout_ms: Option<u64>,
}

/// Upper bound that keeps the signed 32-bit calibration sum from overflowing.
pub const MAX_CALIBRATION_SAMPLES: u32 = 65_535;

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_capacity == 0 || !self.buffer_capacity.is_power_of_two() {
            return Err(format!(
                "buffer capacity must be a non-zero power of two, got {}",
                self.buffer_capacity
            ));
        }
        if self.calibration_samples == 0 {
            return Err("calibration sample count must be positive".into());
        }
        if self.calibration_samples > MAX_CALIBRATION_SAMPLES {
            return Err(format!(
                "calibration sample count {} exceeds {}",
                self.calibration_samples, MAX_CALIBRATION_SAMPLES
            ));
        }
        Ok(())
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.output_data_rate.hz()
    }

    pub fn from_json_str(json: &str) -> Result<Self, CaptureError> {
        serde_json::from_str(json)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("failed to parse configuration: {}", e)))
    }

    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, CaptureError> {
        let json = fs::read_to_string(path).map_err(|e| {
            CaptureError::ConfigurationFailed(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, CaptureError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("failed to serialize configuration: {}", e)))
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            output_data_rate: OutputDataRate::HZ_25600,
            g_range: GRange::G8,
            use_mode: UseMode::Triggered,
            read_mode: ReadMode::Sync,
            buffer_capacity: 1 << 21,
            threshold: ThresholdConfig::default(),
            time_before_ms: 10,
            time_after_ms: 10,
            calibration_samples: 5000,
            ready_timeout_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample::AxisMask;
    use crate::models::trigger::{EdgePolicy, TriggerMode};
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_valid() {
        let config = CaptureConfiguration::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.sample_rate_hz(), 25600.0);
        assert_eq!(config.g_range.g(), 8);
    }

    #[test]
    fn odr_table_lookup() {
        assert_relative_eq!(OutputDataRate::from_code(0).unwrap().hz(), 0.781);
        assert_relative_eq!(OutputDataRate::from_code(3).unwrap().hz(), 6.25);
        assert_relative_eq!(OutputDataRate::HZ_100.hz(), 100.0);
        assert!(OutputDataRate::from_code(16).is_none());
    }

    #[test]
    fn rejects_non_power_of_two_capacity() {
        let config = CaptureConfiguration {
            buffer_capacity: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CaptureConfiguration {
            buffer_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_calibration_count_out_of_range() {
        let config = CaptureConfiguration {
            calibration_samples: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CaptureConfiguration {
            calibration_samples: MAX_CALIBRATION_SAMPLES + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_takes_defaults() {
        let json = r#"{
            "outputDataRate": 7,
            "gRange": 2,
            "useMode": "streaming",
            "bufferCapacity": 1024,
            "threshold": {
                "mode": "offset",
                "edge": "positive",
                "logic": "and",
                "axes": "xz",
                "fixedThresholds": [1, 2, 3],
                "offsets": [10, 20, 30]
            }
        }"#;
        let config = CaptureConfiguration::from_json_str(json).unwrap();
        assert_eq!(config.output_data_rate, OutputDataRate::HZ_100);
        assert_eq!(config.g_range, GRange::G2);
        assert_eq!(config.use_mode, UseMode::Streaming);
        assert_eq!(config.read_mode, ReadMode::Sync);
        assert_eq!(config.buffer_capacity, 1024);
        assert_eq!(config.threshold.mode, TriggerMode::Offset);
        assert_eq!(config.threshold.edge, EdgePolicy::Positive);
        assert_eq!(config.threshold.axes, AxisMask::XZ);
        assert_eq!(config.threshold.offsets, [10, 20, 30]);
        assert_eq!(config.time_before_ms, 10);
    }

    #[test]
    fn json_rejects_unknown_odr_code() {
        let err = CaptureConfiguration::from_json_str(r#"{"outputDataRate": 16}"#).unwrap_err();
        assert!(matches!(err, CaptureError::ConfigurationFailed(_)));
    }

    #[test]
    fn json_round_trip_preserves_configuration() {
        let config = CaptureConfiguration {
            ready_timeout_ms: Some(250),
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(CaptureConfiguration::from_json_str(&json).unwrap(), config);
    }
}
