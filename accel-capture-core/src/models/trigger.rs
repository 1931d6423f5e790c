use serde::{Deserialize, Serialize};

use super::sample::{Axis, AxisMask, AXIS_COUNT};
use crate::processing::window::WindowSpec;

/// Which threshold table drives trigger detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Absolute per-axis thresholds, polarity judged against the baseline.
    Fixed,
    /// Unsigned per-axis offsets applied symmetrically around the baseline.
    Offset,
}

/// Which side of a threshold fires a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    Positive,
    Negative,
    Both,
}

impl EdgePolicy {
    /// Parse the command form: `pos`, `neg`, `both`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pos" => Some(Self::Positive),
            "neg" => Some(Self::Negative),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

/// How per-axis results combine over the configured `AxisMask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineLogic {
    /// Every masked axis must fire on the same sample.
    And,
    /// Any masked axis firing suffices.
    Or,
}

impl CombineLogic {
    /// Parse `and` / `or`, or the numeric form (`0` = and, `1` = or).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "and" | "0" => Some(Self::And),
            "or" | "1" => Some(Self::Or),
            _ => None,
        }
    }
}

/// Threshold configuration for the trigger evaluator.
///
/// Both threshold tables are retained so switching `mode` at runtime
/// restores the previously configured values of the other table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdConfig {
    pub mode: TriggerMode,
    pub edge: EdgePolicy,
    pub logic: CombineLogic,
    pub axes: AxisMask,
    pub fixed_thresholds: [i16; AXIS_COUNT],
    pub offsets: [u16; AXIS_COUNT],
}

impl ThresholdConfig {
    pub fn fixed_threshold(&self, axis: Axis) -> i16 {
        self.fixed_thresholds[axis.index()]
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            mode: TriggerMode::Fixed,
            edge: EdgePolicy::Both,
            logic: CombineLogic::Or,
            axes: AxisMask::XYZ,
            fixed_thresholds: [8000; AXIS_COUNT],
            offsets: [8000; AXIS_COUNT],
        }
    }
}

/// Everything the command thread may change while acquisition is running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerSettings {
    pub threshold: ThresholdConfig,
    pub window: WindowSpec,
}
