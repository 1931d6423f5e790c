use crate::models::sample::{Axis, AxisMask, Baseline, Sample, AXIS_COUNT};
use crate::models::trigger::{CombineLogic, EdgePolicy, ThresholdConfig, TriggerMode};

/// Bounds derived from the baseline and an offset: `baseline ± offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetBounds {
    pub positive: i32,
    pub negative: i32,
}

impl OffsetBounds {
    pub fn derive(baseline: i16, offset: u16) -> Self {
        Self {
            positive: baseline as i32 + offset as i32,
            negative: baseline as i32 - offset as i32,
        }
    }
}

/// Per-sample trigger evaluator.
///
/// Holds the calibrated baseline and the offset bounds derived from it.
/// Threshold values themselves are passed in on every call so the caller can
/// evaluate against a snapshot of the live configuration.
#[derive(Debug, Clone)]
pub struct ThresholdEngine {
    baseline: Baseline,
    offsets: [u16; AXIS_COUNT],
    bounds: [OffsetBounds; AXIS_COUNT],
}

impl ThresholdEngine {
    pub fn new(baseline: Baseline) -> Self {
        let mut engine = Self {
            baseline,
            offsets: [0; AXIS_COUNT],
            bounds: [OffsetBounds::derive(0, 0); AXIS_COUNT],
        };
        engine.rederive(&[0; AXIS_COUNT]);
        engine
    }

    pub fn baseline(&self) -> Baseline {
        self.baseline
    }

    /// Offset bounds for `axis` using the offsets last seen by `evaluate`.
    pub fn bounds(&self, axis: Axis) -> OffsetBounds {
        self.bounds[axis.index()]
    }

    /// Evaluate one sample. Returns whether the combined trigger condition holds.
    pub fn evaluate(&mut self, sample: &Sample, config: &ThresholdConfig) -> bool {
        let fired = self.axis_results(sample, config);
        combine(fired, config.axes, config.logic)
    }

    /// Per-axis results packed as bit0 = X, bit1 = Y, bit2 = Z.
    pub fn axis_results(&mut self, sample: &Sample, config: &ThresholdConfig) -> u8 {
        if config.mode == TriggerMode::Offset && config.offsets != self.offsets {
            self.rederive(&config.offsets);
        }

        Axis::ALL.iter().fold(0u8, |bits, &axis| {
            let value = sample.axis(axis);
            let fired = match config.mode {
                TriggerMode::Fixed => fixed_trigger(
                    value,
                    config.fixed_threshold(axis),
                    self.baseline.axis(axis),
                    config.edge,
                ),
                TriggerMode::Offset => offset_trigger(value, self.bounds[axis.index()], config.edge),
            };
            if fired {
                bits | axis.bit()
            } else {
                bits
            }
        })
    }

    fn rederive(&mut self, offsets: &[u16; AXIS_COUNT]) {
        self.offsets = *offsets;
        for axis in Axis::ALL {
            self.bounds[axis.index()] =
                OffsetBounds::derive(self.baseline.axis(axis), offsets[axis.index()]);
        }
    }
}

/// Fixed-threshold check for one axis.
///
/// Positive and negative edges only fire when the threshold sits on the
/// matching side of the baseline. `Both` compares magnitudes and never fires
/// when `|threshold| == |baseline|`.
pub fn fixed_trigger(sample: i16, threshold: i16, baseline: i16, edge: EdgePolicy) -> bool {
    match edge {
        EdgePolicy::Positive => threshold > baseline && sample >= threshold,
        EdgePolicy::Negative => threshold < baseline && sample <= threshold,
        EdgePolicy::Both => {
            let threshold_mag = (threshold as i32).abs();
            let baseline_mag = (baseline as i32).abs();
            let sample_mag = (sample as i32).abs();
            if threshold_mag > baseline_mag {
                sample_mag >= threshold_mag
            } else if threshold_mag < baseline_mag {
                sample_mag <= threshold_mag
            } else {
                false
            }
        }
    }
}

/// Offset-bounds check for one axis. `Both` is an exclusive-or: a sample past
/// both bounds at once (only possible when they cross) does not fire.
pub fn offset_trigger(sample: i16, bounds: OffsetBounds, edge: EdgePolicy) -> bool {
    let value = sample as i32;
    let above = value >= bounds.positive;
    let below = value <= bounds.negative;
    match edge {
        EdgePolicy::Positive => above,
        EdgePolicy::Negative => below,
        EdgePolicy::Both => above ^ below,
    }
}

/// Combine packed per-axis results over `mask`.
pub fn combine(fired: u8, mask: AxisMask, logic: CombineLogic) -> bool {
    let masked = fired & mask.bits();
    match logic {
        CombineLogic::And => masked == mask.bits(),
        CombineLogic::Or => masked != 0,
    }
}
