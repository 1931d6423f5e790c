use super::error::CaptureError;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → calibrating → armed → post-trigger → emit ─┐
///                        ↑                          │
///                        └──────────────────────────┘
/// idle → calibrating → streaming
/// (any running state) → stopped / failed
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Calibrating,
    Armed,
    /// `remaining` counts down as post-trigger samples arrive.
    PostTrigger { trigger_slot: usize, remaining: usize },
    Emit { trigger_slot: usize },
    Streaming,
    Stopped,
    Failed(CaptureError),
}

impl CaptureState {
    /// Whether the acquisition loop is in one of its running states.
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            Self::Armed | Self::PostTrigger { .. } | Self::Emit { .. } | Self::Streaming
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed(_))
    }

    /// Ring slot of the sample that fired the current capture, if one is in progress.
    pub fn trigger_slot(&self) -> Option<usize> {
        match self {
            Self::PostTrigger { trigger_slot, .. } | Self::Emit { trigger_slot } => {
                Some(*trigger_slot)
            }
            _ => None,
        }
    }
}
