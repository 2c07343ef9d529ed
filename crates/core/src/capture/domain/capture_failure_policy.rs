use serde::{Deserialize, Serialize};

/// What the sequencer does when encoding a stage's capture fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureFailurePolicy {
    /// Move on to the next stage right after the capture is requested; a
    /// failed encode leaves a `Failed` artifact in that stage's slot.
    #[default]
    Advance,
    /// Wait for the encode result and re-arm the same stage on failure.
    RetryStage,
    /// Wait for the encode result and stop the sequence on failure.
    Halt,
}

impl CaptureFailurePolicy {
    pub fn waits_for_result(self) -> bool {
        !matches!(self, CaptureFailurePolicy::Advance)
    }
}
