use std::sync::Arc;

use crate::capture::domain::capture_encoder::{CaptureError, ImageHandle};
use crate::classification::domain::pose_classifier::Orientation;
use crate::shared::pixel_buffer::PixelBuffer;

/// Final per-stage result handed to the session owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageArtifact {
    Captured(ImageHandle),
    Failed(CaptureError),
}

impl StageArtifact {
    pub fn handle(&self) -> Option<&ImageHandle> {
        match self {
            StageArtifact::Captured(handle) => Some(handle),
            StageArtifact::Failed(_) => None,
        }
    }

    pub fn is_captured(&self) -> bool {
        matches!(self, StageArtifact::Captured(_))
    }
}

/// Externally observable sequencer transitions, in emission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequencerEvent {
    CountdownStarted { stage: usize, remaining: u32 },
    CountdownStep { stage: usize, remaining: u32 },
    /// Gating failed on a countdown re-check; the stage is re-armed.
    CountdownAborted { stage: usize },
    /// The encoder should capture `frame`, the raw frame sampled with the
    /// signals that passed the gate. `None` when no frame was published.
    CaptureRequested {
        stage: usize,
        orientation: Orientation,
        frame: Option<Arc<PixelBuffer>>,
    },
    StageCaptured { stage: usize, handle: ImageHandle },
    CaptureFailed { stage: usize, error: CaptureError },
    SequenceComplete { artifacts: Vec<StageArtifact> },
    SequenceAborted { stage: usize, error: CaptureError },
}

impl SequencerEvent {
    /// Stable name used for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SequencerEvent::CountdownStarted { .. } => "countdown_started",
            SequencerEvent::CountdownStep { .. } => "countdown_step",
            SequencerEvent::CountdownAborted { .. } => "countdown_aborted",
            SequencerEvent::CaptureRequested { .. } => "capture_requested",
            SequencerEvent::StageCaptured { .. } => "stage_captured",
            SequencerEvent::CaptureFailed { .. } => "capture_failed",
            SequencerEvent::SequenceComplete { .. } => "sequence_complete",
            SequencerEvent::SequenceAborted { .. } => "sequence_aborted",
        }
    }

    /// True for events after which the sequencer emits nothing more.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SequencerEvent::SequenceComplete { .. } | SequencerEvent::SequenceAborted { .. }
        )
    }
}

impl std::fmt::Display for SequencerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequencerEvent::CountdownStarted { stage, remaining } => {
                write!(f, "stage {stage}: countdown started ({remaining})")
            }
            SequencerEvent::CountdownStep { stage, remaining } => {
                write!(f, "stage {stage}: {remaining}")
            }
            SequencerEvent::CountdownAborted { stage } => {
                write!(f, "stage {stage}: countdown aborted")
            }
            SequencerEvent::CaptureRequested { stage, orientation, .. } => {
                write!(f, "stage {stage}: capture requested ({orientation})")
            }
            SequencerEvent::StageCaptured { stage, handle } => write!(
                f,
                "stage {stage}: captured {}x{} ({} bytes)",
                handle.width(),
                handle.height(),
                handle.bytes().len()
            ),
            SequencerEvent::CaptureFailed { stage, error } => {
                write!(f, "stage {stage}: capture failed: {error}")
            }
            SequencerEvent::SequenceComplete { artifacts } => {
                let captured = artifacts.iter().filter(|a| a.is_captured()).count();
                write!(f, "sequence complete ({captured}/{} captured)", artifacts.len())
            }
            SequencerEvent::SequenceAborted { stage, error } => {
                write!(f, "sequence aborted at stage {stage}: {error}")
            }
        }
    }
}
