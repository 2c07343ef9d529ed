//! User-facing instruction derived from the latest signals.
//!
//! Exactly one prompt is shown at a time. Distance problems take priority
//! over a missing face, which takes priority over lighting, then
//! containment, then orientation.

use crate::capture::domain::capture_sequencer::{CountdownState, SequenceProgress};
use crate::classification::domain::framing_validator::FramingStatus;
use crate::classification::domain::lighting_assessor::LightingStatus;
use crate::classification::domain::pose_classifier::Orientation;
use crate::signals::frame_signals::FrameSignals;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuidancePrompt {
    MoveCloser,
    PositionFace,
    TooDark,
    MoveBack,
    LookStraight,
    TurnLeft,
    TurnRight,
    HoldStill,
    Countdown(u32),
    Done,
    /// The session halted or was cancelled before every stage was captured.
    Stopped,
}

impl GuidancePrompt {
    pub fn derive(signals: &FrameSignals, progress: &SequenceProgress) -> Self {
        if progress.finished {
            return if progress.stage_index >= progress.stage_count {
                GuidancePrompt::Done
            } else {
                GuidancePrompt::Stopped
            };
        }
        if let CountdownState::Running { remaining, .. } = progress.countdown {
            return GuidancePrompt::Countdown(remaining);
        }

        if signals.framing == FramingStatus::TooFar {
            return GuidancePrompt::MoveCloser;
        }
        if signals.orientation == Orientation::Undetected {
            return GuidancePrompt::PositionFace;
        }
        if signals.lighting == LightingStatus::Low {
            return GuidancePrompt::TooDark;
        }
        if !signals.is_face_in_oval() {
            return GuidancePrompt::MoveBack;
        }

        match progress.required {
            Some(required) if required != signals.orientation => match required {
                Orientation::Forward | Orientation::Undetected => GuidancePrompt::LookStraight,
                Orientation::Left => GuidancePrompt::TurnLeft,
                Orientation::Right => GuidancePrompt::TurnRight,
            },
            _ => GuidancePrompt::HoldStill,
        }
    }
}

impl std::fmt::Display for GuidancePrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuidancePrompt::MoveCloser => write!(f, "Move closer"),
            GuidancePrompt::PositionFace => write!(f, "Position your face inside the oval"),
            GuidancePrompt::TooDark => write!(f, "Too dark"),
            GuidancePrompt::MoveBack => write!(f, "Move back into the oval"),
            GuidancePrompt::LookStraight => write!(f, "Look straight ahead"),
            GuidancePrompt::TurnLeft => write!(f, "Turn left"),
            GuidancePrompt::TurnRight => write!(f, "Turn right"),
            GuidancePrompt::HoldStill => write!(f, "Hold still"),
            GuidancePrompt::Countdown(n) => write!(f, "{n}"),
            GuidancePrompt::Done => write!(f, "Done"),
            GuidancePrompt::Stopped => write!(f, "Capture stopped"),
        }
    }
}

/// Pass/fail state of the three status badges plus one marker per stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusIndicators {
    pub lighting_ok: bool,
    pub framing_ok: bool,
    pub orientation_ok: bool,
    /// `true` for every stage already past.
    pub stages_done: Vec<bool>,
}

impl StatusIndicators {
    pub fn derive(signals: &FrameSignals, progress: &SequenceProgress) -> Self {
        Self {
            lighting_ok: signals.lighting == LightingStatus::Adequate,
            framing_ok: signals.is_face_in_oval(),
            orientation_ok: progress.required == Some(signals.orientation),
            stages_done: (0..progress.stage_count)
                .map(|i| i < progress.stage_index)
                .collect(),
        }
    }
}
