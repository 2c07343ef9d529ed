use std::time::Instant;

use crate::classification::domain::framing_validator::FramingStatus;
use crate::classification::domain::lighting_assessor::LightingStatus;
use crate::classification::domain::pose_classifier::Orientation;
use crate::shared::rect::Rect;

/// Immutable classification result for one processed frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSignals {
    pub orientation: Orientation,
    pub framing: FramingStatus,
    pub lighting: LightingStatus,
    /// Detector box, normalized with a bottom-left origin.
    pub face_box: Option<Rect>,
    /// Mean luma, absent when the buffer was malformed.
    pub luminance: Option<f64>,
    pub captured_at: Instant,
}

impl FrameSignals {
    /// Signals before any frame has been processed: nothing satisfies gating.
    pub fn initial(captured_at: Instant) -> Self {
        Self {
            orientation: Orientation::Undetected,
            framing: FramingStatus::OutOfFrame,
            lighting: LightingStatus::Low,
            face_box: None,
            luminance: None,
            captured_at,
        }
    }

    pub fn is_face_in_oval(&self) -> bool {
        self.framing == FramingStatus::Normal
    }

    /// Framing normal, lighting adequate and the face turned as required.
    pub fn satisfies(&self, required: Orientation) -> bool {
        self.is_face_in_oval()
            && self.lighting == LightingStatus::Adequate
            && self.orientation == required
    }
}
