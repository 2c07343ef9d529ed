use crate::shared::pixel_buffer::PixelBuffer;
use crate::shared::rect::Rect;

/// Raw per-frame measurements from the face detector.
///
/// `bounding_box` is normalized to `[0, 1]` with a bottom-left origin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceObservation {
    pub face_detected: bool,
    pub yaw_radians: f64,
    pub bounding_box: Option<Rect>,
}

impl FaceObservation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn face(yaw_radians: f64, bounding_box: Rect) -> Self {
        Self {
            face_detected: true,
            yaw_radians,
            bounding_box: Some(bounding_box),
        }
    }

    /// Yaw, or `None` when no face was found.
    pub fn yaw(&self) -> Option<f64> {
        self.face_detected.then_some(self.yaw_radians)
    }

    /// Bounding box, or `None` when no face was found.
    pub fn face_box(&self) -> Option<&Rect> {
        if self.face_detected {
            self.bounding_box.as_ref()
        } else {
            None
        }
    }
}

/// Domain interface for the face/pose detection collaborator.
///
/// Implementations may be stateful (e.g., tracking across frames),
/// hence `&mut self`.
pub trait FaceObserver: Send {
    fn observe(&mut self, frame: &PixelBuffer) -> Result<FaceObservation, Box<dyn std::error::Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_has_no_yaw_or_box() {
        let obs = FaceObservation::none();
        assert!(obs.yaw().is_none());
        assert!(obs.face_box().is_none());
    }

    #[test]
    fn test_stale_box_ignored_without_detection() {
        let obs = FaceObservation {
            face_detected: false,
            yaw_radians: 0.5,
            bounding_box: Some(Rect::new(0.1, 0.1, 0.5, 0.5)),
        };
        assert!(obs.yaw().is_none());
        assert!(obs.face_box().is_none());
    }

    #[test]
    fn test_face_exposes_measurements() {
        let rect = Rect::new(0.2, 0.3, 0.4, 0.4);
        let obs = FaceObservation::face(-0.1, rect);
        assert_eq!(obs.yaw(), Some(-0.1));
        assert_eq!(obs.face_box(), Some(&rect));
    }
}
