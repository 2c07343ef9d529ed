use serde::{Deserialize, Serialize};

use crate::shared::config::FramingConfig;
use crate::shared::rect::{Rect, Size};

/// Where the face sits relative to the target oval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramingStatus {
    Normal,
    TooFar,
    TooClose,
    OutOfFrame,
}

impl std::fmt::Display for FramingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FramingStatus::Normal => write!(f, "Normal"),
            FramingStatus::TooFar => write!(f, "Too Far"),
            FramingStatus::TooClose => write!(f, "Too Close"),
            FramingStatus::OutOfFrame => write!(f, "Out of Range"),
        }
    }
}

/// Status reported for a contained face wider than `max_face_width`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversizeStatus {
    #[default]
    TooClose,
    OutOfFrame,
}

impl From<OversizeStatus> for FramingStatus {
    fn from(value: OversizeStatus) -> Self {
        match value {
            OversizeStatus::TooClose => FramingStatus::TooClose,
            OversizeStatus::OutOfFrame => FramingStatus::OutOfFrame,
        }
    }
}

/// Checks a detected face box against a target oval centered in the viewport.
///
/// Containment is tested against the oval's bounding rectangle; only then is
/// the face width compared with `[min_face_width, max_face_width]`.
#[derive(Clone, Debug, PartialEq)]
pub struct FramingValidator {
    oval: Size,
    min_face_width: f64,
    max_face_width: f64,
    oversize: OversizeStatus,
}

impl FramingValidator {
    pub fn new(config: &FramingConfig) -> Self {
        Self {
            oval: Size::new(config.oval_width, config.oval_height),
            min_face_width: config.min_face_width,
            max_face_width: config.max_face_width,
            oversize: config.oversize_status,
        }
    }

    /// Bounding rectangle of the target oval for the given viewport.
    pub fn target_rect(&self, viewport: Size) -> Rect {
        Rect::centered(viewport.width / 2.0, viewport.height / 2.0, self.oval)
    }

    /// `face` is the detector box, normalized with a bottom-left origin.
    pub fn validate(&self, face: Option<&Rect>, viewport: Size) -> FramingStatus {
        let Some(face) = face else {
            return FramingStatus::OutOfFrame;
        };
        if viewport.is_degenerate() || !face.is_finite() {
            return FramingStatus::OutOfFrame;
        }

        let face_rect = Rect::from_normalized_bottom_left(face, viewport);
        if !self.target_rect(viewport).contains(&face_rect) {
            return FramingStatus::OutOfFrame;
        }

        if face_rect.width < self.min_face_width {
            FramingStatus::TooFar
        } else if face_rect.width > self.max_face_width {
            self.oversize.into()
        } else {
            FramingStatus::Normal
        }
    }
}

impl Default for FramingValidator {
    fn default() -> Self {
        Self::new(&FramingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const VIEWPORT: Size = Size {
        width: 400.0,
        height: 800.0,
    };

    /// Normalized box of `width` x `height` viewport units, centered in `VIEWPORT`.
    fn centered_face(width: f64, height: f64) -> Rect {
        let w = width / VIEWPORT.width;
        let h = height / VIEWPORT.height;
        Rect::new(0.5 - w / 2.0, 0.5 - h / 2.0, w, h)
    }

    #[test]
    fn test_no_face_is_out_of_frame() {
        let v = FramingValidator::default();
        assert_eq!(v.validate(None, VIEWPORT), FramingStatus::OutOfFrame);
    }

    #[rstest]
    #[case(Size::new(0.0, 0.0))]
    #[case(Size::new(0.0, 800.0))]
    #[case(Size::new(400.0, f64::NAN))]
    fn test_degenerate_viewport_is_out_of_frame(#[case] viewport: Size) {
        let v = FramingValidator::default();
        let face = centered_face(250.0, 300.0);
        assert_eq!(v.validate(Some(&face), viewport), FramingStatus::OutOfFrame);
    }

    #[rstest]
    #[case(180.0, FramingStatus::Normal)]
    #[case(250.0, FramingStatus::Normal)]
    #[case(320.0, FramingStatus::Normal)]
    #[case(179.0, FramingStatus::TooFar)]
    #[case(60.0, FramingStatus::TooFar)]
    #[case(321.0, FramingStatus::TooClose)]
    #[case(350.0, FramingStatus::TooClose)]
    fn test_width_bands_inside_oval(#[case] width: f64, #[case] expected: FramingStatus) {
        let v = FramingValidator::default();
        let face = centered_face(width, 300.0);
        assert_eq!(v.validate(Some(&face), VIEWPORT), expected);
    }

    #[test]
    fn test_oversize_policy_out_of_frame() {
        let config = FramingConfig {
            oversize_status: OversizeStatus::OutOfFrame,
            ..FramingConfig::default()
        };
        let v = FramingValidator::new(&config);
        let face = centered_face(340.0, 300.0);
        assert_eq!(v.validate(Some(&face), VIEWPORT), FramingStatus::OutOfFrame);
    }

    #[test]
    fn test_box_wider_than_oval_is_out_of_frame() {
        let v = FramingValidator::default();
        let face = centered_face(360.0, 300.0);
        assert_eq!(v.validate(Some(&face), VIEWPORT), FramingStatus::OutOfFrame);
    }

    #[test]
    fn test_boxes_outside_oval_are_out_of_frame_regardless_of_width() {
        let v = FramingValidator::default();
        for width in [50.0, 180.0, 250.0, 320.0] {
            let w = width / VIEWPORT.width;
            // Hugging the left edge of the viewport, oval starts at x = 25
            let face = Rect::new(0.0, 0.4, w, 0.2);
            assert_eq!(
                v.validate(Some(&face), VIEWPORT),
                FramingStatus::OutOfFrame,
                "width {width}"
            );
        }
    }

    #[test]
    fn test_vertical_overhang_is_out_of_frame() {
        let v = FramingValidator::default();
        // Oval spans y in [175, 625] of 800. A box at detector y = 0.05
        // (near the bottom) lands at viewport y in [600, 760]: overhangs.
        let face = Rect::new(0.2, 0.05, 0.6, 0.2);
        assert_eq!(v.validate(Some(&face), VIEWPORT), FramingStatus::OutOfFrame);

        // A box near the detector top maps to [40, 200]: also outside.
        let top = Rect::new(0.2, 0.75, 0.6, 0.2);
        assert_eq!(v.validate(Some(&top), VIEWPORT), FramingStatus::OutOfFrame);

        // Box at detector y = 0.35 maps to viewport y in [360, 520]: inside.
        let middle = Rect::new(0.2, 0.35, 0.6, 0.2);
        assert_eq!(v.validate(Some(&middle), VIEWPORT), FramingStatus::Normal);
    }

    #[test]
    fn test_non_finite_box_is_out_of_frame() {
        let v = FramingValidator::default();
        let face = Rect::new(f64::NAN, 0.4, 0.5, 0.2);
        assert_eq!(v.validate(Some(&face), VIEWPORT), FramingStatus::OutOfFrame);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(FramingStatus::TooFar.to_string(), "Too Far");
        assert_eq!(FramingStatus::OutOfFrame.to_string(), "Out of Range");
    }
}
