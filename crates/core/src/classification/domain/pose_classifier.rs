use serde::{Deserialize, Serialize};

use crate::shared::constants::DEFAULT_YAW_THRESHOLD;

/// Discrete head orientation derived from the yaw angle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Forward,
    Left,
    Right,
    Undetected,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Forward => write!(f, "Facing Forward"),
            Orientation::Left => write!(f, "Facing Left"),
            Orientation::Right => write!(f, "Facing Right"),
            Orientation::Undetected => write!(f, "No face detected"),
        }
    }
}

/// Maps yaw (radians) to an [`Orientation`] with symmetric thresholds.
///
/// Sign convention: positive yaw beyond `+threshold` is `Left`, negative
/// yaw beyond `-threshold` is `Right`. Exactly `±threshold` stays
/// `Forward`. Each call is a pure function of its input; jitter is
/// absorbed by the sequencer, not here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseClassifier {
    threshold: f64,
}

impl PoseClassifier {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.abs(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `yaw` is `None` when no face was detected.
    pub fn classify(&self, yaw: Option<f64>) -> Orientation {
        match yaw {
            None => Orientation::Undetected,
            Some(y) if y.is_nan() => Orientation::Undetected,
            Some(y) if y > self.threshold => Orientation::Left,
            Some(y) if y < -self.threshold => Orientation::Right,
            Some(_) => Orientation::Forward,
        }
    }
}

impl Default for PoseClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_YAW_THRESHOLD)
    }
}
