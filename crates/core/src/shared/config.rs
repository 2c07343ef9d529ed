use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::domain::capture_failure_policy::CaptureFailurePolicy;
use crate::classification::domain::framing_validator::OversizeStatus;
use crate::classification::domain::pose_classifier::Orientation;
use crate::shared::constants::*;
use crate::shared::rect::Size;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    pub yaw_threshold: f64,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            yaw_threshold: DEFAULT_YAW_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    pub oval_width: f64,
    pub oval_height: f64,
    pub min_face_width: f64,
    pub max_face_width: f64,
    pub oversize_status: OversizeStatus,
    pub viewport: Size,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            oval_width: DEFAULT_OVAL_WIDTH,
            oval_height: DEFAULT_OVAL_HEIGHT,
            min_face_width: DEFAULT_MIN_FACE_WIDTH,
            max_face_width: DEFAULT_MAX_FACE_WIDTH,
            oversize_status: OversizeStatus::default(),
            viewport: Size::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub threshold: f64,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_LUMINANCE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub tick_interval_ms: u64,
    pub countdown_steps: u32,
    pub countdown_step_ms: u64,
    pub required_orientations: Vec<Orientation>,
    pub revalidate_during_countdown: bool,
    pub capture_failure_policy: CaptureFailurePolicy,
}

impl SequenceConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn countdown_step(&self) -> Duration {
        Duration::from_millis(self.countdown_step_ms)
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            countdown_steps: DEFAULT_COUNTDOWN_STEPS,
            countdown_step_ms: DEFAULT_COUNTDOWN_STEP_MS,
            required_orientations: vec![Orientation::Forward, Orientation::Right, Orientation::Left],
            revalidate_during_countdown: false,
            capture_failure_policy: CaptureFailurePolicy::default(),
        }
    }
}

/// Every tunable of a guided capture session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceConfig {
    pub pose: PoseConfig,
    pub framing: FramingConfig,
    pub lighting: LightingConfig,
    pub sequence: SequenceConfig,
}

impl GuidanceConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Config from the user config directory, falling back to defaults.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring config: {e}");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!(
                    "{name} must be a positive number, got {value}"
                )))
            }
        }

        positive("pose.yaw_threshold", self.pose.yaw_threshold)?;
        positive("framing.oval_width", self.framing.oval_width)?;
        positive("framing.oval_height", self.framing.oval_height)?;
        positive("framing.min_face_width", self.framing.min_face_width)?;
        positive("framing.max_face_width", self.framing.max_face_width)?;
        positive("framing.viewport.width", self.framing.viewport.width)?;
        positive("framing.viewport.height", self.framing.viewport.height)?;
        positive("lighting.threshold", self.lighting.threshold)?;

        if self.framing.min_face_width > self.framing.max_face_width {
            return Err(ConfigError::Invalid(format!(
                "framing.min_face_width ({}) exceeds framing.max_face_width ({})",
                self.framing.min_face_width, self.framing.max_face_width
            )));
        }

        let seq = &self.sequence;
        if seq.required_orientations.is_empty() {
            return Err(ConfigError::Invalid(
                "sequence.required_orientations must not be empty".into(),
            ));
        }
        if seq.required_orientations.contains(&Orientation::Undetected) {
            return Err(ConfigError::Invalid(
                "sequence.required_orientations cannot require an undetected face".into(),
            ));
        }
        if seq.countdown_steps == 0 {
            return Err(ConfigError::Invalid(
                "sequence.countdown_steps must be at least 1".into(),
            ));
        }
        if seq.tick_interval_ms == 0 || seq.countdown_step_ms == 0 {
            return Err(ConfigError::Invalid(
                "sequence intervals must be at least 1 ms".into(),
            ));
        }
        Ok(())
    }
}
