/// Yaw magnitude (radians) beyond which a face counts as turned.
pub const DEFAULT_YAW_THRESHOLD: f64 = 0.2;

/// Target oval size in viewport units.
pub const DEFAULT_OVAL_WIDTH: f64 = 350.0;
pub const DEFAULT_OVAL_HEIGHT: f64 = 450.0;

/// Accepted face width range (viewport units) for a `Normal` framing.
pub const DEFAULT_MIN_FACE_WIDTH: f64 = 180.0;
pub const DEFAULT_MAX_FACE_WIDTH: f64 = 320.0;

/// Display viewport used when none is configured (portrait phone, in points).
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 390.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 844.0;

/// Mean luma (0-255) that must be exceeded for adequate lighting.
pub const DEFAULT_LUMINANCE_THRESHOLD: f64 = 100.0;

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_COUNTDOWN_STEPS: u32 = 3;
pub const DEFAULT_COUNTDOWN_STEP_MS: u64 = 1000;

/// How long a session waits for outstanding work once frames stop arriving.
pub const DEFAULT_DRAIN_GRACE_MS: u64 = 500;

pub const CONFIG_DIR_NAME: &str = "PoseGuide";
pub const CONFIG_FILE_NAME: &str = "config.json";
