//! Mean-luma lighting check over a raw camera frame.
//!
//! Luma uses the BT.601 weights `0.299 R + 0.587 G + 0.114 B`. This runs on
//! every frame and dominates per-frame cost, so the loop walks a borrowed
//! stride-aware view and never allocates.

use ndarray::Axis;
use serde::{Deserialize, Serialize};

use crate::shared::constants::DEFAULT_LUMINANCE_THRESHOLD;
use crate::shared::pixel_buffer::PixelBuffer;

const RED_WEIGHT: f64 = 0.299;
const GREEN_WEIGHT: f64 = 0.587;
const BLUE_WEIGHT: f64 = 0.114;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingStatus {
    Adequate,
    Low,
}

impl std::fmt::Display for LightingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LightingStatus::Adequate => write!(f, "normal"),
            LightingStatus::Low => write!(f, "dark"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightingAssessor {
    threshold: f64,
}

impl LightingAssessor {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Mean luma on a 0-255 scale, or `None` for a malformed buffer.
    pub fn average_luminance(&self, buffer: &PixelBuffer) -> Option<f64> {
        let view = match buffer.as_ndarray() {
            Ok(view) => view,
            Err(e) => {
                log::debug!("Skipping luminance for malformed buffer: {e}");
                return None;
            }
        };
        let (ro, go, bo) = buffer.format().rgb_offsets();

        let total: f64 = view
            .lanes(Axis(2))
            .into_iter()
            .map(|px| {
                RED_WEIGHT * px[ro] as f64 + GREEN_WEIGHT * px[go] as f64 + BLUE_WEIGHT * px[bo] as f64
            })
            .sum();

        Some(total / buffer.pixel_count() as f64)
    }

    /// Strictly above the threshold is `Adequate`.
    pub fn classify_luminance(&self, luminance: f64) -> LightingStatus {
        if luminance > self.threshold {
            LightingStatus::Adequate
        } else {
            LightingStatus::Low
        }
    }

    /// Fails closed: a malformed buffer is reported as `Low`.
    pub fn assess(&self, buffer: &PixelBuffer) -> LightingStatus {
        match self.average_luminance(buffer) {
            Some(luminance) => self.classify_luminance(luminance),
            None => LightingStatus::Low,
        }
    }
}

impl Default for LightingAssessor {
    fn default() -> Self {
        Self::new(DEFAULT_LUMINANCE_THRESHOLD)
    }
}
