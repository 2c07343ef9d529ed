use std::path::Path;

use serde::Deserialize;

use poseguide_core::detection::domain::face_observer::FaceObservation;
use poseguide_core::shared::pixel_buffer::{PixelBuffer, PixelFormat};
use poseguide_core::shared::rect::Rect;

/// A scripted measurement stream standing in for camera and detector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub frame: FrameSpec,
    pub segments: Vec<Segment>,
}

/// Geometry of the synthetic BGRA frames.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrameSpec {
    pub width: u32,
    pub height: u32,
    /// Extra bytes at the end of every row.
    pub padding: usize,
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self {
            width: 64,
            height: 48,
            padding: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Segment {
    /// `null` means no face in view.
    pub face: Option<ScriptedFace>,
    pub luminance: u8,
    pub frames: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptedFace {
    pub yaw: f64,
    /// Normalized `[x, y, w, h]`, bottom-left origin.
    pub bbox: [f64; 4],
}

impl Script {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read script {}: {e}", path.display()))?;
        let script: Self = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid script {}: {e}", path.display()))?;
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.frame.width == 0 || self.frame.height == 0 {
            return Err(format!(
                "Frame size must be non-zero, got {}x{}",
                self.frame.width, self.frame.height
            )
            .into());
        }
        if self.segments.is_empty() {
            return Err("Script has no segments".into());
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if let Some(face) = &segment.face {
                if face.bbox.iter().any(|v| !v.is_finite()) || face.bbox[2] < 0.0 || face.bbox[3] < 0.0 {
                    return Err(format!("Segment {i}: bbox must be finite with non-negative size").into());
                }
            }
        }
        Ok(())
    }

    pub fn total_frames(&self) -> usize {
        self.segments.iter().map(|s| s.frames).sum()
    }

    /// One `(observation, frame count)` entry per segment.
    pub fn observations(&self) -> Vec<(FaceObservation, usize)> {
        self.segments
            .iter()
            .map(|s| {
                let observation = match &s.face {
                    Some(face) => {
                        let [x, y, w, h] = face.bbox;
                        FaceObservation::face(face.yaw, Rect::new(x, y, w, h))
                    }
                    None => FaceObservation::none(),
                };
                (observation, s.frames)
            })
            .collect()
    }

    /// Uniform gray frames, one per scripted frame, in segment order.
    pub fn frames(&self) -> impl Iterator<Item = PixelBuffer> + '_ {
        let geometry = self.frame;
        self.segments.iter().flat_map(move |s| {
            let level = s.luminance;
            std::iter::repeat_with(move || {
                PixelBuffer::uniform(
                    geometry.width,
                    geometry.height,
                    geometry.padding,
                    PixelFormat::Bgra8,
                    (level, level, level),
                )
            })
            .take(s.frames)
        })
    }
}
