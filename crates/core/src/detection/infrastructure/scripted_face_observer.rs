use std::collections::VecDeque;

use crate::detection::domain::face_observer::{FaceObservation, FaceObserver};
use crate::shared::pixel_buffer::PixelBuffer;

/// Replays a fixed schedule of observations, one per observed frame.
///
/// Each segment repeats its observation for `frames` frames. Once the
/// schedule runs out every further frame reports no face.
pub struct ScriptedFaceObserver {
    segments: VecDeque<(FaceObservation, usize)>,
    frames_observed: usize,
}

impl ScriptedFaceObserver {
    pub fn new(segments: Vec<(FaceObservation, usize)>) -> Self {
        Self {
            segments: segments.into_iter().filter(|(_, n)| *n > 0).collect(),
            frames_observed: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn frames_observed(&self) -> usize {
        self.frames_observed
    }

    pub fn frames_remaining(&self) -> usize {
        self.segments.iter().map(|(_, n)| n).sum()
    }

    fn next_observation(&mut self) -> FaceObservation {
        let Some((observation, remaining)) = self.segments.front_mut() else {
            return FaceObservation::none();
        };
        let result = observation.clone();
        *remaining -= 1;
        if *remaining == 0 {
            self.segments.pop_front();
        }
        result
    }
}

impl FaceObserver for ScriptedFaceObserver {
    fn observe(
        &mut self,
        _frame: &PixelBuffer,
    ) -> Result<FaceObservation, Box<dyn std::error::Error>> {
        self.frames_observed += 1;
        Ok(self.next_observation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::pixel_buffer::PixelFormat;
    use crate::shared::rect::Rect;

    fn frame() -> PixelBuffer {
        PixelBuffer::uniform(2, 2, 0, PixelFormat::Bgra8, (0, 0, 0))
    }

    fn face(yaw: f64) -> FaceObservation {
        FaceObservation::face(yaw, Rect::new(0.2, 0.3, 0.6, 0.3))
    }

    #[test]
    fn test_segments_repeat_then_advance() {
        let mut observer = ScriptedFaceObserver::new(vec![(face(0.0), 2), (face(0.5), 1)]);
        assert_eq!(observer.frames_remaining(), 3);

        let f = frame();
        assert_eq!(observer.observe(&f).unwrap().yaw(), Some(0.0));
        assert_eq!(observer.observe(&f).unwrap().yaw(), Some(0.0));
        assert_eq!(observer.observe(&f).unwrap().yaw(), Some(0.5));
        assert!(observer.is_exhausted());
        assert_eq!(observer.frames_observed(), 3);
    }

    #[test]
    fn test_exhausted_script_reports_no_face() {
        let mut observer = ScriptedFaceObserver::new(vec![(face(0.0), 1)]);
        let f = frame();
        observer.observe(&f).unwrap();
        let obs = observer.observe(&f).unwrap();
        assert!(!obs.face_detected);
    }

    #[test]
    fn test_zero_length_segments_are_dropped() {
        let mut observer = ScriptedFaceObserver::new(vec![(face(0.9), 0), (face(-0.9), 1)]);
        assert_eq!(observer.observe(&frame()).unwrap().yaw(), Some(-0.9));
    }
}
