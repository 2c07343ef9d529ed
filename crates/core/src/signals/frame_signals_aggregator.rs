use std::sync::Arc;
use std::time::Instant;

use crate::classification::domain::framing_validator::FramingValidator;
use crate::classification::domain::lighting_assessor::{LightingAssessor, LightingStatus};
use crate::classification::domain::pose_classifier::PoseClassifier;
use crate::detection::domain::face_observer::{FaceObservation, FaceObserver};
use crate::pipeline::session_logger::SessionLogger;
use crate::shared::config::GuidanceConfig;
use crate::shared::pixel_buffer::PixelBuffer;
use crate::shared::rect::Size;
use crate::signals::frame_signals::FrameSignals;
use crate::signals::signal_hub::{SignalHub, SignalSnapshot};

/// Per-frame producer: observes a frame, runs the three classifiers and
/// publishes the combined result to the [`SignalHub`].
///
/// Runs on the frame-delivery thread. Nothing here blocks on the sequencer.
pub struct FrameSignalsAggregator {
    observer: Box<dyn FaceObserver>,
    pose: PoseClassifier,
    framing: FramingValidator,
    lighting: LightingAssessor,
    viewport: Size,
    hub: Arc<SignalHub>,
    logger: Box<dyn SessionLogger>,
    frames_processed: usize,
}

impl FrameSignalsAggregator {
    pub fn new(
        config: &GuidanceConfig,
        observer: Box<dyn FaceObserver>,
        hub: Arc<SignalHub>,
        logger: Box<dyn SessionLogger>,
    ) -> Self {
        Self {
            observer,
            pose: PoseClassifier::new(config.pose.yaw_threshold),
            framing: FramingValidator::new(&config.framing),
            lighting: LightingAssessor::new(config.lighting.threshold),
            viewport: config.framing.viewport,
            hub,
            logger,
            frames_processed: 0,
        }
    }

    /// Display viewport the detector box is mapped into, e.g. after rotation.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn frames_processed(&self) -> usize {
        self.frames_processed
    }

    pub fn hub(&self) -> &Arc<SignalHub> {
        &self.hub
    }

    pub fn logger(&self) -> &dyn SessionLogger {
        self.logger.as_ref()
    }

    /// Classifies one observation against its frame without publishing.
    pub fn classify(
        &self,
        observation: &FaceObservation,
        frame: &PixelBuffer,
        captured_at: Instant,
    ) -> FrameSignals {
        let luminance = self.lighting.average_luminance(frame);
        self.combine(observation, luminance, captured_at)
    }

    /// Observes, classifies and publishes one frame.
    ///
    /// A detector error is logged and treated as "no face" for this frame.
    pub fn process(&mut self, frame: PixelBuffer, captured_at: Instant) -> Arc<SignalSnapshot> {
        let observation = match self.observer.observe(&frame) {
            Ok(observation) => observation,
            Err(e) => {
                log::warn!("Face observation failed, treating as no face: {e}");
                FaceObservation::none()
            }
        };

        let t0 = Instant::now();
        let luminance = self.lighting.average_luminance(&frame);
        self.logger
            .timing("lighting", t0.elapsed().as_secs_f64() * 1000.0);
        if let Some(l) = luminance {
            self.logger.metric("luminance", l);
        }

        let signals = self.combine(&observation, luminance, captured_at);
        self.frames_processed += 1;
        self.hub.publish(signals, Some(Arc::new(frame)))
    }

    /// Hands back the logger, e.g. for an end-of-session summary.
    pub fn into_logger(mut self) -> Box<dyn SessionLogger> {
        self.logger
            .metric("frames_processed", self.frames_processed as f64);
        self.logger
    }

    fn combine(
        &self,
        observation: &FaceObservation,
        luminance: Option<f64>,
        captured_at: Instant,
    ) -> FrameSignals {
        let face_box = observation.face_box().copied();
        FrameSignals {
            orientation: self.pose.classify(observation.yaw()),
            framing: self.framing.validate(face_box.as_ref(), self.viewport),
            lighting: luminance
                .map(|l| self.lighting.classify_luminance(l))
                .unwrap_or(LightingStatus::Low),
            face_box,
            luminance,
            captured_at,
        }
    }
}
