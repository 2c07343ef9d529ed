use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::capture::domain::capture_encoder::{CaptureEncoder, CaptureError};
use crate::capture::domain::capture_sequencer::SequenceProgress;
use crate::capture::domain::sequencer_event::{SequencerEvent, StageArtifact};
use crate::capture::infrastructure::threaded_capture_session::ThreadedCaptureSession;
use crate::detection::domain::face_observer::FaceObserver;
use crate::guidance::guidance_prompt::GuidancePrompt;
use crate::pipeline::session_logger::SessionLogger;
use crate::shared::config::GuidanceConfig;
use crate::shared::constants::DEFAULT_DRAIN_GRACE_MS;
use crate::shared::pixel_buffer::PixelBuffer;
use crate::signals::frame_signals_aggregator::FrameSignalsAggregator;
use crate::signals::signal_hub::SignalHub;

/// How a guided capture session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed(Vec<StageArtifact>),
    Aborted { stage: usize, error: CaptureError },
    /// Frames ran out before the sequence finished.
    Incomplete { progress: SequenceProgress },
    Cancelled,
}

/// What the caller is told while the session runs.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionUpdate {
    /// The instruction for the user changed.
    Prompt(GuidancePrompt),
    Event(SequencerEvent),
}

/// Guided multi-pose capture: frames → signals → hub → sequencer → events.
///
/// Frames are processed on the calling thread; the sequencer runs on its own
/// thread and only ever reads the latest published signals.
pub struct GuidedCaptureUseCase {
    config: GuidanceConfig,
    aggregator: FrameSignalsAggregator,
    encoder: Arc<dyn CaptureEncoder>,
    session_logger: Box<dyn SessionLogger>,
    frame_interval: Duration,
    drain_grace: Duration,
    cancelled: Arc<AtomicBool>,
}

impl GuidedCaptureUseCase {
    pub fn new(
        config: GuidanceConfig,
        observer: Box<dyn FaceObserver>,
        encoder: Arc<dyn CaptureEncoder>,
        frame_logger: Box<dyn SessionLogger>,
        session_logger: Box<dyn SessionLogger>,
    ) -> Self {
        let hub = Arc::new(SignalHub::new());
        let aggregator = FrameSignalsAggregator::new(&config, observer, hub, frame_logger);
        Self {
            config,
            aggregator,
            encoder,
            session_logger,
            frame_interval: Duration::ZERO,
            drain_grace: Duration::from_millis(DEFAULT_DRAIN_GRACE_MS),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Delay between frames, standing in for the camera's frame rate.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// How long to wait for a verdict once the frames run out.
    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Setting this flag stops the session before the next frame.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn hub(&self) -> Arc<SignalHub> {
        self.aggregator.hub().clone()
    }

    pub fn execute<I>(self, frames: I, on_update: &mut dyn FnMut(SessionUpdate)) -> SessionOutcome
    where
        I: IntoIterator<Item = PixelBuffer>,
    {
        let Self {
            config,
            mut aggregator,
            encoder,
            session_logger,
            frame_interval,
            drain_grace,
            cancelled,
        } = self;

        let mut session = ThreadedCaptureSession::spawn(
            &config.sequence,
            aggregator.hub().clone(),
            encoder,
            session_logger,
        );
        let mut last_prompt = None;
        let mut outcome = None;

        for frame in frames {
            if cancelled.load(Ordering::Relaxed) {
                outcome = Some(SessionOutcome::Cancelled);
                break;
            }

            let snapshot = aggregator.process(frame, Instant::now());
            if let Some(done) = drain_events(&session, on_update) {
                outcome = Some(done);
                break;
            }

            let prompt = GuidancePrompt::derive(&snapshot.signals, &session.progress());
            if last_prompt != Some(prompt) {
                last_prompt = Some(prompt);
                on_update(SessionUpdate::Prompt(prompt));
            }

            if !frame_interval.is_zero() {
                std::thread::sleep(frame_interval);
            }
        }

        let outcome = match outcome {
            Some(outcome) => outcome,
            None => await_verdict(&session, drain_grace, on_update).unwrap_or_else(|| {
                SessionOutcome::Incomplete {
                    progress: session.progress(),
                }
            }),
        };

        let logger = if outcome == SessionOutcome::Cancelled {
            session.cancel()
        } else {
            session.finish()
        };
        if let Some(logger) = logger {
            logger.summary();
        }
        aggregator.into_logger().summary();
        outcome
    }
}

fn terminal_outcome(event: &SequencerEvent) -> Option<SessionOutcome> {
    match event {
        SequencerEvent::SequenceComplete { artifacts } => {
            Some(SessionOutcome::Completed(artifacts.clone()))
        }
        SequencerEvent::SequenceAborted { stage, error } => Some(SessionOutcome::Aborted {
            stage: *stage,
            error: error.clone(),
        }),
        _ => None,
    }
}

fn drain_events(
    session: &ThreadedCaptureSession,
    on_update: &mut dyn FnMut(SessionUpdate),
) -> Option<SessionOutcome> {
    while let Ok(event) = session.events().try_recv() {
        let outcome = terminal_outcome(&event);
        on_update(SessionUpdate::Event(event));
        if outcome.is_some() {
            return outcome;
        }
    }
    None
}

fn await_verdict(
    session: &ThreadedCaptureSession,
    grace: Duration,
    on_update: &mut dyn FnMut(SessionUpdate),
) -> Option<SessionOutcome> {
    let deadline = Instant::now() + grace;
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        let event = session.events().recv_timeout(left).ok()?;
        let outcome = terminal_outcome(&event);
        on_update(SessionUpdate::Event(event));
        if outcome.is_some() {
            return outcome;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::domain::capture_encoder::ImageHandle;
    use crate::capture::domain::capture_failure_policy::CaptureFailurePolicy;
    use crate::capture::infrastructure::png_capture_encoder::PngCaptureEncoder;
    use crate::detection::domain::face_observer::FaceObservation;
    use crate::detection::infrastructure::scripted_face_observer::ScriptedFaceObserver;
    use crate::pipeline::session_logger::NullSessionLogger;
    use crate::shared::config::SequenceConfig;
    use crate::shared::pixel_buffer::PixelFormat;
    use crate::shared::rect::Rect;

    struct FailingEncoder;

    impl CaptureEncoder for FailingEncoder {
        fn encode(&self, _frame: &PixelBuffer) -> Result<ImageHandle, CaptureError> {
            Err(CaptureError::Encode("encoder unavailable".into()))
        }
    }

    struct CountingEncoder(Arc<std::sync::atomic::AtomicUsize>);

    impl CaptureEncoder for CountingEncoder {
        fn encode(&self, frame: &PixelBuffer) -> Result<ImageHandle, CaptureError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(ImageHandle::new(0, frame.width(), frame.height(), vec![0]))
        }
    }

    fn fast_config() -> GuidanceConfig {
        GuidanceConfig {
            sequence: SequenceConfig {
                tick_interval_ms: 5,
                countdown_steps: 2,
                countdown_step_ms: 2,
                ..SequenceConfig::default()
            },
            ..GuidanceConfig::default()
        }
    }

    fn centered(yaw: f64) -> FaceObservation {
        let w = 250.0 / 390.0;
        let h = 300.0 / 844.0;
        FaceObservation::face(yaw, Rect::new(0.5 - w / 2.0, 0.5 - h / 2.0, w, h))
    }

    fn frames(level: u8, n: usize) -> impl Iterator<Item = PixelBuffer> {
        std::iter::repeat_with(move || {
            PixelBuffer::uniform(16, 12, 8, PixelFormat::Bgra8, (level, level, level))
        })
        .take(n)
    }

    fn use_case(
        config: GuidanceConfig,
        script: Vec<(FaceObservation, usize)>,
        encoder: Arc<dyn CaptureEncoder>,
    ) -> GuidedCaptureUseCase {
        GuidedCaptureUseCase::new(
            config,
            Box::new(ScriptedFaceObserver::new(script)),
            encoder,
            Box::new(NullSessionLogger),
            Box::new(NullSessionLogger),
        )
        .with_frame_interval(Duration::from_millis(1))
        .with_drain_grace(Duration::from_secs(2))
    }

    #[test]
    fn test_scripted_session_captures_all_three_stages() {
        let per_stage = 150;
        let script = vec![
            (centered(0.0), per_stage),
            (centered(-0.5), per_stage),
            (centered(0.5), per_stage),
        ];
        let uc = use_case(fast_config(), script, Arc::new(PngCaptureEncoder::new()));

        let mut requests = Vec::new();
        let outcome = uc.execute(frames(150, per_stage * 3), &mut |update: SessionUpdate| {
            if let SessionUpdate::Event(SequencerEvent::CaptureRequested { stage, .. }) = update {
                requests.push(stage);
            }
        });

        assert_eq!(requests, vec![0, 1, 2]);
        match outcome {
            SessionOutcome::Completed(artifacts) => {
                assert_eq!(artifacts.len(), 3);
                assert!(artifacts.iter().all(|a| a.is_captured()));
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn test_dark_frames_never_capture() {
        let script = vec![(centered(0.0), 60)];
        let uc = use_case(fast_config(), script, Arc::new(PngCaptureEncoder::new()))
            .with_drain_grace(Duration::from_millis(20));

        let mut prompts = Vec::new();
        let mut events = 0;
        let outcome = uc.execute(frames(30, 60), &mut |update: SessionUpdate| match update {
            SessionUpdate::Prompt(p) => prompts.push(p),
            SessionUpdate::Event(_) => events += 1,
        });

        assert_eq!(events, 0);
        assert_eq!(prompts, vec![GuidancePrompt::TooDark]);
        match outcome {
            SessionOutcome::Incomplete { progress } => assert_eq!(progress.stage_index, 0),
            other => panic!("expected incomplete, got {other:?}"),
        }
    }

    #[test]
    fn test_cancel_flag_stops_before_first_frame() {
        let uc = use_case(fast_config(), vec![(centered(0.0), 10)], Arc::new(PngCaptureEncoder::new()));
        uc.cancel_flag().store(true, Ordering::Relaxed);
        let outcome = uc.execute(frames(150, 10), &mut |_| {});
        assert_eq!(outcome, SessionOutcome::Cancelled);
    }

    #[test]
    fn test_cancel_mid_countdown_tears_down_session() {
        let mut config = fast_config();
        config.sequence.countdown_step_ms = 300;
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let uc = use_case(
            config,
            vec![(centered(0.0), 400)],
            Arc::new(CountingEncoder(calls.clone())),
        );
        let cancel = uc.cancel_flag();

        let mut events = Vec::new();
        let outcome = uc.execute(frames(150, 400), &mut |update: SessionUpdate| {
            if let SessionUpdate::Event(event) = update {
                if matches!(event, SequencerEvent::CountdownStarted { .. }) {
                    cancel.store(true, Ordering::Relaxed);
                }
                events.push(event.kind());
            }
        });

        assert_eq!(outcome, SessionOutcome::Cancelled);
        assert_eq!(events, vec!["countdown_started"]);
        std::thread::sleep(Duration::from_millis(350));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_halt_policy_reports_aborted() {
        let mut config = fast_config();
        config.sequence.capture_failure_policy = CaptureFailurePolicy::Halt;
        let uc = use_case(config, vec![(centered(0.0), 200)], Arc::new(FailingEncoder));
        let outcome = uc.execute(frames(150, 200), &mut |_| {});
        assert!(matches!(
            outcome,
            SessionOutcome::Aborted {
                stage: 0,
                error: CaptureError::Encode(_)
            }
        ));
    }

    #[test]
    fn test_prompts_follow_the_script() {
        // No face, then a forward face far away, then centered
        let far = FaceObservation::face(0.0, Rect::new(0.4, 0.45, 100.0 / 390.0, 0.1));
        let script = vec![
            (FaceObservation::none(), 5),
            (far, 5),
            (centered(0.0), 5),
        ];
        let mut config = fast_config();
        config.sequence.tick_interval_ms = 10_000;
        let uc = use_case(config, script, Arc::new(PngCaptureEncoder::new()))
            .with_drain_grace(Duration::ZERO);

        let mut prompts = Vec::new();
        uc.execute(frames(150, 15), &mut |update: SessionUpdate| {
            if let SessionUpdate::Prompt(p) = update {
                prompts.push(p);
            }
        });
        assert_eq!(
            prompts,
            vec![
                GuidancePrompt::PositionFace,
                GuidancePrompt::MoveCloser,
                GuidancePrompt::HoldStill
            ]
        );
    }
}
