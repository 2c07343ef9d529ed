use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use crossbeam_channel::{select, Receiver, Sender};

use crate::capture::domain::capture_encoder::{CaptureEncoder, CaptureError, ImageHandle};
use crate::capture::domain::capture_sequencer::{CaptureSequencer, SequenceProgress};
use crate::capture::domain::sequencer_event::SequencerEvent;
use crate::pipeline::session_logger::SessionLogger;
use crate::shared::config::SequenceConfig;
use crate::shared::pixel_buffer::PixelBuffer;
use crate::signals::signal_hub::SignalHub;

type EncodeResult = (usize, Result<ImageHandle, CaptureError>);

/// Drives a [`CaptureSequencer`] on a dedicated thread.
///
/// Layout: `evaluation tick | countdown tick | encode results → sequencer → events`
///
/// The worker loads one [`SignalSnapshot`](crate::signals::signal_hub::SignalSnapshot)
/// from the [`SignalHub`] per tick and never touches the frame producer. Capture requests are encoded
/// on short-lived threads so a slow encoder cannot stall the clocks.
pub struct ThreadedCaptureSession {
    events: Receiver<SequencerEvent>,
    cancel_tx: Sender<()>,
    cancelled: Arc<AtomicBool>,
    progress: Arc<ArcSwap<SequenceProgress>>,
    worker: Option<JoinHandle<Box<dyn SessionLogger>>>,
}

impl ThreadedCaptureSession {
    pub fn spawn(
        config: &SequenceConfig,
        hub: Arc<SignalHub>,
        encoder: Arc<dyn CaptureEncoder>,
        logger: Box<dyn SessionLogger>,
    ) -> Self {
        let (event_tx, events) = crossbeam_channel::unbounded::<SequencerEvent>();
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let progress = Arc::new(ArcSwap::from_pointee(SequenceProgress::initial(
            &config.required_orientations,
        )));

        let worker = SessionWorker {
            sequencer: CaptureSequencer::new(config),
            hub,
            encoder,
            logger,
            event_tx,
            cancelled: cancelled.clone(),
            progress: progress.clone(),
            tick_interval: config.tick_interval(),
            countdown_step: config.countdown_step(),
        };
        let handle = std::thread::spawn(move || worker.run(cancel_rx));

        Self {
            events,
            cancel_tx,
            cancelled,
            progress,
            worker: Some(handle),
        }
    }

    /// Sequencer events in emission order.
    pub fn events(&self) -> &Receiver<SequencerEvent> {
        &self.events
    }

    /// Latest progress published by the worker.
    pub fn progress(&self) -> SequenceProgress {
        self.progress.load().as_ref().clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Stops the worker and waits for it, handing back its logger. Events
    /// not yet received are discarded; the receiver yields nothing afterwards.
    pub fn cancel(&mut self) -> Option<Box<dyn SessionLogger>> {
        self.stop();
        let logger = self.join_worker();
        while self.events.try_recv().is_ok() {}
        logger
    }

    /// Stops the worker if it is still running and hands back its logger.
    /// Events already sent stay readable.
    pub fn finish(mut self) -> Option<Box<dyn SessionLogger>> {
        self.stop();
        self.join_worker()
    }

    fn stop(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let _ = self.cancel_tx.try_send(());
    }

    fn join_worker(&mut self) -> Option<Box<dyn SessionLogger>> {
        let handle = self.worker.take()?;
        match handle.join() {
            Ok(logger) => Some(logger),
            Err(_) => {
                log::error!("Capture session worker panicked");
                None
            }
        }
    }
}

impl Drop for ThreadedCaptureSession {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.cancel();
        }
    }
}

enum Wake {
    Cancel,
    Evaluate,
    Countdown,
    Encoded(usize, Result<ImageHandle, CaptureError>),
}

struct SessionWorker {
    sequencer: CaptureSequencer,
    hub: Arc<SignalHub>,
    encoder: Arc<dyn CaptureEncoder>,
    logger: Box<dyn SessionLogger>,
    event_tx: Sender<SequencerEvent>,
    cancelled: Arc<AtomicBool>,
    progress: Arc<ArcSwap<SequenceProgress>>,
    tick_interval: Duration,
    countdown_step: Duration,
}

impl SessionWorker {
    fn run(mut self, cancel_rx: Receiver<()>) -> Box<dyn SessionLogger> {
        let evaluation = crossbeam_channel::tick(self.tick_interval);
        let mut countdown: Receiver<Instant> = crossbeam_channel::never();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<EncodeResult>();
        self.logger.info(&format!(
            "Capture session started with {} stages",
            self.sequencer.stage_count()
        ));

        loop {
            let wake = select! {
                recv(cancel_rx) -> _ => Wake::Cancel,
                recv(evaluation) -> _ => Wake::Evaluate,
                recv(countdown) -> _ => Wake::Countdown,
                recv(result_rx) -> msg => match msg {
                    Ok((stage, result)) => Wake::Encoded(stage, result),
                    Err(_) => Wake::Cancel,
                },
            };
            // A cancel racing a ready clock must not reach the sequencer.
            if matches!(wake, Wake::Cancel) || self.is_cancelled() {
                self.sequencer.cancel();
                break;
            }

            let events = match wake {
                Wake::Evaluate => self.sequencer.tick(&self.hub.snapshot()),
                Wake::Countdown => self.sequencer.countdown_tick(&self.hub.snapshot()),
                Wake::Encoded(stage, result) => self.sequencer.capture_completed(stage, result),
                Wake::Cancel => Vec::new(),
            };

            if events
                .iter()
                .any(|e| matches!(e, SequencerEvent::CountdownStarted { .. }))
            {
                countdown = crossbeam_channel::tick(self.countdown_step);
            } else if !self.sequencer.is_counting_down() {
                countdown = crossbeam_channel::never();
            }

            for event in &events {
                if let SequencerEvent::CaptureRequested { stage, frame, .. } = event {
                    self.request_capture(*stage, frame.clone(), &result_tx);
                }
            }

            if !self.forward(events) {
                self.sequencer.cancel();
                break;
            }
            self.progress.store(Arc::new(self.sequencer.progress()));

            if self.sequencer.is_finished() {
                break;
            }
        }

        let progress = self.sequencer.progress();
        self.logger.info(&format!(
            "Capture session stopped at stage {} of {} ({} captured)",
            progress.stage_index,
            progress.stage_count,
            self.sequencer.captured_count()
        ));
        self.logger
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Forwards events in order. Returns false once the session is cancelled.
    fn forward(&mut self, events: Vec<SequencerEvent>) -> bool {
        for event in events {
            if self.is_cancelled() {
                return false;
            }
            self.logger.event(&event);
            if self.event_tx.send(event).is_err() {
                log::debug!("Event receiver dropped, stopping capture session");
                return false;
            }
        }
        true
    }

    fn request_capture(
        &self,
        stage: usize,
        frame: Option<Arc<PixelBuffer>>,
        result_tx: &Sender<EncodeResult>,
    ) {
        if self.is_cancelled() {
            log::debug!("Session cancelled, not encoding stage {stage}");
            return;
        }
        let Some(frame) = frame else {
            let _ = result_tx.send((stage, Err(CaptureError::NoFrame)));
            return;
        };
        let encoder = self.encoder.clone();
        let tx = result_tx.clone();
        std::thread::spawn(move || {
            let result = encoder.encode(&frame);
            let _ = tx.send((stage, result));
        });
    }
}
