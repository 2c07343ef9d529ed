//! Stage-by-stage capture state machine.
//!
//! The sequencer is clock-agnostic: a driver calls [`CaptureSequencer::tick`]
//! on the evaluation interval, [`CaptureSequencer::countdown_tick`] on the
//! countdown sub-clock, and [`CaptureSequencer::capture_completed`] when the
//! encoder reports back. Every call returns the events it produced, in
//! order. All mutation goes through `&mut self`, so a single owner drives it.

use crate::capture::domain::capture_encoder::{CaptureError, ImageHandle};
use crate::capture::domain::capture_failure_policy::CaptureFailurePolicy;
use crate::capture::domain::sequencer_event::{SequencerEvent, StageArtifact};
use crate::classification::domain::pose_classifier::Orientation;
use crate::shared::config::SequenceConfig;
use crate::signals::signal_hub::SignalSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerState {
    AwaitingCondition { stage: usize },
    CountdownRunning { stage: usize, remaining: u32 },
    /// Capture requested; waiting on the encode result before moving on.
    AwaitingCapture { stage: usize },
    /// Every stage requested. Ticks are ignored; late encode results are
    /// still accepted until the completion event fires.
    Complete,
    Halted { stage: usize },
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownState {
    Idle,
    Running { remaining: u32, stage: usize },
}

/// Per-stage slot. Slots are appended strictly in stage order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtifactSlot {
    Pending,
    Captured(ImageHandle),
    Failed(CaptureError),
}

impl ArtifactSlot {
    fn resolved(&self) -> Option<StageArtifact> {
        match self {
            ArtifactSlot::Pending => None,
            ArtifactSlot::Captured(handle) => Some(StageArtifact::Captured(handle.clone())),
            ArtifactSlot::Failed(error) => Some(StageArtifact::Failed(error.clone())),
        }
    }
}

/// Display-facing summary of where the session stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceProgress {
    pub stage_index: usize,
    pub stage_count: usize,
    pub required: Option<Orientation>,
    pub countdown: CountdownState,
    pub finished: bool,
}

impl SequenceProgress {
    pub fn initial(required_orientations: &[Orientation]) -> Self {
        Self {
            stage_index: 0,
            stage_count: required_orientations.len(),
            required: required_orientations.first().copied(),
            countdown: CountdownState::Idle,
            finished: false,
        }
    }
}

pub struct CaptureSequencer {
    required: Vec<Orientation>,
    countdown_steps: u32,
    revalidate: bool,
    policy: CaptureFailurePolicy,
    state: SequencerState,
    artifacts: Vec<ArtifactSlot>,
    completion_emitted: bool,
}

impl CaptureSequencer {
    pub fn new(config: &SequenceConfig) -> Self {
        Self {
            required: config.required_orientations.clone(),
            countdown_steps: config.countdown_steps.max(1),
            revalidate: config.revalidate_during_countdown,
            policy: config.capture_failure_policy,
            state: SequencerState::AwaitingCondition { stage: 0 },
            artifacts: Vec::with_capacity(config.required_orientations.len()),
            completion_emitted: false,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn stage_count(&self) -> usize {
        self.required.len()
    }

    /// Index of the stage currently being worked on; `stage_count()` once complete.
    pub fn stage_index(&self) -> usize {
        match self.state {
            SequencerState::AwaitingCondition { stage }
            | SequencerState::CountdownRunning { stage, .. }
            | SequencerState::AwaitingCapture { stage }
            | SequencerState::Halted { stage } => stage,
            SequencerState::Complete => self.required.len(),
            SequencerState::Cancelled => self
                .artifacts
                .iter()
                .filter(|slot| **slot != ArtifactSlot::Pending)
                .count(),
        }
    }

    pub fn required_orientation(&self, stage: usize) -> Option<Orientation> {
        self.required.get(stage).copied()
    }

    pub fn countdown(&self) -> CountdownState {
        match self.state {
            SequencerState::CountdownRunning { stage, remaining } => {
                CountdownState::Running { remaining, stage }
            }
            _ => CountdownState::Idle,
        }
    }

    pub fn is_counting_down(&self) -> bool {
        matches!(self.state, SequencerState::CountdownRunning { .. })
    }

    /// No further events will ever be produced.
    pub fn is_finished(&self) -> bool {
        self.completion_emitted
            || matches!(
                self.state,
                SequencerState::Halted { .. } | SequencerState::Cancelled
            )
    }

    pub fn artifacts(&self) -> &[ArtifactSlot] {
        &self.artifacts
    }

    pub fn captured_count(&self) -> usize {
        self.artifacts
            .iter()
            .filter(|slot| matches!(slot, ArtifactSlot::Captured(_)))
            .count()
    }

    pub fn progress(&self) -> SequenceProgress {
        let stage_index = self.stage_index();
        SequenceProgress {
            stage_index,
            stage_count: self.required.len(),
            required: self.required_orientation(stage_index),
            countdown: self.countdown(),
            finished: self.is_finished(),
        }
    }

    /// Evaluation tick: starts a countdown when the current stage's gating
    /// condition holds on the sampled signals.
    pub fn tick(&mut self, snapshot: &SignalSnapshot) -> Vec<SequencerEvent> {
        let SequencerState::AwaitingCondition { stage } = self.state else {
            return Vec::new();
        };
        let Some(required) = self.required_orientation(stage) else {
            return Vec::new();
        };
        if !snapshot.signals.satisfies(required) {
            return Vec::new();
        }

        self.state = SequencerState::CountdownRunning {
            stage,
            remaining: self.countdown_steps,
        };
        vec![SequencerEvent::CountdownStarted {
            stage,
            remaining: self.countdown_steps,
        }]
    }

    /// Countdown sub-clock step. The gating condition is only re-checked
    /// when revalidation is enabled.
    pub fn countdown_tick(&mut self, snapshot: &SignalSnapshot) -> Vec<SequencerEvent> {
        let SequencerState::CountdownRunning { stage, remaining } = self.state else {
            return Vec::new();
        };
        let Some(orientation) = self.required_orientation(stage) else {
            return Vec::new();
        };

        if self.revalidate && !snapshot.signals.satisfies(orientation) {
            self.state = SequencerState::AwaitingCondition { stage };
            return vec![SequencerEvent::CountdownAborted { stage }];
        }

        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            self.state = SequencerState::CountdownRunning { stage, remaining };
            return vec![SequencerEvent::CountdownStep { stage, remaining }];
        }

        let mut events = vec![SequencerEvent::CaptureRequested {
            stage,
            orientation,
            frame: snapshot.frame.clone(),
        }];
        if self.policy.waits_for_result() {
            self.state = SequencerState::AwaitingCapture { stage };
        } else {
            self.artifacts.push(ArtifactSlot::Pending);
            self.advance_from(stage);
            events.extend(self.try_complete());
        }
        events
    }

    /// Encode result for `stage`. Results for unknown, already resolved or
    /// cancelled stages are dropped.
    pub fn capture_completed(
        &mut self,
        stage: usize,
        result: Result<ImageHandle, CaptureError>,
    ) -> Vec<SequencerEvent> {
        match self.state {
            SequencerState::Cancelled | SequencerState::Halted { .. } => {
                log::debug!("Ignoring capture result for stage {stage}: session stopped");
                Vec::new()
            }
            SequencerState::AwaitingCapture { stage: awaiting } if awaiting == stage => {
                self.resolve_awaited(stage, result)
            }
            _ if self.completion_emitted => {
                log::debug!("Ignoring capture result for stage {stage}: sequence complete");
                Vec::new()
            }
            _ => self.resolve_pending(stage, result),
        }
    }

    /// Tears the session down. Nothing is emitted afterwards.
    pub fn cancel(&mut self) {
        if self.completion_emitted {
            return;
        }
        if !self.is_finished() {
            log::debug!("Capture sequence cancelled at stage {}", self.stage_index());
        }
        self.state = SequencerState::Cancelled;
    }

    fn resolve_awaited(
        &mut self,
        stage: usize,
        result: Result<ImageHandle, CaptureError>,
    ) -> Vec<SequencerEvent> {
        match result {
            Ok(handle) => {
                self.artifacts.push(ArtifactSlot::Captured(handle.clone()));
                self.advance_from(stage);
                let mut events = vec![SequencerEvent::StageCaptured { stage, handle }];
                events.extend(self.try_complete());
                events
            }
            Err(error) => {
                let failed = SequencerEvent::CaptureFailed {
                    stage,
                    error: error.clone(),
                };
                if self.policy == CaptureFailurePolicy::Halt {
                    self.state = SequencerState::Halted { stage };
                    vec![failed, SequencerEvent::SequenceAborted { stage, error }]
                } else {
                    self.state = SequencerState::AwaitingCondition { stage };
                    vec![failed]
                }
            }
        }
    }

    fn resolve_pending(
        &mut self,
        stage: usize,
        result: Result<ImageHandle, CaptureError>,
    ) -> Vec<SequencerEvent> {
        let Some(slot) = self.artifacts.get_mut(stage) else {
            log::warn!("Capture result for stage {stage} that was never requested");
            return Vec::new();
        };
        if *slot != ArtifactSlot::Pending {
            log::warn!("Duplicate capture result for stage {stage}");
            return Vec::new();
        }

        let event = match result {
            Ok(handle) => {
                *slot = ArtifactSlot::Captured(handle.clone());
                SequencerEvent::StageCaptured { stage, handle }
            }
            Err(error) => {
                log::warn!("Capture for stage {stage} failed, continuing: {error}");
                *slot = ArtifactSlot::Failed(error.clone());
                SequencerEvent::CaptureFailed { stage, error }
            }
        };
        let mut events = vec![event];
        events.extend(self.try_complete());
        events
    }

    fn advance_from(&mut self, stage: usize) {
        let next = stage + 1;
        self.state = if next < self.required.len() {
            SequencerState::AwaitingCondition { stage: next }
        } else {
            SequencerState::Complete
        };
    }

    fn try_complete(&mut self) -> Option<SequencerEvent> {
        if self.state != SequencerState::Complete || self.completion_emitted {
            return None;
        }
        let artifacts = self
            .artifacts
            .iter()
            .map(ArtifactSlot::resolved)
            .collect::<Option<Vec<_>>>()?;
        self.completion_emitted = true;
        Some(SequencerEvent::SequenceComplete { artifacts })
    }
}
