use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use crate::capture::domain::sequencer_event::SequencerEvent;

/// Cross-cutting logger for a guided capture session.
///
/// The frame processor reports per-frame timings and metrics; the sequencer
/// runner reports every event it emits.
pub trait SessionLogger: Send {
    /// Record how long a named processing stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. luminance, frame count).
    fn metric(&mut self, name: &str, value: f64);

    /// Record one sequencer event.
    fn event(&mut self, event: &SequencerEvent);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards everything. Used by tests.
pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn event(&mut self, _event: &SequencerEvent) {}
    fn info(&mut self, _message: &str) {}
}

/// Logger backed by the `log` facade that also keeps per-stage timings,
/// metrics and event counts for an end-of-session report.
pub struct LogSessionLogger {
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    event_counts: BTreeMap<&'static str, usize>,
    start_time: Instant,
    messages: Vec<String>,
}

impl LogSessionLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            metrics: HashMap::new(),
            event_counts: BTreeMap::new(),
            start_time: Instant::now(),
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty()
            && self.metrics.is_empty()
            && self.event_counts.is_empty()
            && self.messages.is_empty()
        {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!("Session summary ({:.1}s):", elapsed_ms / 1000.0)];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.2}ms  total {total_ms:7.1}ms  ({} frames)",
                durations.len()
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let avg = values.iter().sum::<f64>() / values.len().max(1) as f64;
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        for (kind, count) in &self.event_counts {
            lines.push(format!("  {kind}: {count}"));
        }

        for message in &self.messages {
            lines.push(format!("  - {message}"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    pub fn event_count(&self, kind: &str) -> usize {
        self.event_counts.get(kind).copied().unwrap_or(0)
    }
}

impl Default for LogSessionLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLogger for LogSessionLogger {
    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn event(&mut self, event: &SequencerEvent) {
        *self.event_counts.entry(event.kind()).or_default() += 1;
        match event {
            SequencerEvent::CountdownStep { .. } => log::debug!("{event}"),
            SequencerEvent::CaptureFailed { .. } | SequencerEvent::SequenceAborted { .. } => {
                log::warn!("{event}")
            }
            _ => log::info!("{event}"),
        }
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
