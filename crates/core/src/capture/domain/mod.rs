pub mod capture_encoder;
pub mod capture_failure_policy;
pub mod capture_sequencer;
pub mod sequencer_event;
