pub mod frame_signals;
pub mod frame_signals_aggregator;
pub mod signal_hub;
