pub mod png_capture_encoder;
pub mod threaded_capture_session;
