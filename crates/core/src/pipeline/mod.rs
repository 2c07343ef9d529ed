pub mod guided_capture_use_case;
pub mod session_logger;
