pub mod config;
pub mod constants;
pub mod pixel_buffer;
pub mod rect;
