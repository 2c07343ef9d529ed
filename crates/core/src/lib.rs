pub mod capture;
pub mod classification;
pub mod detection;
pub mod guidance;
pub mod pipeline;
pub mod shared;
pub mod signals;
