// NGS ATRAC9 player
// Streaming buffer and playback control for compressed-audio voices

pub mod config;
pub mod logging;
pub mod ngs;

pub use config::SystemOptions;
pub use logging::LogLevel;
