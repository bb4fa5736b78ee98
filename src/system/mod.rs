//! Process-level concerns: logging setup and shutdown signals

pub mod logging;
pub mod signal;

pub use logging::init_logging;
