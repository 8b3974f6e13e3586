//! Core utilities shared by the viewer crates.
//!
//! - Error types and result aliases
//! - Logging initialization
//! - Frame timer
//! - Viewer configuration

mod config;
mod error;
mod logging;
mod timer;

pub use config::ViewerConfig;
pub use error::{Error, Result};
pub use logging::{DEFAULT_FILTER, init_logging};
pub use timer::Timer;
