//! Cinematch Core — error taxonomy and configuration.

pub mod config;
pub mod error;

pub use config::{EngineConfig, DEFAULT_SCORE, DEFAULT_TOP_K};
pub use error::{Error, Result};
