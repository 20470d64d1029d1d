//! Error types for Cinematch.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Catalog load error: {0}")]
    Load(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Unknown title: {0}")]
    UnknownTitle(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
