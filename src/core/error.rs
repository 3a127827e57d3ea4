use thiserror::Error;

use crate::playback::PlaybackError;

#[derive(Error, Debug)]
pub enum GigiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid rule tables: {0}")]
    InvalidRules(String),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GigiError>;
