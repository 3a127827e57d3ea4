pub mod config;
pub mod error;

pub use config::{AssistantConfig, SpotifyConfig};
pub use error::{GigiError, Result};
