//! Assistant and Spotify configuration
//!
//! Spotify credentials come from the environment, the way the assistant is
//! deployed on the speaker box. Everything else has documented defaults.

use std::path::PathBuf;

use crate::core::error::{GigiError, Result};

/// Spotify Web API base URL
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Spotify accounts service (authorization and token endpoints)
pub const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// OAuth scopes needed to read and drive playback
pub const SPOTIFY_SCOPE: &str = "user-read-playback-state user-modify-playback-state";

/// Connection settings for the Spotify playback service
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Device used when a command does not name one
    pub default_device: Option<String>,
    /// Where the OAuth token cache is stored
    pub cache_path: PathBuf,
    pub api_url: String,
    pub accounts_url: String,
}

impl SpotifyConfig {
    /// Create a config from environment variables
    ///
    /// Required: CLIENT_ID, CLIENT_SECRET, REDIRECT_URI
    /// Optional: RASPO_DEVICE_NAME (default device)
    /// Optional: SPOTIFY_CACHE_PATH (defaults to ~/.config/spotify_cache/.cache)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SpotifyConfig::from_env`] with an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            value(key).ok_or_else(|| GigiError::Config(format!("{} not set", key)))
        };

        let client_id = required("CLIENT_ID")?;
        let client_secret = required("CLIENT_SECRET")?;
        let redirect_uri = required("REDIRECT_URI")?;
        let cache_path = value("SPOTIFY_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_cache_path(value("HOME")));

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            default_device: value("RASPO_DEVICE_NAME"),
            cache_path,
            api_url: SPOTIFY_API_URL.into(),
            accounts_url: SPOTIFY_ACCOUNTS_URL.into(),
        })
    }

    /// Replace the default device (command line override)
    pub fn with_default_device(mut self, device: Option<String>) -> Self {
        if device.is_some() {
            self.default_device = device;
        }
        self
    }
}

fn default_cache_path(home: Option<String>) -> PathBuf {
    home.map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("spotify_cache")
        .join(".cache")
}

/// Behaviour of the interactive assistant
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Volume change applied by "monte" / "baisse", in percent
    ///
    /// Spotify volumes go from 0 to 100, so 10 gives ten steps.
    pub volume_step: i32,

    /// Inputs that end the session (compared case-insensitively)
    pub exit_words: Vec<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            volume_step: 10,
            exit_words: vec!["exit".into(), "quit".into()],
        }
    }
}

impl AssistantConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(1..=100).contains(&self.volume_step) {
            return Err(format!(
                "volume_step ({}) should be between 1 and 100",
                self.volume_step
            ));
        }

        if self.exit_words.is_empty() {
            return Err("At least one exit word is required".into());
        }

        if let Some(word) = self
            .exit_words
            .iter()
            .find(|w| w.trim().is_empty() || w.to_lowercase() != **w)
        {
            return Err(format!("exit word {:?} should be non-empty lower case", word));
        }

        Ok(())
    }

    /// Whether the input is one of the session sentinels
    pub fn is_exit_word(&self, input: &str) -> bool {
        let input = input.trim().to_lowercase();
        self.exit_words.iter().any(|w| *w == input)
    }
}
