//! Contract of the playback collaborator
//!
//! The dispatcher only talks to this trait. Failures are typed so the
//! assistant can explain each kind to the user and keep the session going.

use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

/// Repeat setting of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Repeat the current track
    Track,
    /// Repeat the current album or playlist
    Context,
    Off,
}

impl RepeatMode {
    /// Value expected by the Spotify API
    pub fn as_str(self) -> &'static str {
        match self {
            RepeatMode::Track => "track",
            RepeatMode::Context => "context",
            RepeatMode::Off => "off",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("No playback device configured (set RASPO_DEVICE_NAME or pass --device)")]
    NoDeviceConfigured,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Track not found: {0}")]
    TrackNotFound(String),

    #[error("Volume delta {0} outside [-100, 100]")]
    InvalidVolumeDelta(i32),

    #[error("Spotify API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Coarse classification used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Device,
    NotFound,
    Other,
}

impl PlaybackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlaybackError::Auth(_) | PlaybackError::Api { status: 401, .. } => ErrorKind::Auth,
            PlaybackError::NoDeviceConfigured
            | PlaybackError::DeviceNotFound(_)
            | PlaybackError::Api { status: 404, .. } => ErrorKind::Device,
            PlaybackError::TrackNotFound(_) => ErrorKind::NotFound,
            PlaybackError::InvalidVolumeDelta(_)
            | PlaybackError::Api { .. }
            | PlaybackError::Transport(_) => ErrorKind::Other,
        }
    }
}

pub type PlaybackResult = Result<(), PlaybackError>;

/// Operations the assistant can ask of a music player
pub trait PlaybackService {
    /// Search a track and start it on `device` (or the default device)
    fn play(
        &self,
        track_query: &str,
        device: Option<&str>,
    ) -> impl Future<Output = PlaybackResult> + Send;

    fn pause(&self) -> impl Future<Output = PlaybackResult> + Send;

    fn resume(&self) -> impl Future<Output = PlaybackResult> + Send;

    fn next(&self) -> impl Future<Output = PlaybackResult> + Send;

    fn previous(&self) -> impl Future<Output = PlaybackResult> + Send;

    /// Change the volume by `delta` percent, `delta` in [-100, 100]
    fn set_volume_delta(&self, delta: i32) -> impl Future<Output = PlaybackResult> + Send;

    fn set_shuffle(&self, enabled: bool) -> impl Future<Output = PlaybackResult> + Send;

    fn set_repeat(&self, mode: RepeatMode) -> impl Future<Output = PlaybackResult> + Send;
}

/// Stand-in used when Spotify is not configured
///
/// Every playback request fails with an authentication error carrying the
/// reason, so conversation commands keep working.
#[derive(Debug, Clone)]
pub struct OfflinePlayback {
    reason: String,
}

impl OfflinePlayback {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail(&self) -> PlaybackResult {
        Err(PlaybackError::Auth(self.reason.clone()))
    }
}

impl PlaybackService for OfflinePlayback {
    async fn play(&self, _track_query: &str, _device: Option<&str>) -> PlaybackResult {
        self.fail()
    }

    async fn pause(&self) -> PlaybackResult {
        self.fail()
    }

    async fn resume(&self) -> PlaybackResult {
        self.fail()
    }

    async fn next(&self) -> PlaybackResult {
        self.fail()
    }

    async fn previous(&self) -> PlaybackResult {
        self.fail()
    }

    async fn set_volume_delta(&self, _delta: i32) -> PlaybackResult {
        self.fail()
    }

    async fn set_shuffle(&self, _enabled: bool) -> PlaybackResult {
        self.fail()
    }

    async fn set_repeat(&self, _mode: RepeatMode) -> PlaybackResult {
        self.fail()
    }
}
