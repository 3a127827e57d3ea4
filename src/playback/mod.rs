//! Playback collaborator
//!
//! The assistant drives music through the `PlaybackService` trait. The
//! Spotify implementation talks to the Web API; `OfflinePlayback` stands in
//! when no credentials are configured.

pub mod auth;
pub mod service;
pub mod spotify;

pub use service::{
    ErrorKind, OfflinePlayback, PlaybackError, PlaybackResult, PlaybackService, RepeatMode,
};
pub use spotify::SpotifyClient;
