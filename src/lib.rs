//! Gigi - voice assistant for Spotify
//!
//! Interprets short French commands ("Mets Stromae Santé", "pause la
//! musique", "active le mode aléatoire") and drives a Spotify Connect
//! device.

pub mod command;
pub mod core;
pub mod nlp;
pub mod playback;
