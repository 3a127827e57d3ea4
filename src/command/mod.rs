//! Command execution pipeline
//!
//! Converts parser output into playback operations and replies:
//! ParseResult -> Command -> CommandDispatcher -> PlaybackService -> Outcome

pub mod action;
pub mod dispatcher;

pub use action::{Command, Rejection, PLAY_VERBS};
pub use dispatcher::{CommandDispatcher, Outcome};
