//! Typed commands built from parser output

use crate::nlp::parser::{ParseResult, SALUTATION_ACTION};
use crate::playback::RepeatMode;

/// Action identifiers that start playback of the object
pub const PLAY_VERBS: [&str; 6] = ["mets", "met", "joue", "jouer", "lance", "balance"];

/// What the assistant was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Greet,
    Play { query: String },
    Pause,
    Stop,
    Resume,
    VolumeUp,
    VolumeDown,
    Next,
    Previous,
    Shuffle(bool),
    Repeat(RepeatMode),
    Joke,
    Time,
    Mood,
}

/// Why a parse result does not translate into a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The parser found no action
    Unrecognized,
    /// A play verb without anything to play
    MissingPayload,
    /// An action identifier the assistant has no handler for
    UnknownAction(String),
}

impl Command {
    pub fn from_parse(parsed: &ParseResult) -> Result<Self, Rejection> {
        let Some(action) = parsed.action() else {
            return Err(Rejection::Unrecognized);
        };
        let object = parsed.object().unwrap_or_default();

        let command = match action {
            SALUTATION_ACTION => Command::Greet,
            verb if PLAY_VERBS.contains(&verb) => {
                if object.is_empty() {
                    return Err(Rejection::MissingPayload);
                }
                Command::Play {
                    query: object.to_string(),
                }
            }
            "pause" => Command::Pause,
            "stop" => Command::Stop,
            "reprends" | "reprend" => Command::Resume,
            "monte" | "augmente" => Command::VolumeUp,
            "baisse" | "diminue" => Command::VolumeDown,
            "suivant" => Command::Next,
            "précédent" => Command::Previous,
            "shuffle_on" => Command::Shuffle(true),
            "shuffle_off" => Command::Shuffle(false),
            "repeat_track" => Command::Repeat(RepeatMode::Track),
            "repeat_context" => Command::Repeat(RepeatMode::Context),
            "repeat_off" => Command::Repeat(RepeatMode::Off),
            "blague" => Command::Joke,
            "heure" => Command::Time,
            "humeur" => Command::Mood,
            other => return Err(Rejection::UnknownAction(other.to_string())),
        };

        Ok(command)
    }

    /// Whether the command goes through the playback service
    pub fn needs_playback(&self) -> bool {
        !matches!(
            self,
            Command::Greet | Command::Joke | Command::Time | Command::Mood
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_verbs() {
        for verb in PLAY_VERBS {
            assert_eq!(
                Command::from_parse(&ParseResult::command(verb, "stromae santé")),
                Ok(Command::Play {
                    query: "stromae santé".into()
                })
            );
        }
    }

    #[test]
    fn test_play_without_payload() {
        assert_eq!(
            Command::from_parse(&ParseResult::command("joue", "")),
            Err(Rejection::MissingPayload)
        );
    }

    #[test]
    fn test_payload_ignored_for_other_commands() {
        assert_eq!(
            Command::from_parse(&ParseResult::command("reprends", "lecture")),
            Ok(Command::Resume)
        );
    }

    #[test]
    fn test_modes() {
        assert_eq!(
            Command::from_parse(&ParseResult::command("shuffle_off", "")),
            Ok(Command::Shuffle(false))
        );
        assert_eq!(
            Command::from_parse(&ParseResult::command("repeat_context", "")),
            Ok(Command::Repeat(RepeatMode::Context))
        );
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(
            Command::from_parse(&ParseResult::unrecognized()),
            Err(Rejection::Unrecognized)
        );
    }

    #[test]
    fn test_unknown_action() {
        assert_eq!(
            Command::from_parse(&ParseResult::command("danse", "")),
            Err(Rejection::UnknownAction("danse".into()))
        );
    }

    #[test]
    fn test_needs_playback() {
        assert!(Command::Pause.needs_playback());
        assert!(!Command::Joke.needs_playback());
    }
}
