//! Command dispatch - runs parsed commands against the playback service

use chrono::Local;

use crate::command::action::{Command, Rejection};
use crate::core::config::AssistantConfig;
use crate::nlp::parser::ParseResult;
use crate::playback::{PlaybackError, PlaybackService, RepeatMode};

const GREETING: &str = "Salut ! Comment puis-je t'aider ?";
const JOKE: &str =
    "Pourquoi les canards ont-ils autant de plumes ? Pour couvrir leur derrière !";
const MOOD: &str = "Je vais super bien ! Et toi ?";

/// Result of handling one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing recognized in the input
    NotUnderstood,
    /// A play command without a title
    MissingPayload,
    /// The parser emitted an action nobody handles
    UnknownAction(String),
    /// Conversational answer, no playback involved
    Replied(String),
    /// Playback command accepted
    Executed(String),
    /// Playback command attempted and refused by the service
    Failed {
        announcement: String,
        error: PlaybackError,
    },
}

impl Outcome {
    /// Lines the assistant says back to the user
    pub fn messages(&self) -> Vec<String> {
        match self {
            Outcome::NotUnderstood => vec!["Je n'ai pas compris la commande.".into()],
            Outcome::MissingPayload => vec!["Quelle chanson veux-tu écouter ?".into()],
            Outcome::UnknownAction(action) => vec![format!("Action '{}' non reconnue.", action)],
            Outcome::Replied(message) | Outcome::Executed(message) => vec![message.clone()],
            Outcome::Failed {
                announcement,
                error,
            } => vec![announcement.clone(), describe_failure(error)],
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

fn describe_failure(error: &PlaybackError) -> String {
    match error {
        PlaybackError::Auth(_) | PlaybackError::Api { status: 401, .. } => {
            "Je ne suis pas connectée à Spotify. Lance `gigi auth` pour m'autoriser.".into()
        }
        PlaybackError::NoDeviceConfigured => {
            "Aucun appareil défini. Précise --device ou RASPO_DEVICE_NAME.".into()
        }
        PlaybackError::DeviceNotFound(name) => format!("Appareil '{}' introuvable.", name),
        PlaybackError::Api { status: 404, .. } => {
            "Aucun appareil Spotify actif. Lance Spotify sur l'appareil puis réessaie.".into()
        }
        PlaybackError::TrackNotFound(query) => {
            format!("Morceau '{}' introuvable sur Spotify.", query)
        }
        other => format!("Erreur Spotify - {}", other),
    }
}

/// Maps parsed commands to playback operations and replies
///
/// Failures of the playback service are reported in the outcome and never
/// escape, so one bad command cannot end the session.
pub struct CommandDispatcher<P> {
    playback: P,
    config: AssistantConfig,
}

impl<P: PlaybackService> CommandDispatcher<P> {
    pub fn new(playback: P, config: AssistantConfig) -> Self {
        Self { playback, config }
    }

    pub fn playback(&self) -> &P {
        &self.playback
    }

    /// Handle one parse result
    pub async fn dispatch(&self, parsed: &ParseResult) -> Outcome {
        match Command::from_parse(parsed) {
            Ok(command) => self.execute(command).await,
            Err(Rejection::Unrecognized) => Outcome::NotUnderstood,
            Err(Rejection::MissingPayload) => Outcome::MissingPayload,
            Err(Rejection::UnknownAction(action)) => {
                tracing::warn!("No handler for action {:?}", action);
                Outcome::UnknownAction(action)
            }
        }
    }

    /// Run a typed command
    pub async fn execute(&self, command: Command) -> Outcome {
        tracing::debug!(?command, playback = command.needs_playback(), "executing");
        let step = self.config.volume_step;

        let (announcement, result) = match command {
            Command::Greet => return Outcome::Replied(GREETING.into()),
            Command::Joke => return Outcome::Replied(JOKE.into()),
            Command::Mood => return Outcome::Replied(MOOD.into()),
            Command::Time => {
                return Outcome::Replied(format!("Il est {}.", Local::now().format("%H:%M")))
            }
            Command::Play { query } => {
                let announcement = format!("Je lance '{}' sur Spotify !", query);
                (announcement, self.playback.play(&query, None).await)
            }
            Command::Pause => ("Lecture mise en pause.".to_string(), self.playback.pause().await),
            // No dedicated stop on Spotify Connect
            Command::Stop => ("Arrêt de la lecture.".to_string(), self.playback.pause().await),
            Command::Resume => ("Reprise de la lecture.".to_string(), self.playback.resume().await),
            Command::VolumeUp => (
                "J'augmente le volume.".to_string(),
                self.playback.set_volume_delta(step).await,
            ),
            Command::VolumeDown => (
                "Je baisse le volume.".to_string(),
                self.playback.set_volume_delta(-step).await,
            ),
            Command::Next => ("Morceau suivant.".to_string(), self.playback.next().await),
            Command::Previous => (
                "Morceau précédent.".to_string(),
                self.playback.previous().await,
            ),
            Command::Shuffle(enabled) => {
                let announcement = if enabled {
                    "Activation du mode aléatoire."
                } else {
                    "Désactivation du mode aléatoire."
                };
                (
                    announcement.to_string(),
                    self.playback.set_shuffle(enabled).await,
                )
            }
            Command::Repeat(mode) => {
                let announcement = match mode {
                    RepeatMode::Track => "Répétition du morceau activée.",
                    RepeatMode::Context => "Répétition de la playlist activée.",
                    RepeatMode::Off => "Répétition désactivée.",
                };
                (
                    announcement.to_string(),
                    self.playback.set_repeat(mode).await,
                )
            }
        };

        match result {
            Ok(()) => Outcome::Executed(announcement),
            Err(error) => {
                tracing::warn!(kind = ?error.kind(), "Playback command failed: {}", error);
                Outcome::Failed {
                    announcement,
                    error,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{ErrorKind, OfflinePlayback};

    fn offline() -> CommandDispatcher<OfflinePlayback> {
        CommandDispatcher::new(
            OfflinePlayback::new("not configured"),
            AssistantConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_conversation_works_offline() {
        let outcome = offline().dispatch(&ParseResult::command("humeur", "")).await;
        assert_eq!(outcome, Outcome::Replied(MOOD.into()));
    }

    #[tokio::test]
    async fn test_time_reply_format() {
        let outcome = offline().execute(Command::Time).await;
        let message = &outcome.messages()[0];
        assert!(message.starts_with("Il est "));
        // "Il est HH:MM."
        assert_eq!(message.len(), "Il est 12:34.".len());
    }

    #[tokio::test]
    async fn test_offline_playback_fails_gracefully() {
        let outcome = offline().execute(Command::Pause).await;
        assert!(outcome.is_failure());
        assert_eq!(
            outcome.messages(),
            vec![
                "Lecture mise en pause.".to_string(),
                "Je ne suis pas connectée à Spotify. Lance `gigi auth` pour m'autoriser."
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_failure_messages_by_kind() {
        assert_eq!(
            describe_failure(&PlaybackError::DeviceNotFound("Olympe".into())),
            "Appareil 'Olympe' introuvable."
        );
        assert_eq!(
            describe_failure(&PlaybackError::TrackNotFound("zzz".into())),
            "Morceau 'zzz' introuvable sur Spotify."
        );
        assert!(describe_failure(&PlaybackError::Transport("timeout".into()))
            .starts_with("Erreur Spotify - "));
    }

    #[test]
    fn test_api_status_uses_kind_message() {
        let no_device = PlaybackError::Api {
            status: 404,
            message: "Player command failed: No active device found".into(),
        };
        assert_eq!(no_device.kind(), ErrorKind::Device);
        assert!(describe_failure(&no_device).starts_with("Aucun appareil Spotify actif"));

        let expired = PlaybackError::Api {
            status: 401,
            message: "The access token expired".into(),
        };
        assert!(describe_failure(&expired).contains("gigi auth"));

        let server = PlaybackError::Api {
            status: 502,
            message: "Bad gateway".into(),
        };
        assert!(describe_failure(&server).starts_with("Erreur Spotify - "));
    }

    #[test]
    fn test_not_understood_message() {
        assert_eq!(
            Outcome::NotUnderstood.messages(),
            vec!["Je n'ai pas compris la commande.".to_string()]
        );
    }
}
