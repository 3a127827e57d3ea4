//! Gigi - Entry Point
//!
//! Interactive loop: read a line, parse it, dispatch it, print the replies.
//! One command is fully handled before the next line is read.

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use gigi::command::CommandDispatcher;
use gigi::core::config::{AssistantConfig, SpotifyConfig};
use gigi::core::error::{GigiError, Result};
use gigi::nlp::{IntentParser, RuleTables};
use gigi::playback::auth::{authorize_url, code_from_redirect, exchange_code};
use gigi::playback::{OfflinePlayback, PlaybackService, SpotifyClient};

/// Gigi - French voice commands for Spotify
#[derive(Parser, Debug)]
#[command(name = "gigi")]
#[command(about = "Assistant vocal Gigi : commandes en français pour Spotify")]
struct Args {
    /// Rule tables file (defaults to the built-in French vocabulary)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Playback device name (overrides RASPO_DEVICE_NAME)
    #[arg(long, global = true)]
    device: Option<String>,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Interactive session (default)
    Chat,
    /// Print the interpretation of a phrase as JSON
    Parse {
        #[arg(required = true)]
        phrase: Vec<String>,
    },
    /// Authorize Gigi on a Spotify account and store the token cache
    Auth,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they never mix with the assistant's replies
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gigi=info")),
        )
        .with_writer(io::stderr)
        .init();

    let rules = match &args.rules {
        Some(path) => RuleTables::load_file(path)?,
        None => RuleTables::builtin()?,
    };
    let parser = IntentParser::new(rules);

    match args.mode.unwrap_or(Mode::Chat) {
        Mode::Parse { phrase } => {
            let result = parser.parse(&phrase.join(" "));
            println!("{}", serde_json::to_string(&result)?);
            Ok(())
        }
        Mode::Auth => {
            let config = SpotifyConfig::from_env()?;
            authenticate(config)
        }
        Mode::Chat => {
            let config = AssistantConfig::default();
            config.validate().map_err(GigiError::Config)?;

            match SpotifyConfig::from_env() {
                Ok(spotify) => {
                    let client = SpotifyClient::new(spotify.with_default_device(args.device));
                    chat(&parser, CommandDispatcher::new(client, config.clone()), &config)
                }
                Err(e) => {
                    tracing::warn!("{} - running without Spotify", e);
                    let offline = OfflinePlayback::new(e.to_string());
                    chat(&parser, CommandDispatcher::new(offline, config.clone()), &config)
                }
            }
        }
    }
}

fn chat<P: PlaybackService>(
    parser: &IntentParser,
    dispatcher: CommandDispatcher<P>,
    config: &AssistantConfig,
) -> Result<()> {
    let rt = Runtime::new()?;
    let stdin = io::stdin();

    println!("Assistant Gigi activé ! Tape 'exit' pour quitter.");

    loop {
        print!("\nDis quelque chose : ");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF
            println!();
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if config.is_exit_word(input) {
            say("À la prochaine !");
            break;
        }

        let parsed = parser.parse(input);
        tracing::debug!(?parsed, "parsed input");

        let outcome = rt.block_on(dispatcher.dispatch(&parsed));
        for message in outcome.messages() {
            say(&message);
        }
    }

    Ok(())
}

fn say(message: &str) {
    println!("Gigi : {}", message);
}

/// Authorization-code flow without a local web server
fn authenticate(config: SpotifyConfig) -> Result<()> {
    let url = authorize_url(&config)?;

    println!("Ouvre cette adresse dans un navigateur et autorise Gigi :");
    println!("\n  {}\n", url);
    print!("Colle ici l'adresse vers laquelle tu as été redirigé : ");
    io::stdout().flush()?;

    let mut redirected = String::new();
    io::stdin().lock().read_line(&mut redirected)?;
    let code = code_from_redirect(&redirected)
        .ok_or_else(|| GigiError::Config("No authorization code in the pasted URL".into()))?;

    let rt = Runtime::new()?;
    let client = reqwest::Client::new();
    let cache = rt.block_on(exchange_code(&client, &config, &code))?;
    cache.save(&config.cache_path)?;

    tracing::info!("Stored token cache at {}", config.cache_path.display());
    println!(
        "Authentification terminée. Cache stocké à : {}",
        config.cache_path.display()
    );
    Ok(())
}
