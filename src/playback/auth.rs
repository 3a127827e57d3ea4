//! Spotify OAuth: token cache, refresh, authorization-code flow
//!
//! The cache file layout matches the one written by common Spotify client
//! libraries (`access_token`, `refresh_token`, `expires_at`, ...), so an
//! existing cache on the device keeps working.

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::config::{SpotifyConfig, SPOTIFY_SCOPE};
use crate::core::error::{GigiError, Result};
use crate::playback::service::PlaybackError;

/// Tokens are refreshed this many seconds before they actually expire
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Persisted OAuth tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCache {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Unix timestamp (seconds)
    pub expires_at: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".into()
}

impl TokenCache {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.saturating_sub(now) < EXPIRY_MARGIN_SECS
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    /// A refresh response may omit the refresh token: keep the previous one
    fn into_cache(self, now: i64, previous_refresh: Option<String>) -> TokenCache {
        TokenCache {
            access_token: self.access_token,
            token_type: self.token_type,
            expires_at: now + self.expires_in,
            refresh_token: self.refresh_token.or(previous_refresh),
            scope: self.scope,
        }
    }
}

/// URL the user opens to grant playback access
pub fn authorize_url(config: &SpotifyConfig) -> Result<Url> {
    Url::parse_with_params(
        &format!("{}/authorize", config.accounts_url),
        &[
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("scope", SPOTIFY_SCOPE),
        ],
    )
    .map_err(|e| GigiError::Config(format!("Invalid accounts URL: {}", e)))
}

/// Extract the authorization code from the URL Spotify redirected to
pub fn code_from_redirect(redirected: &str) -> Option<String> {
    let url = Url::parse(redirected.trim()).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
}

/// Trade an authorization code for tokens
pub async fn exchange_code(
    client: &Client,
    config: &SpotifyConfig,
    code: &str,
) -> std::result::Result<TokenCache, PlaybackError> {
    let response = request_token(
        client,
        config,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
        ],
    )
    .await?;
    Ok(response.into_cache(now(), None))
}

/// Get a fresh access token and store it in the cache file
pub async fn refresh(
    client: &Client,
    config: &SpotifyConfig,
    cache: TokenCache,
) -> std::result::Result<TokenCache, PlaybackError> {
    let refresh_token = cache.refresh_token.ok_or_else(|| {
        PlaybackError::Auth("Token expired and no refresh token is cached".into())
    })?;

    let response = request_token(
        client,
        config,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ],
    )
    .await?;

    let refreshed = response.into_cache(now(), Some(refresh_token));
    if let Err(e) = refreshed.save(&config.cache_path) {
        tracing::warn!("Could not store refreshed token: {}", e);
    }
    tracing::debug!("Refreshed Spotify access token");
    Ok(refreshed)
}

async fn request_token(
    client: &Client,
    config: &SpotifyConfig,
    form: &[(&str, &str)],
) -> std::result::Result<TokenResponse, PlaybackError> {
    let response = client
        .post(format!("{}/api/token", config.accounts_url))
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(form)
        .send()
        .await
        .map_err(|e| PlaybackError::Transport(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let error_text = response.text().await.unwrap_or_default();
        return Err(PlaybackError::Auth(format!(
            "Token request failed ({}): {}",
            status, error_text
        )));
    }

    response
        .json()
        .await
        .map_err(|e| PlaybackError::Auth(format!("Malformed token response: {}", e)))
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> SpotifyConfig {
        SpotifyConfig {
            client_id: "client".into(),
            client_secret: "secret".into(),
            redirect_uri: "http://localhost:8888/callback".into(),
            default_device: None,
            cache_path: PathBuf::from("/tmp/unused"),
            api_url: "https://api.example.com/v1".into(),
            accounts_url: "https://accounts.example.com".into(),
        }
    }

    #[test]
    fn test_authorize_url() {
        let url = authorize_url(&config()).unwrap();
        assert_eq!(url.path(), "/authorize");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "client".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://localhost:8888/callback".into()
        )));
        assert!(pairs.contains(&("scope".into(), SPOTIFY_SCOPE.into())));
    }

    #[test]
    fn test_code_from_redirect() {
        assert_eq!(
            code_from_redirect("http://localhost:8888/callback?code=AQB12&state=x\n"),
            Some("AQB12".into())
        );
        assert_eq!(
            code_from_redirect("http://localhost:8888/callback?error=access_denied"),
            None
        );
        assert_eq!(code_from_redirect("not a url"), None);
    }

    #[test]
    fn test_expiry_margin() {
        let cache = TokenCache {
            access_token: "a".into(),
            token_type: "Bearer".into(),
            expires_at: 1_000,
            refresh_token: None,
            scope: None,
        };
        assert!(!cache.is_expired(900));
        assert!(cache.is_expired(941));
        assert!(cache.is_expired(2_000));
    }

    #[test]
    fn test_corrupt_expiry_does_not_overflow() {
        let mut cache = TokenCache {
            access_token: "a".into(),
            token_type: "Bearer".into(),
            expires_at: i64::MIN,
            refresh_token: None,
            scope: None,
        };
        assert!(cache.is_expired(1_000));

        cache.expires_at = i64::MAX;
        assert!(!cache.is_expired(-1_000));
    }

    #[test]
    fn test_refresh_keeps_previous_refresh_token() {
        let response = TokenResponse {
            access_token: "new".into(),
            token_type: "Bearer".into(),
            expires_in: 3600,
            refresh_token: None,
            scope: None,
        };
        let cache = response.into_cache(100, Some("old-refresh".into()));
        assert_eq!(cache.expires_at, 3700);
        assert_eq!(cache.refresh_token.as_deref(), Some("old-refresh"));
    }

    #[test]
    fn test_cache_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spotify_cache").join(".cache");
        let cache = TokenCache {
            access_token: "a".into(),
            token_type: "Bearer".into(),
            expires_at: 42,
            refresh_token: Some("r".into()),
            scope: Some(SPOTIFY_SCOPE.into()),
        };

        cache.save(&path).unwrap();
        assert_eq!(TokenCache::load(&path).unwrap(), cache);
    }

    #[test]
    fn test_reads_library_cache_format() {
        let json = r#"{
            "access_token": "BQD",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "user-read-playback-state user-modify-playback-state",
            "expires_at": 1700000000,
            "refresh_token": "AQC"
        }"#;
        let cache: TokenCache = serde_json::from_str(json).unwrap();
        assert_eq!(cache.expires_at, 1_700_000_000);
        assert_eq!(cache.refresh_token.as_deref(), Some("AQC"));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let cache = TokenCache {
            access_token: "a".into(),
            token_type: "Bearer".into(),
            expires_at: 0,
            refresh_token: None,
            scope: None,
        };
        let result = refresh(&Client::new(), &config(), cache).await;
        assert!(matches!(result, Err(PlaybackError::Auth(_))));
    }
}
