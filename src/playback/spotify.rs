//! Spotify Connect client
//!
//! Drives a Spotify Connect device through the Web API. Every call resolves
//! the target device by name first, the same way the speaker setup names
//! its device (RASPO_DEVICE_NAME).

use reqwest::{Client, Method, Response};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::core::config::SpotifyConfig;
use crate::playback::auth::{self, TokenCache};
use crate::playback::service::{PlaybackError, PlaybackResult, PlaybackService, RepeatMode};

/// Volume assumed when the device does not report one
const FALLBACK_VOLUME: i32 = 50;

/// A Spotify Connect device as listed by `/me/player/devices`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub volume_percent: Option<u8>,
}

#[derive(Deserialize)]
struct DevicesResponse {
    #[serde(default)]
    devices: Vec<Device>,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<Track>,
}

#[derive(Deserialize)]
struct Track {
    uri: String,
    name: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Async Spotify Web API client
pub struct SpotifyClient {
    client: Client,
    config: SpotifyConfig,
    tokens: Mutex<Option<TokenCache>>,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            tokens: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SpotifyConfig {
        &self.config
    }

    /// Current access token, refreshed when close to expiry
    async fn access_token(&self) -> Result<String, PlaybackError> {
        let mut guard = self.tokens.lock().await;

        let cache = match guard.take() {
            Some(cache) => cache,
            None => TokenCache::load(&self.config.cache_path).map_err(|e| {
                PlaybackError::Auth(format!(
                    "No usable token cache at {} ({}), run `gigi auth`",
                    self.config.cache_path.display(),
                    e
                ))
            })?,
        };

        let cache = if cache.is_expired(auth::now()) {
            auth::refresh(&self.client, &self.config, cache).await?
        } else {
            cache
        };

        let token = cache.access_token.clone();
        *guard = Some(cache);
        Ok(token)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<Response, PlaybackError> {
        let token = self.access_token().await?;
        let is_get = method == Method::GET;

        let request = self
            .client
            .request(method, format!("{}{}", self.config.api_url, path))
            .bearer_auth(token)
            .query(query);

        // Player endpoints reject PUT/POST without a Content-Length
        let request = match body {
            Some(body) => request.json(&body),
            None if !is_get => request.body(""),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| PlaybackError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        Err(status_error(status.as_u16(), &error_text))
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, PlaybackError>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.send(Method::GET, path, query, None)
            .await?
            .json()
            .await
            .map_err(|e| PlaybackError::Transport(format!("Malformed response: {}", e)))
    }

    pub async fn devices(&self) -> Result<Vec<Device>, PlaybackError> {
        let response: DevicesResponse = self.get_json("/me/player/devices", &[]).await?;
        Ok(response.devices)
    }

    /// Find the target device: explicit name, else the configured default
    pub async fn resolve_device(&self, name: Option<&str>) -> Result<Device, PlaybackError> {
        let wanted = name
            .or(self.config.default_device.as_deref())
            .ok_or(PlaybackError::NoDeviceConfigured)?;

        let devices = self.devices().await?;
        find_device(&devices, wanted)
            .cloned()
            .ok_or_else(|| PlaybackError::DeviceNotFound(wanted.to_string()))
    }

    /// URI of the best matching track
    pub async fn search_track(&self, query: &str) -> Result<Option<String>, PlaybackError> {
        let response: SearchResponse = self
            .get_json(
                "/search",
                &[
                    ("q", query.to_string()),
                    ("type", "track".into()),
                    ("limit", "1".into()),
                ],
            )
            .await?;

        let track = response.tracks.and_then(|page| page.items.into_iter().next());
        if let Some(track) = &track {
            tracing::debug!("Search {:?} -> {} ({})", query, track.name, track.uri);
        }
        Ok(track.map(|t| t.uri))
    }

    async fn player_command(
        &self,
        method: Method,
        endpoint: &str,
        device: &Device,
        mut query: Vec<(&str, String)>,
        body: Option<serde_json::Value>,
    ) -> PlaybackResult {
        if let Some(id) = &device.id {
            query.push(("device_id", id.clone()));
        }
        self.send(method, &format!("/me/player/{}", endpoint), &query, body)
            .await?;
        tracing::info!("Spotify {} on {}", endpoint, device.name);
        Ok(())
    }

    async fn on_default_device(
        &self,
        method: Method,
        endpoint: &str,
        query: Vec<(&str, String)>,
    ) -> PlaybackResult {
        let device = self.resolve_device(None).await?;
        self.player_command(method, endpoint, &device, query, None)
            .await
    }
}

impl PlaybackService for SpotifyClient {
    async fn play(&self, track_query: &str, device: Option<&str>) -> PlaybackResult {
        let device = self.resolve_device(device).await?;
        let uri = self
            .search_track(track_query)
            .await?
            .ok_or_else(|| PlaybackError::TrackNotFound(track_query.to_string()))?;

        self.player_command(
            Method::PUT,
            "play",
            &device,
            Vec::new(),
            Some(json!({ "uris": [uri] })),
        )
        .await
    }

    async fn pause(&self) -> PlaybackResult {
        self.on_default_device(Method::PUT, "pause", Vec::new()).await
    }

    async fn resume(&self) -> PlaybackResult {
        // No URIs: continue the current context
        self.on_default_device(Method::PUT, "play", Vec::new()).await
    }

    async fn next(&self) -> PlaybackResult {
        self.on_default_device(Method::POST, "next", Vec::new()).await
    }

    async fn previous(&self) -> PlaybackResult {
        self.on_default_device(Method::POST, "previous", Vec::new())
            .await
    }

    async fn set_volume_delta(&self, delta: i32) -> PlaybackResult {
        if !(-100..=100).contains(&delta) {
            return Err(PlaybackError::InvalidVolumeDelta(delta));
        }

        let device = self.resolve_device(None).await?;
        let volume = next_volume(device.volume_percent, delta);
        self.player_command(
            Method::PUT,
            "volume",
            &device,
            vec![("volume_percent", volume.to_string())],
            None,
        )
        .await
    }

    async fn set_shuffle(&self, enabled: bool) -> PlaybackResult {
        self.on_default_device(Method::PUT, "shuffle", vec![("state", enabled.to_string())])
            .await
    }

    async fn set_repeat(&self, mode: RepeatMode) -> PlaybackResult {
        self.on_default_device(Method::PUT, "repeat", vec![("state", mode.as_str().into())])
            .await
    }
}

/// Case-insensitive lookup of a device that can be addressed
pub fn find_device<'a>(devices: &'a [Device], name: &str) -> Option<&'a Device> {
    let name = name.to_lowercase();
    devices
        .iter()
        .find(|d| d.id.is_some() && d.name.to_lowercase() == name)
}

/// Apply a delta to the current volume, clamped to [0, 100]
pub fn next_volume(current: Option<u8>, delta: i32) -> u8 {
    let current = current.map_or(FALLBACK_VOLUME, i32::from);
    (current + delta).clamp(0, 100) as u8
}

/// Map an unsuccessful API status to a typed error
fn status_error(status: u16, body: &str) -> PlaybackError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        401 => PlaybackError::Auth(message),
        _ => PlaybackError::Api { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::service::ErrorKind;

    fn device(id: Option<&str>, name: &str, volume: Option<u8>) -> Device {
        Device {
            id: id.map(String::from),
            name: name.into(),
            is_active: false,
            volume_percent: volume,
        }
    }

    #[test]
    fn test_find_device_ignores_case() {
        let devices = vec![device(Some("a1"), "Olympe", None), device(Some("b2"), "Salon", None)];
        assert_eq!(find_device(&devices, "olympe").map(|d| d.name.as_str()), Some("Olympe"));
        assert!(find_device(&devices, "cuisine").is_none());
    }

    #[test]
    fn test_find_device_skips_devices_without_id() {
        let devices = vec![device(None, "Olympe", None)];
        assert!(find_device(&devices, "Olympe").is_none());
    }

    #[test]
    fn test_next_volume() {
        assert_eq!(next_volume(Some(30), 10), 40);
        assert_eq!(next_volume(Some(95), 10), 100);
        assert_eq!(next_volume(Some(5), -10), 0);
        assert_eq!(next_volume(None, -10), 40);
    }

    #[test]
    fn test_devices_response_parsing() {
        let json = r#"{"devices": [
            {"id": "5fbb", "is_active": true, "name": "Olympe", "type": "Speaker", "volume_percent": 70},
            {"id": null, "is_active": false, "name": "Restricted", "type": "TV", "volume_percent": null}
        ]}"#;
        let response: DevicesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.devices.len(), 2);
        assert_eq!(response.devices[0].volume_percent, Some(70));
        assert!(response.devices[0].is_active);
        assert_eq!(response.devices[1].id, None);
    }

    #[test]
    fn test_search_response_parsing() {
        let json = r#"{"tracks": {"items": [{"uri": "spotify:track:1", "name": "Santé"}]}}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let items = response.tracks.unwrap().items;
        assert_eq!(items[0].uri, "spotify:track:1");
    }

    #[test]
    fn test_status_error_mapping() {
        let body = r#"{"error": {"status": 401, "message": "The access token expired"}}"#;
        assert_eq!(
            status_error(401, body),
            PlaybackError::Auth("The access token expired".into())
        );

        let body = r#"{"error": {"status": 404, "message": "Player command failed: No active device found"}}"#;
        let err = status_error(404, body);
        assert_eq!(err.kind(), ErrorKind::Device);

        let err = status_error(502, "Bad gateway");
        assert_eq!(
            err,
            PlaybackError::Api {
                status: 502,
                message: "Bad gateway".into()
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_volume_delta_rejected_before_any_request() {
        let config = SpotifyConfig::from_lookup(|key| match key {
            "CLIENT_ID" => Some("id".into()),
            "CLIENT_SECRET" => Some("secret".into()),
            "REDIRECT_URI" => Some("http://localhost".into()),
            _ => None,
        })
        .unwrap();
        let client = SpotifyClient::new(config);

        assert_eq!(
            client.set_volume_delta(150).await,
            Err(PlaybackError::InvalidVolumeDelta(150))
        );
    }

    #[tokio::test]
    async fn test_missing_token_cache_is_an_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("missing").join(".cache");
        let config = SpotifyConfig::from_lookup(|key| match key {
            "CLIENT_ID" => Some("id".into()),
            "CLIENT_SECRET" => Some("secret".into()),
            "REDIRECT_URI" => Some("http://localhost".into()),
            "RASPO_DEVICE_NAME" => Some("Olympe".into()),
            "SPOTIFY_CACHE_PATH" => Some(cache_path.display().to_string()),
            _ => None,
        })
        .unwrap();
        let client = SpotifyClient::new(config);

        assert!(matches!(client.pause().await, Err(PlaybackError::Auth(_))));
    }
}
