//! Subsonic REST catalog client.
//!
//! Every request is bounded by the configured timeout. Failures are logged and
//! surface as empty results; nothing here retries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use jukebox_types::{Album, Artist, CatalogEntry, Track};

use crate::catalog::{CatalogClient, RandomFilter, SearchWindow, StreamLocator};
use crate::config::SubsonicConfig;

const API_VERSION: &str = "1.15.0";
const CLIENT_ID: &str = "jukebox";
const DEFAULT_SIMILAR_COUNT: usize = 50;

/// Subsonic catalog client backed by `reqwest`.
pub struct SubsonicClient {
    base_url: String,
    user: String,
    password: String,
    legacy_auth: bool,
    http: reqwest::Client,
}

/// Describe a Subsonic error code.
pub(crate) fn error_code_message(code: i64) -> &'static str {
    match code {
        0 => "Generic Error.",
        10 => "Required Parameter Missing.",
        20 => "Incompatible Subsonic REST protocol version. Client must upgrade.",
        30 => "Incompatible Subsonic REST protocol version. Server must upgrade.",
        40 => "Wrong username or password.",
        41 => "Token authentication not supported for LDAP users.",
        50 => "User is not authorized for the given operation.",
        60 => "The trial period for the Subsonic server is over.",
        70 => "The requested data was not found.",
        _ => "Unknown Error Code.",
    }
}

/// Unwrap the `subsonic-response` envelope, returning `None` on an error status.
fn response_body<'a>(method: &str, payload: &'a Value) -> Option<&'a Value> {
    let body = payload.get("subsonic-response")?;
    if let Some(error) = body.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        tracing::warn!(
            method,
            code,
            message = error_code_message(code),
            "subsonic request responded with error"
        );
        return None;
    }
    match body.get("status").and_then(Value::as_str) {
        Some("ok") => Some(body),
        status => {
            tracing::warn!(method, status = ?status, "subsonic response has unexpected status");
            None
        }
    }
}

fn array_or_single(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    }
}

/// Parse a `search3` body into artists, then albums, then tracks.
pub(crate) fn parse_search_result(body: &Value) -> Vec<CatalogEntry> {
    let Some(result) = body.get("searchResult3") else {
        return Vec::new();
    };
    let artists = array_or_single(result.get("artist"))
        .into_iter()
        .map(|item| CatalogEntry::Artist(Artist::from_json(item)));
    let albums = array_or_single(result.get("album"))
        .into_iter()
        .map(|item| CatalogEntry::Album(Album::from_json(item)));
    let tracks = array_or_single(result.get("song"))
        .into_iter()
        .map(|item| CatalogEntry::Track(Track::from_json(item)));
    artists.chain(albums).chain(tracks).collect()
}

fn parse_tracks(body: &Value, container: &str) -> Vec<Track> {
    array_or_single(body.get(container).and_then(|value| value.get("song")))
        .into_iter()
        .map(Track::from_json)
        .collect()
}

fn parse_albums(body: &Value, container: &str) -> Vec<Album> {
    array_or_single(body.get(container).and_then(|value| value.get("album")))
        .into_iter()
        .map(Album::from_json)
        .collect()
}

fn make_salt() -> String {
    let mut bytes = [0u8; 8];
    if let Err(err) = getrandom::fill(&mut bytes) {
        tracing::warn!(error = %err, "salt generation failed; using time-based salt");
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        bytes = nanos.to_le_bytes();
    }
    bytes.iter().map(|value| format!("{value:02x}")).collect()
}

impl SubsonicClient {
    pub fn new(cfg: &SubsonicConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()
            .context("build subsonic http client")?;
        Ok(Self {
            base_url: cfg.url.trim().trim_end_matches('/').to_string(),
            user: cfg.user.clone(),
            password: cfg.password.clone(),
            legacy_auth: cfg.legacy_auth.unwrap_or(false),
            http,
        })
    }

    fn auth_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("u".to_string(), self.user.clone())];
        if self.legacy_auth {
            params.push(("p".to_string(), self.password.clone()));
        } else {
            let salt = make_salt();
            let token = format!("{:x}", md5::compute(format!("{}{}", self.password, salt)));
            params.push(("t".to_string(), token));
            params.push(("s".to_string(), salt));
        }
        params.push(("v".to_string(), API_VERSION.to_string()));
        params.push(("c".to_string(), CLIENT_ID.to_string()));
        params.push(("f".to_string(), "json".to_string()));
        params
    }

    fn api_url(&self, method: &str, params: &[(String, String)]) -> String {
        let query: Vec<String> = self
            .auth_params()
            .iter()
            .chain(params.iter())
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect();
        format!("{}/rest/{}.view?{}", self.base_url, method, query.join("&"))
    }

    async fn request_json(&self, method: &str, params: &[(String, String)]) -> Option<Value> {
        let url = self.api_url(method, params);
        tracing::debug!(method, "subsonic request");
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(method, error = %err, timeout = err.is_timeout(), "subsonic request failed");
                return None;
            }
        };
        match response.json::<Value>().await {
            Ok(payload) => Some(payload),
            Err(err) => {
                tracing::warn!(method, error = %err, "subsonic response decode failed");
                None
            }
        }
    }

    async fn request_body(&self, method: &str, params: &[(String, String)]) -> Option<Value> {
        let payload = self.request_json(method, params).await?;
        response_body(method, &payload).cloned()
    }
}

fn param(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}

#[async_trait]
impl CatalogClient for SubsonicClient {
    async fn search(&self, query: &str, window: SearchWindow) -> Vec<CatalogEntry> {
        let params = [
            param("query", query),
            param("artistCount", window.artist_count),
            param("artistOffset", window.artist_offset),
            param("albumCount", window.album_count),
            param("albumOffset", window.album_offset),
            param("songCount", window.track_count),
            param("songOffset", window.track_offset),
        ];
        match self.request_body("search3", &params).await {
            Some(body) => parse_search_result(&body),
            None => Vec::new(),
        }
    }

    async fn random_tracks(&self, filter: RandomFilter) -> Vec<Track> {
        let mut params = Vec::new();
        if let Some(size) = filter.size {
            params.push(param("size", size));
        }
        if let Some(genre) = filter.genre.as_deref() {
            params.push(param("genre", genre));
        }
        if let Some(from_year) = filter.from_year {
            params.push(param("fromYear", from_year));
        }
        if let Some(to_year) = filter.to_year {
            params.push(param("toYear", to_year));
        }
        if let Some(folder) = filter.music_folder_id.as_deref() {
            params.push(param("musicFolderId", folder));
        }
        match self.request_body("getRandomSongs", &params).await {
            Some(body) => parse_tracks(&body, "randomSongs"),
            None => Vec::new(),
        }
    }

    async fn similar_tracks(&self, track_id: &str, count: usize) -> Vec<Track> {
        let count = if count == 0 { DEFAULT_SIMILAR_COUNT } else { count };
        let params = [param("id", track_id), param("count", count)];
        match self.request_body("getSimilarSongs2", &params).await {
            Some(body) => parse_tracks(&body, "similarSongs2"),
            None => Vec::new(),
        }
    }

    async fn album_tracks(&self, album_id: &str) -> Vec<Track> {
        match self.request_body("getAlbum", &[param("id", album_id)]).await {
            Some(body) => parse_tracks(&body, "album"),
            None => Vec::new(),
        }
    }

    async fn artist_albums(&self, artist_id: &str) -> Vec<Album> {
        match self.request_body("getArtist", &[param("id", artist_id)]).await {
            Some(body) => parse_albums(&body, "artist"),
            None => Vec::new(),
        }
    }

    fn stream_locator(&self, track_id: &str) -> StreamLocator {
        StreamLocator(self.api_url("stream", &[param("id", track_id)]))
    }

    fn cover_art_url(&self, cover_id: &str, size: u32) -> Option<String> {
        if cover_id.is_empty() {
            return None;
        }
        Some(self.api_url("getCoverArt", &[param("id", cover_id), param("size", size)]))
    }
}
