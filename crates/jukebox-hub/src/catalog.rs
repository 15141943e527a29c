//! Catalog client abstraction.
//!
//! The media server is consumed through this trait so the session manager and the
//! browse engine can be driven by fakes in tests. Implementations absorb their own
//! failures: an unreachable server or a timeout reads as an empty result.

use async_trait::async_trait;

use jukebox_types::{Album, CatalogEntry, Track};

/// Per-kind requested counts and offsets for a single search call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchWindow {
    pub artist_count: usize,
    pub artist_offset: usize,
    pub album_count: usize,
    pub album_offset: usize,
    pub track_count: usize,
    pub track_offset: usize,
}

impl SearchWindow {
    /// Window that only asks for the first `count` tracks.
    pub fn tracks_only(count: usize) -> Self {
        Self {
            track_count: count,
            ..Self::default()
        }
    }
}

/// Optional filters for random track requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RandomFilter {
    pub size: Option<usize>,
    pub genre: Option<String>,
    pub from_year: Option<u32>,
    pub to_year: Option<u32>,
    pub music_folder_id: Option<String>,
}

impl RandomFilter {
    pub fn single() -> Self {
        Self {
            size: Some(1),
            ..Self::default()
        }
    }
}

/// Opaque locator handed to the audio transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamLocator(pub String);

impl StreamLocator {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Full-text search. Results are ordered artists, then albums, then tracks.
    async fn search(&self, query: &str, window: SearchWindow) -> Vec<CatalogEntry>;
    async fn random_tracks(&self, filter: RandomFilter) -> Vec<Track>;
    async fn similar_tracks(&self, track_id: &str, count: usize) -> Vec<Track>;
    async fn album_tracks(&self, album_id: &str) -> Vec<Track>;
    async fn artist_albums(&self, artist_id: &str) -> Vec<Album>;
    /// Build the stream locator for a track. Never touches the network.
    fn stream_locator(&self, track_id: &str) -> StreamLocator;
    /// URL for a cover art image, if the entry has one.
    fn cover_art_url(&self, cover_id: &str, size: u32) -> Option<String>;
}
