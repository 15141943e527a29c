//! Catalog entity model shared by the jukebox hub and its clients.
//!
//! Entries are immutable value objects parsed from Subsonic JSON payloads. Missing
//! string fields fall back to an "Unknown ..." sentinel and missing numbers to `0`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNKNOWN_TRACK: &str = "Unknown Track";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Isolation scope for one independent playback/browse state (one chat server).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct CommunityId(pub u64);

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single playable track.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Track {
    /// Catalog id used for streaming and similarity lookups.
    pub id: String,
    pub title: String,
    /// Name of the album containing the track.
    pub album: String,
    pub artist: String,
    /// Cover art id (empty when the catalog has none).
    pub cover_id: String,
    /// Duration in seconds.
    pub duration_secs: u64,
}

/// An album summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Album {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub cover_id: String,
    /// Number of tracks reported by the catalog.
    pub track_count: u32,
    /// Total duration in seconds.
    pub duration_secs: u64,
}

/// An artist summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub cover_id: String,
    /// Number of albums reported by the catalog.
    pub album_count: u32,
}

/// One search/browse result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogEntry {
    Artist(Artist),
    Album(Album),
    Track(Track),
}

/// Discriminant of [`CatalogEntry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Artist,
    Album,
    Track,
}

impl CatalogEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            CatalogEntry::Artist(_) => EntryKind::Artist,
            CatalogEntry::Album(_) => EntryKind::Album,
            CatalogEntry::Track(_) => EntryKind::Track,
        }
    }

    /// Catalog id of the underlying entity.
    pub fn id(&self) -> &str {
        match self {
            CatalogEntry::Artist(artist) => &artist.id,
            CatalogEntry::Album(album) => &album.id,
            CatalogEntry::Track(track) => &track.id,
        }
    }

    pub fn cover_id(&self) -> &str {
        match self {
            CatalogEntry::Artist(artist) => &artist.cover_id,
            CatalogEntry::Album(album) => &album.cover_id,
            CatalogEntry::Track(track) => &track.cover_id,
        }
    }
}

/// Number of entries of each kind in a result page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct KindCounts {
    pub artists: usize,
    pub albums: usize,
    pub tracks: usize,
}

impl KindCounts {
    pub fn of(entries: &[CatalogEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut counts, entry| {
            match entry.kind() {
                EntryKind::Artist => counts.artists += 1,
                EntryKind::Album => counts.albums += 1,
                EntryKind::Track => counts.tracks += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.artists + self.albums + self.tracks
    }
}

/// Automatic enqueue policy applied when a community's queue runs dry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum AutoplayMode {
    #[default]
    None,
    Random,
    Similar,
}

impl AutoplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoplayMode::None => "none",
            AutoplayMode::Random => "random",
            AutoplayMode::Similar => "similar",
        }
    }

    /// Human readable label used in chat replies.
    pub fn label(&self) -> &'static str {
        match self {
            AutoplayMode::None => "None",
            AutoplayMode::Random => "Random",
            AutoplayMode::Similar => "Similar",
        }
    }
}

impl fmt::Display for AutoplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutoplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(AutoplayMode::None),
            "random" => Ok(AutoplayMode::Random),
            "similar" => Ok(AutoplayMode::Similar),
            other => Err(format!("unknown autoplay mode: {other}")),
        }
    }
}

/// Persisted per-community settings record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CommunitySettings {
    pub community_id: CommunityId,
    #[serde(default)]
    pub autoplay_mode: AutoplayMode,
}

/// Format whole seconds as `mm:ss` (minutes are not wrapped into hours).
pub fn format_duration(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn str_field(json: &Value, key: &str, fallback: &str) -> String {
    json.get(key)
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_string()
}

fn u64_field(json: &Value, key: &str) -> u64 {
    json.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn u32_field(json: &Value, key: &str) -> u32 {
    u32::try_from(u64_field(json, key)).unwrap_or(u32::MAX)
}

impl Track {
    /// Parse a Subsonic `song`/`child` object.
    pub fn from_json(json: &Value) -> Self {
        Self {
            id: str_field(json, "id", ""),
            title: str_field(json, "title", UNKNOWN_TRACK),
            album: str_field(json, "album", UNKNOWN_ALBUM),
            artist: str_field(json, "artist", UNKNOWN_ARTIST),
            cover_id: str_field(json, "coverArt", ""),
            duration_secs: u64_field(json, "duration"),
        }
    }

    pub fn duration_printable(&self) -> String {
        format_duration(self.duration_secs)
    }
}

impl Album {
    /// Parse a Subsonic `album` object (ID3 flavour).
    pub fn from_json(json: &Value) -> Self {
        Self {
            id: str_field(json, "id", ""),
            name: str_field(json, "name", UNKNOWN_ALBUM),
            artist: str_field(json, "artist", UNKNOWN_ARTIST),
            cover_id: str_field(json, "coverArt", ""),
            track_count: u32_field(json, "songCount"),
            duration_secs: u64_field(json, "duration"),
        }
    }

    pub fn duration_printable(&self) -> String {
        format_duration(self.duration_secs)
    }
}

impl Artist {
    /// Parse a Subsonic `artist` object (ID3 flavour).
    pub fn from_json(json: &Value) -> Self {
        Self {
            id: str_field(json, "id", ""),
            name: str_field(json, "name", UNKNOWN_ARTIST),
            cover_id: str_field(json, "coverArt", ""),
            album_count: u32_field(json, "albumCount"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn track_defaults_missing_fields_to_sentinels() {
        let track = Track::from_json(&json!({ "id": "t1" }));
        assert_eq!(track.id, "t1");
        assert_eq!(track.title, UNKNOWN_TRACK);
        assert_eq!(track.album, UNKNOWN_ALBUM);
        assert_eq!(track.artist, UNKNOWN_ARTIST);
        assert_eq!(track.cover_id, "");
        assert_eq!(track.duration_secs, 0);
    }

    #[test]
    fn album_parses_counts_and_duration() {
        let album = Album::from_json(&json!({
            "id": "al-1",
            "name": "Blue Train",
            "artist": "John Coltrane",
            "coverArt": "al-1",
            "songCount": 5,
            "duration": 2537
        }));
        assert_eq!(album.track_count, 5);
        assert_eq!(album.duration_printable(), "42:17");
    }

    #[test]
    fn artist_defaults_name() {
        let artist = Artist::from_json(&json!({ "id": "ar-1", "albumCount": 3 }));
        assert_eq!(artist.name, UNKNOWN_ARTIST);
        assert_eq!(artist.album_count, 3);
    }

    #[test]
    fn duration_minutes_are_not_wrapped() {
        assert_eq!(format_duration(3725), "62:05");
        assert_eq!(format_duration(0), "00:00");
    }

    #[test]
    fn autoplay_mode_parses_case_insensitively() {
        assert_eq!("Similar".parse::<AutoplayMode>(), Ok(AutoplayMode::Similar));
        assert_eq!(" random ".parse::<AutoplayMode>(), Ok(AutoplayMode::Random));
        assert!("shuffle".parse::<AutoplayMode>().is_err());
    }

    #[test]
    fn catalog_entry_serializes_with_kind_tag() {
        let entry = CatalogEntry::Artist(Artist::from_json(&json!({ "id": "ar-9", "name": "Nina" })));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["kind"], "artist");
        assert_eq!(value["name"], "Nina");
        assert_eq!(entry.kind(), EntryKind::Artist);
    }

    #[test]
    fn settings_default_autoplay_when_missing() {
        let settings: CommunitySettings = serde_json::from_str(r#"{"community_id": 42}"#).unwrap();
        assert_eq!(settings.community_id, CommunityId(42));
        assert_eq!(settings.autoplay_mode, AutoplayMode::None);
    }

    #[test]
    fn kind_counts_tally_each_kind() {
        let entries = vec![
            CatalogEntry::Artist(Artist::from_json(&json!({ "id": "ar" }))),
            CatalogEntry::Album(Album::from_json(&json!({ "id": "al1" }))),
            CatalogEntry::Album(Album::from_json(&json!({ "id": "al2" }))),
            CatalogEntry::Track(Track::from_json(&json!({ "id": "t" }))),
        ];
        let counts = KindCounts::of(&entries);
        assert_eq!(counts, KindCounts { artists: 1, albums: 2, tracks: 1 });
        assert_eq!(counts.total(), 4);
    }
}
