//! Chat-facing text for replies and browse listings.
//!
//! Text uses the chat platform's markdown (`**bold**`, `*italic*`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use jukebox_types::{Album, AutoplayMode, CatalogEntry, Track};

/// Longest `title - artist` line before the fields are trimmed.
const TOP_LINE_MAX: usize = 71;
/// Room left for title and artist once the ` - ` separator is counted.
const TRACK_FIELDS_MAX: usize = TOP_LINE_MAX - 3;
const ALBUM_NAME_MAX: usize = 68;
const ELLIPSIS: &str = "...";

/// A message for the chat layer to post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Reply {
    pub title: String,
    pub description: Option<String>,
    /// Cover art URL shown next to the message.
    pub thumbnail: Option<String>,
}

impl Reply {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            thumbnail: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: Option<String>) -> Self {
        self.thumbnail = thumbnail;
        self
    }
}

/// One entry of a selection menu.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SelectOption {
    pub label: String,
    pub description: String,
    /// Index to send back when this option is picked.
    pub value: usize,
}

fn truncate_chars(text: &str, keep: usize) -> String {
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Shortens `text` to exactly `width` chars, ellipsis included, when it is longer.
fn fit_chars(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        truncate_chars(text, width.saturating_sub(ELLIPSIS.len()))
    }
}

/// Title and artist shortened so `title - artist` is at most `TOP_LINE_MAX`.
///
/// The longer field gives way first; when both are long the shorter one is
/// capped at half the room so the line still comes out at the full width.
fn trimmed_title_artist(track: &Track) -> (String, String) {
    let title_len = track.title.chars().count();
    let artist_len = track.artist.chars().count();
    if title_len + artist_len <= TRACK_FIELDS_MAX {
        return (track.title.clone(), track.artist.clone());
    }
    let half = TRACK_FIELDS_MAX / 2;
    let (title_width, artist_width) = if title_len >= artist_len {
        let artist_width = artist_len.min(half);
        (TRACK_FIELDS_MAX - artist_width, artist_width)
    } else {
        let title_width = title_len.min(half);
        (title_width, TRACK_FIELDS_MAX - title_width)
    };
    (fit_chars(&track.title, title_width), fit_chars(&track.artist, artist_width))
}

fn trimmed_album(name: &str) -> String {
    if name.chars().count() > ALBUM_NAME_MAX {
        truncate_chars(name, ALBUM_NAME_MAX)
    } else {
        name.to_string()
    }
}

fn entry_block(entry: &CatalogEntry) -> String {
    match entry {
        CatalogEntry::Track(track) => {
            let (title, artist) = trimmed_title_artist(track);
            format!(
                "**{title}** - *{artist}* \n*{}* ({})\n\n",
                trimmed_album(&track.album),
                track.duration_printable()
            )
        }
        CatalogEntry::Album(album) => format!(
            "**{}**\n*{}* ({} tracks, {})\n\n",
            album.name,
            album.artist,
            album.track_count,
            album.duration_printable()
        ),
        CatalogEntry::Artist(artist) => {
            format!("**{}**\n{} albums\n\n", artist.name, artist.album_count)
        }
    }
}

/// Listing body for a browse surface, followed by `footer`.
pub fn listing(header: &str, entries: &[CatalogEntry], footer: &str) -> Reply {
    let mut body: String = entries.iter().map(entry_block).collect();
    body.push_str(footer);
    Reply::new(header).with_description(body)
}

pub fn selection_options(entries: &[CatalogEntry]) -> Vec<SelectOption> {
    entries
        .iter()
        .enumerate()
        .map(|(value, entry)| {
            let (label, description) = match entry {
                CatalogEntry::Track(track) => (track.title.clone(), format!("song by {}", track.artist)),
                CatalogEntry::Album(album) => (album.name.clone(), format!("album by {}", album.artist)),
                CatalogEntry::Artist(artist) => (artist.name.clone(), "artist".to_string()),
            };
            SelectOption {
                label,
                description,
                value,
            }
        })
        .collect()
}

pub fn page_footer(page: usize) -> String {
    format!("Page: {page}")
}

pub fn album_header(album: &Album) -> String {
    format!("{} - **{}**", album.artist, album.name)
}

pub fn artist_header(name: &str) -> String {
    format!("**{name}**")
}

fn track_summary(track: &Track) -> String {
    format!(
        "**{}** - *{}*\n{} ({})",
        track.title,
        track.artist,
        track.album,
        track.duration_printable()
    )
}

pub fn playing(track: &Track, thumbnail: Option<String>) -> Reply {
    Reply::new("Playing:")
        .with_description(track_summary(track))
        .with_thumbnail(thumbnail)
}

pub fn nothing_playing() -> Reply {
    Reply::new("Nothing is playing")
}

pub fn disconnected() -> Reply {
    Reply::new("Disconnected from voice channel")
}

pub fn starting_queue_playback() -> Reply {
    Reply::new("Started queue playback")
}

pub fn added_to_queue(user: &str, track: &Track, thumbnail: Option<String>) -> Reply {
    Reply::new(format!("{user} added track to queue"))
        .with_description(track_summary(track))
        .with_thumbnail(thumbnail)
}

pub fn added_album_to_queue(user: &str, album: &Album, thumbnail: Option<String>) -> Reply {
    Reply::new(format!("{user} added album to queue"))
        .with_description(format!(
            "**{}**\n{} ({} tracks, {})",
            album.name,
            album.artist,
            album.track_count,
            album.duration_printable()
        ))
        .with_thumbnail(thumbnail)
}

pub fn queue_cleared(user: &str) -> Reply {
    Reply::new(format!("{user} cleared the queue"))
}

pub fn skipped() -> Reply {
    Reply::new("Skipped track")
}

pub fn queue(tracks: &[Track]) -> Reply {
    if tracks.is_empty() {
        return Reply::new("Queue").with_description("Queue is empty!");
    }
    let body: String = tracks
        .iter()
        .enumerate()
        .map(|(i, track)| format!("{}. {}\n\n", i + 1, track_summary(track)))
        .collect();
    Reply::new("Queue").with_description(body)
}

pub fn autoplay_changed(user: &str, mode: AutoplayMode) -> Reply {
    match mode {
        AutoplayMode::None => Reply::new(format!("Autoplay disabled by {user}")),
        _ => Reply::new(format!("Autoplay enabled by {user}"))
            .with_description(format!("Autoplay mode: **{}**", mode.label())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{album, artist, track};

    #[test]
    fn long_title_is_trimmed_to_fit() {
        let mut t = track("t1");
        t.title = "x".repeat(80);
        t.artist = "Band".to_string();
        let (title, artist) = trimmed_title_artist(&t);
        assert_eq!(artist, "Band");
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count() + 3 + artist.chars().count(), TOP_LINE_MAX);
    }

    #[test]
    fn long_artist_is_trimmed_when_longer() {
        let mut t = track("t1");
        t.title = "Short".to_string();
        t.artist = "y".repeat(90);
        let (title, artist) = trimmed_title_artist(&t);
        assert_eq!(title, "Short");
        assert_eq!(title.chars().count() + 3 + artist.chars().count(), TOP_LINE_MAX);
    }

    #[test]
    fn both_long_fields_are_trimmed_to_full_width() {
        let mut t = track("t1");
        t.title = "x".repeat(80);
        t.artist = "y".repeat(80);
        let (title, artist) = trimmed_title_artist(&t);
        assert_eq!(title, format!("{}...", "x".repeat(31)));
        assert_eq!(artist, format!("{}...", "y".repeat(31)));
        assert_eq!(title.chars().count() + 3 + artist.chars().count(), TOP_LINE_MAX);
    }

    #[test]
    fn shorter_long_field_is_capped_at_half_width() {
        let mut t = track("t1");
        t.title = "x".repeat(50);
        t.artist = "y".repeat(40);
        let (title, artist) = trimmed_title_artist(&t);
        assert!(title.ends_with("...") && artist.ends_with("..."));
        assert_eq!(artist.chars().count(), 34);
        assert_eq!(title.chars().count() + 3 + artist.chars().count(), TOP_LINE_MAX);
    }

    #[test]
    fn listing_renders_each_kind_and_footer() {
        let mut t = track("t1");
        t.album = "a".repeat(70);
        let entries = vec![
            CatalogEntry::Artist(artist("ar1")),
            CatalogEntry::Album(album("al1")),
            CatalogEntry::Track(t),
        ];
        let reply = listing("**Search Results:** foo", &entries, &page_footer(1));
        let body = reply.description.unwrap();
        assert_eq!(reply.title, "**Search Results:** foo");
        assert!(body.starts_with("**Artist ar1**\n1 albums\n\n"));
        assert!(body.contains("**Album al1**\n*Artist* (2 tracks, 06:40)\n\n"));
        assert!(body.contains(&format!("*{}...* (03:20)", "a".repeat(68))));
        assert!(body.ends_with("Page: 1"));
    }

    #[test]
    fn selection_options_describe_kinds() {
        let entries = vec![
            CatalogEntry::Track(track("t1")),
            CatalogEntry::Album(album("al1")),
            CatalogEntry::Artist(artist("ar1")),
        ];
        let options = selection_options(&entries);
        assert_eq!(options[0].description, "song by Artist");
        assert_eq!(options[1].description, "album by Artist");
        assert_eq!(options[2].description, "artist");
        assert_eq!(options[2].value, 2);
    }

    #[test]
    fn empty_queue_has_placeholder() {
        assert_eq!(queue(&[]).description.as_deref(), Some("Queue is empty!"));
        let listing = queue(&[track("a"), track("b")]).description.unwrap();
        assert!(listing.starts_with("1. **Song a** - *Artist*\nAlbum (03:20)"));
        assert!(listing.contains("2. **Song b**"));
    }

    #[test]
    fn autoplay_reply_names_mode() {
        let reply = autoplay_changed("ana", AutoplayMode::Similar);
        assert_eq!(reply.title, "Autoplay enabled by ana");
        assert_eq!(reply.description.as_deref(), Some("Autoplay mode: **Similar**"));
        assert_eq!(autoplay_changed("ana", AutoplayMode::None).title, "Autoplay disabled by ana");
    }
}
