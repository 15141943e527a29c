//! Paginated search over three independently counted entry kinds.
//!
//! The catalog answers one search call with artists, then albums, then tracks. A
//! [`PagedBrowse`] keeps a seen-offset per kind and moves those offsets by exactly
//! the number of entries of each kind shown on a page.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use jukebox_types::{CatalogEntry, KindCounts};

use crate::catalog::{CatalogClient, SearchWindow};
use crate::error::JukeboxError;

/// Entries shown per page, after concatenating all kinds.
pub const PAGE_SIZE: usize = 10;

/// Per-kind result caps. `None` is unbounded; `Some(0)` excludes the kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BrowseCaps {
    pub artists: Option<usize>,
    pub albums: Option<usize>,
    pub tracks: Option<usize>,
}

fn requested_count(cap: Option<usize>, seen: usize) -> usize {
    match cap {
        Some(cap) => PAGE_SIZE.min(cap.saturating_sub(seen)),
        None => PAGE_SIZE,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Previous,
    Next,
}

/// Whether a navigation step replaced the displayed page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageChange {
    Changed,
    Unchanged,
}

fn add_counts(a: KindCounts, b: KindCounts) -> KindCounts {
    KindCounts {
        artists: a.artists + b.artists,
        albums: a.albums + b.albums,
        tracks: a.tracks + b.tracks,
    }
}

fn sub_counts(a: KindCounts, b: KindCounts) -> KindCounts {
    KindCounts {
        artists: a.artists.saturating_sub(b.artists),
        albums: a.albums.saturating_sub(b.albums),
        tracks: a.tracks.saturating_sub(b.tracks),
    }
}

#[derive(Debug, Clone)]
pub struct PagedBrowse {
    query: String,
    header: String,
    caps: BrowseCaps,
    seen: KindCounts,
    /// Per-kind counts of each page left behind by `next`, most recent last.
    history: Vec<KindCounts>,
    page: Vec<CatalogEntry>,
}

impl PagedBrowse {
    /// Run the first page query. Fails with `NoResults` when nothing matches.
    pub async fn open(
        catalog: &dyn CatalogClient,
        query: &str,
        header: String,
        caps: BrowseCaps,
    ) -> Result<Self, JukeboxError> {
        let mut browse = Self {
            query: query.to_string(),
            header,
            caps,
            seen: KindCounts::default(),
            history: Vec::new(),
            page: Vec::new(),
        };
        browse.page = browse.compute_page(catalog).await;
        if browse.page.is_empty() {
            return Err(JukeboxError::NoResults(format!(
                "No results found for **{query}**."
            )));
        }
        Ok(browse)
    }

    /// Counts and offsets sent to the catalog for the current seen-offsets.
    pub fn requested_window(&self) -> SearchWindow {
        SearchWindow {
            artist_count: requested_count(self.caps.artists, self.seen.artists),
            artist_offset: self.seen.artists,
            album_count: requested_count(self.caps.albums, self.seen.albums),
            album_offset: self.seen.albums,
            track_count: requested_count(self.caps.tracks, self.seen.tracks),
            track_offset: self.seen.tracks,
        }
    }

    async fn compute_page(&self, catalog: &dyn CatalogClient) -> Vec<CatalogEntry> {
        let window = self.requested_window();
        if window.artist_count + window.album_count + window.track_count == 0 {
            return Vec::new();
        }
        let mut entries = catalog.search(&self.query, window).await;
        entries.truncate(PAGE_SIZE);
        entries
    }

    /// Move one page in `direction`.
    ///
    /// An empty recomputed page restores offsets and page and reports
    /// `NoFurtherResults`. `Previous` on the first page is a no-op.
    pub async fn advance(
        &mut self,
        catalog: &dyn CatalogClient,
        direction: Direction,
    ) -> Result<PageChange, JukeboxError> {
        let saved_seen = self.seen;
        let step = match direction {
            Direction::Next => {
                let shown = KindCounts::of(&self.page);
                self.seen = add_counts(self.seen, shown);
                shown
            }
            Direction::Previous => {
                if self.seen == KindCounts::default() {
                    return Ok(PageChange::Unchanged);
                }
                let Some(prior) = self.history.pop() else {
                    return Ok(PageChange::Unchanged);
                };
                self.seen = sub_counts(self.seen, prior);
                prior
            }
        };

        let page = self.compute_page(catalog).await;
        if page.is_empty() {
            tracing::debug!(
                query = %self.query,
                ?direction,
                "page change produced no entries; rolling back"
            );
            self.seen = saved_seen;
            if direction == Direction::Previous {
                self.history.push(step);
            }
            return Err(JukeboxError::NoFurtherResults);
        }
        if direction == Direction::Next {
            self.history.push(step);
        }
        self.page = page;
        Ok(PageChange::Changed)
    }

    pub fn page(&self) -> &[CatalogEntry] {
        &self.page
    }

    pub fn entry(&self, index: usize) -> Result<&CatalogEntry, JukeboxError> {
        self.page.get(index).ok_or(JukeboxError::IndexOutOfRange {
            index,
            len: self.page.len(),
        })
    }

    pub fn seen(&self) -> KindCounts {
        self.seen
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Display page number: `floor(sum of seen-offsets / PAGE_SIZE) + 1`.
    ///
    /// Approximate when per-kind counts differ between pages.
    pub fn page_number(&self) -> usize {
        self.seen.total() / PAGE_SIZE + 1
    }
}
