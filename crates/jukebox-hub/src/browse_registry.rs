//! Registry of open browse surfaces.
//!
//! Surfaces are looked up by id on every navigation or selection request. A surface
//! expires after a period of inactivity, and a new search from the same owner
//! discards the owner's older surfaces.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use jukebox_types::{Album, Artist, CatalogEntry, CommunityId, Track};

use crate::browse::PagedBrowse;
use crate::error::JukeboxError;

/// Opaque surface identifier, `browse:<uuid>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct BrowseId(String);

impl BrowseId {
    fn generate() -> Self {
        Self(format!("browse:{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BrowseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for BrowseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The user a surface was opened for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BrowseOwner {
    pub community: CommunityId,
    pub user_id: u64,
}

pub enum SurfaceKind {
    Search(PagedBrowse),
    /// Tracks of one album, not paginated.
    Album { album: Album, tracks: Vec<Track> },
    /// Albums of one artist, not paginated.
    Artist { artist: Artist, albums: Vec<Album> },
}

pub struct BrowseSurface {
    pub owner: BrowseOwner,
    pub kind: SurfaceKind,
}

impl BrowseSurface {
    /// Entries currently offered for selection.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        match &self.kind {
            SurfaceKind::Search(browse) => browse.page().to_vec(),
            SurfaceKind::Album { tracks, .. } => {
                tracks.iter().cloned().map(CatalogEntry::Track).collect()
            }
            SurfaceKind::Artist { albums, .. } => {
                albums.iter().cloned().map(CatalogEntry::Album).collect()
            }
        }
    }

    pub fn entry(&self, index: usize) -> Result<CatalogEntry, JukeboxError> {
        match &self.kind {
            SurfaceKind::Search(browse) => browse.entry(index).cloned(),
            SurfaceKind::Album { tracks, .. } => tracks
                .get(index)
                .cloned()
                .map(CatalogEntry::Track)
                .ok_or(JukeboxError::IndexOutOfRange { index, len: tracks.len() }),
            SurfaceKind::Artist { albums, .. } => albums
                .get(index)
                .cloned()
                .map(CatalogEntry::Album)
                .ok_or(JukeboxError::IndexOutOfRange { index, len: albums.len() }),
        }
    }
}

struct RegistryEntry {
    owner: BrowseOwner,
    created_at: Instant,
    last_active: Instant,
    surface: Arc<tokio::sync::Mutex<BrowseSurface>>,
}

pub struct BrowseRegistry {
    ttl: Duration,
    surfaces: Mutex<HashMap<BrowseId, RegistryEntry>>,
}

impl BrowseRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            surfaces: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new search surface, superseding the owner's previous ones.
    pub fn open_search(&self, owner: BrowseOwner, browse: PagedBrowse) -> BrowseId {
        self.open_search_at(owner, browse, Instant::now())
    }

    fn open_search_at(&self, owner: BrowseOwner, browse: PagedBrowse, now: Instant) -> BrowseId {
        let mut surfaces = self.surfaces.lock().unwrap_or_else(|err| err.into_inner());
        let before = surfaces.len();
        surfaces.retain(|_, entry| entry.owner != owner);
        let superseded = before - surfaces.len();
        if superseded > 0 {
            tracing::debug!(
                community = %owner.community,
                user_id = owner.user_id,
                superseded,
                "discarded previous browse surfaces"
            );
        }
        Self::insert(&mut surfaces, owner, SurfaceKind::Search(browse), now)
    }

    /// Register an album or artist surface opened from an existing one.
    pub fn open_child(&self, owner: BrowseOwner, kind: SurfaceKind) -> BrowseId {
        let mut surfaces = self.surfaces.lock().unwrap_or_else(|err| err.into_inner());
        Self::insert(&mut surfaces, owner, kind, Instant::now())
    }

    fn insert(
        surfaces: &mut HashMap<BrowseId, RegistryEntry>,
        owner: BrowseOwner,
        kind: SurfaceKind,
        now: Instant,
    ) -> BrowseId {
        let id = BrowseId::generate();
        surfaces.insert(
            id.clone(),
            RegistryEntry {
                owner,
                created_at: now,
                last_active: now,
                surface: Arc::new(tokio::sync::Mutex::new(BrowseSurface { owner, kind })),
            },
        );
        id
    }

    /// Look up a live surface and refresh its activity timestamp.
    pub fn get(&self, id: &BrowseId) -> Result<Arc<tokio::sync::Mutex<BrowseSurface>>, JukeboxError> {
        self.get_at(id, Instant::now())
    }

    fn get_at(
        &self,
        id: &BrowseId,
        now: Instant,
    ) -> Result<Arc<tokio::sync::Mutex<BrowseSurface>>, JukeboxError> {
        let mut surfaces = self.surfaces.lock().unwrap_or_else(|err| err.into_inner());
        self.purge_locked(&mut surfaces, now);
        let entry = surfaces
            .get_mut(id)
            .ok_or_else(|| JukeboxError::BrowseExpired(id.to_string()))?;
        entry.last_active = now;
        Ok(entry.surface.clone())
    }

    fn purge_locked(&self, surfaces: &mut HashMap<BrowseId, RegistryEntry>, now: Instant) {
        let ttl = self.ttl;
        surfaces.retain(|id, entry| {
            let live = now.saturating_duration_since(entry.last_active) < ttl;
            if !live {
                tracing::debug!(
                    browse_id = %id,
                    age_secs = now.saturating_duration_since(entry.created_at).as_secs(),
                    "browse surface expired"
                );
            }
            live
        });
    }

    /// Drop every expired surface.
    pub fn purge_expired(&self) -> usize {
        let mut surfaces = self.surfaces.lock().unwrap_or_else(|err| err.into_inner());
        let before = surfaces.len();
        self.purge_locked(&mut surfaces, Instant::now());
        before - surfaces.len()
    }

    pub fn len(&self) -> usize {
        self.surfaces.lock().unwrap_or_else(|err| err.into_inner()).len()
    }
}
