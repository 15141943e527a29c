//! User-facing command surface on top of the session manager and browse engine.
//!
//! Each command validates the requester, performs the queue or browse operation and
//! returns something for the chat layer to render.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use jukebox_types::{Album, Artist, AutoplayMode, CatalogEntry, CommunityId, Track};

use crate::browse::{BrowseCaps, Direction, PagedBrowse};
use crate::browse_registry::{BrowseId, BrowseOwner, BrowseRegistry, BrowseSurface, SurfaceKind};
use crate::catalog::{CatalogClient, SearchWindow};
use crate::error::JukeboxError;
use crate::render::{self, Reply, SelectOption};
use crate::session_manager::{PlaybackSessionManager, StartOutcome};
use crate::transport::{AudioSink, AudioTransport};

/// Cover art edge length requested for reply thumbnails.
const THUMBNAIL_SIZE: u32 = 300;

/// The chat user issuing a command.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Requester {
    pub user_id: u64,
    pub display_name: String,
    /// Audio channel the user is currently in.
    #[serde(default)]
    pub audio_channel: Option<u64>,
}

/// Which kinds a search command returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    #[default]
    All,
    Track,
    Album,
    Artist,
}

impl SearchKind {
    fn caps(self) -> BrowseCaps {
        match self {
            SearchKind::All => BrowseCaps {
                artists: Some(2),
                albums: Some(3),
                tracks: None,
            },
            SearchKind::Track => BrowseCaps {
                artists: Some(0),
                albums: Some(0),
                tracks: None,
            },
            SearchKind::Album => BrowseCaps {
                artists: Some(0),
                albums: None,
                tracks: Some(0),
            },
            SearchKind::Artist => BrowseCaps {
                artists: None,
                albums: Some(0),
                tracks: Some(0),
            },
        }
    }

    fn header(self, query: &str) -> String {
        match self {
            SearchKind::All => format!("**Search Results:** {query}"),
            SearchKind::Track => format!("**Track Search:** {query}"),
            SearchKind::Album => format!("**Album Search:** {query}"),
            SearchKind::Artist => format!("**Artist Search:** {query}"),
        }
    }
}

/// A rendered browse surface.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BrowseView {
    pub browse_id: BrowseId,
    pub listing: Reply,
    pub options: Vec<SelectOption>,
    /// Page number for paginated searches.
    pub page: Option<usize>,
    /// True when the surface offers an "enqueue all" action.
    pub enqueue_all: bool,
}

/// What selecting an entry did.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectOutcome {
    Enqueued { reply: Reply },
    Opened { view: BrowseView },
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CommunityStatus {
    pub community: CommunityId,
    pub connected: bool,
    pub is_playing: bool,
    pub current_track: Option<Track>,
    pub queue_len: usize,
    pub autoplay_mode: AutoplayMode,
    pub reply: Reply,
}

enum EnqueueBatch {
    Album(Album, Vec<Track>),
    Albums(Vec<Album>),
}

pub struct CommandController {
    sessions: Arc<PlaybackSessionManager>,
    catalog: Arc<dyn CatalogClient>,
    transport: Arc<dyn AudioTransport>,
    browse: BrowseRegistry,
}

fn render_view(id: BrowseId, surface: &BrowseSurface) -> BrowseView {
    let entries = surface.entries();
    let (listing, page, enqueue_all) = match &surface.kind {
        SurfaceKind::Search(browse) => (
            render::listing(browse.header(), &entries, &render::page_footer(browse.page_number())),
            Some(browse.page_number()),
            false,
        ),
        SurfaceKind::Album { album, .. } => {
            (render::listing(&render::album_header(album), &entries, ""), None, true)
        }
        SurfaceKind::Artist { artist, .. } => {
            (render::listing(&render::artist_header(&artist.name), &entries, ""), None, true)
        }
    };
    BrowseView {
        browse_id: id,
        options: render::selection_options(&entries),
        listing,
        page,
        enqueue_all,
    }
}

impl CommandController {
    pub fn new(
        sessions: Arc<PlaybackSessionManager>,
        catalog: Arc<dyn CatalogClient>,
        transport: Arc<dyn AudioTransport>,
        browse: BrowseRegistry,
    ) -> Self {
        Self {
            sessions,
            catalog,
            transport,
            browse,
        }
    }

    pub fn sessions(&self) -> &Arc<PlaybackSessionManager> {
        &self.sessions
    }

    pub fn browse_registry(&self) -> &BrowseRegistry {
        &self.browse
    }

    fn thumbnail(&self, cover_id: &str) -> Option<String> {
        self.catalog.cover_art_url(cover_id, THUMBNAIL_SIZE)
    }

    async fn sink_or_connect(
        &self,
        community: CommunityId,
        channel_id: u64,
    ) -> Result<Arc<dyn AudioSink>, JukeboxError> {
        if let Some(sink) = self.sessions.sink(community).await {
            return Ok(sink);
        }
        let sink = self
            .transport
            .connect(community, channel_id)
            .await
            .map_err(|err| {
                tracing::warn!(community = %community, channel_id, error = %err, "audio connect failed");
                JukeboxError::ConnectionDenied(err.to_string())
            })?;
        match self.sessions.attach_if_absent(community, sink.clone()).await {
            Some(attached) => {
                tracing::debug!(community = %community, "sink attached concurrently; dropping duplicate connection");
                sink.disconnect();
                Ok(attached)
            }
            None => Ok(sink),
        }
    }

    /// Start playback if a sink is attached and nothing is playing.
    async fn resume_if_attached(&self, community: CommunityId) -> Result<(), JukeboxError> {
        let Some(sink) = self.sessions.sink(community).await else {
            return Ok(());
        };
        match self.sessions.start_or_resume(community, sink).await? {
            StartOutcome::Started(track) => {
                tracing::debug!(community = %community, track_id = %track.id, "playback started");
            }
            StartOutcome::AlreadyPlaying | StartOutcome::QueueEmpty => {}
        }
        Ok(())
    }

    /// Playback changes from a menu need the requester in an audio channel once
    /// the community has one attached.
    async fn ensure_may_control(
        &self,
        community: CommunityId,
        requester: &Requester,
    ) -> Result<(), JukeboxError> {
        if requester.audio_channel.is_none() && self.sessions.sink(community).await.is_some() {
            return Err(JukeboxError::NotInAudioChannel);
        }
        Ok(())
    }

    /// `play` with or without a query.
    ///
    /// With a query the first matching track is enqueued and playback starts if the
    /// community is idle.
    pub async fn play(
        &self,
        community: CommunityId,
        requester: &Requester,
        query: Option<&str>,
    ) -> Result<Reply, JukeboxError> {
        let channel_id = requester.audio_channel.ok_or(JukeboxError::NotInAudioChannel)?;
        let sink = self.sink_or_connect(community, channel_id).await?;
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        let Some(query) = query else {
            return match self.sessions.start_or_resume(community, sink).await? {
                StartOutcome::Started(_) => Ok(render::starting_queue_playback()),
                StartOutcome::AlreadyPlaying => Err(JukeboxError::AlreadyPlaying),
                StartOutcome::QueueEmpty => Err(JukeboxError::QueueEmpty),
            };
        };

        let track = self
            .catalog
            .search(query, SearchWindow::tracks_only(1))
            .await
            .into_iter()
            .find_map(|entry| match entry {
                CatalogEntry::Track(track) => Some(track),
                _ => None,
            })
            .ok_or_else(|| JukeboxError::NoResults(format!("No result found for **{query}**.")))?;

        tracing::info!(community = %community, user_id = requester.user_id, track_id = %track.id, "play query matched");
        self.sessions.enqueue(community, track.clone()).await;
        let reply = render::added_to_queue(&requester.display_name, &track, self.thumbnail(&track.cover_id));
        self.sessions.start_or_resume(community, sink).await?;
        Ok(reply)
    }

    pub async fn search(
        &self,
        community: CommunityId,
        requester: &Requester,
        kind: SearchKind,
        query: &str,
    ) -> Result<BrowseView, JukeboxError> {
        let browse =
            PagedBrowse::open(self.catalog.as_ref(), query, kind.header(query), kind.caps()).await?;
        let owner = BrowseOwner {
            community,
            user_id: requester.user_id,
        };
        let id = self.browse.open_search(owner, browse);
        tracing::debug!(community = %community, browse_id = %id, ?kind, "search opened");
        let surface = self.browse.get(&id)?;
        let surface = surface.lock().await;
        Ok(render_view(id, &surface))
    }

    /// Navigate a search surface.
    pub async fn page(&self, id: &BrowseId, direction: Direction) -> Result<BrowseView, JukeboxError> {
        let surface = self.browse.get(id)?;
        let mut surface = surface.lock().await;
        let SurfaceKind::Search(browse) = &mut surface.kind else {
            return Err(JukeboxError::ActionUnavailable);
        };
        browse.advance(self.catalog.as_ref(), direction).await?;
        tracing::debug!(browse_id = %id, query = %browse.query(), page = browse.page_number(), "page changed");
        Ok(render_view(id.clone(), &surface))
    }

    /// Dispatch the entry at `index`: tracks are enqueued, albums and artists open
    /// a sub-surface.
    pub async fn select(
        &self,
        id: &BrowseId,
        requester: &Requester,
        index: usize,
    ) -> Result<SelectOutcome, JukeboxError> {
        let (owner, entry) = {
            let surface = self.browse.get(id)?;
            let surface = surface.lock().await;
            let entry = surface.entry(index)?;
            (surface.owner, entry)
        };
        match entry {
            CatalogEntry::Track(track) => {
                self.ensure_may_control(owner.community, requester).await?;
                self.sessions.enqueue(owner.community, track.clone()).await;
                let reply =
                    render::added_to_queue(&requester.display_name, &track, self.thumbnail(&track.cover_id));
                self.resume_if_attached(owner.community).await?;
                Ok(SelectOutcome::Enqueued { reply })
            }
            CatalogEntry::Album(album) => {
                let view = self.open_album(owner, album).await?;
                Ok(SelectOutcome::Opened { view })
            }
            CatalogEntry::Artist(artist) => {
                let view = self.open_artist(owner, artist).await?;
                Ok(SelectOutcome::Opened { view })
            }
        }
    }

    async fn open_album(&self, owner: BrowseOwner, album: Album) -> Result<BrowseView, JukeboxError> {
        let tracks = self.catalog.album_tracks(&album.id).await;
        if tracks.is_empty() {
            return Err(JukeboxError::NoResults(format!(
                "No tracks found for album **{}**.",
                album.name
            )));
        }
        let id = self.browse.open_child(owner, SurfaceKind::Album { album, tracks });
        let surface = self.browse.get(&id)?;
        let surface = surface.lock().await;
        Ok(render_view(id, &surface))
    }

    async fn open_artist(&self, owner: BrowseOwner, artist: Artist) -> Result<BrowseView, JukeboxError> {
        let albums = self.catalog.artist_albums(&artist.id).await;
        if albums.is_empty() {
            return Err(JukeboxError::NoResults(format!(
                "No albums found for artist **{}**.",
                artist.name
            )));
        }
        let id = self.browse.open_child(owner, SurfaceKind::Artist { artist, albums });
        let surface = self.browse.get(&id)?;
        let surface = surface.lock().await;
        Ok(render_view(id, &surface))
    }

    /// The "enqueue all" action of an album or artist surface.
    ///
    /// Everything is enqueued before playback is attempted. Artist surfaces add one
    /// album at a time in catalog order.
    pub async fn enqueue_all(&self, id: &BrowseId, requester: &Requester) -> Result<Vec<Reply>, JukeboxError> {
        let (owner, batch) = {
            let surface = self.browse.get(id)?;
            let surface = surface.lock().await;
            let batch = match &surface.kind {
                SurfaceKind::Search(_) => return Err(JukeboxError::ActionUnavailable),
                SurfaceKind::Album { album, tracks } => EnqueueBatch::Album(album.clone(), tracks.clone()),
                SurfaceKind::Artist { albums, .. } => EnqueueBatch::Albums(albums.clone()),
            };
            (surface.owner, batch)
        };
        self.ensure_may_control(owner.community, requester).await?;

        let mut replies = Vec::new();
        match batch {
            EnqueueBatch::Album(album, tracks) => {
                self.sessions.enqueue_many(owner.community, tracks).await;
                replies.push(render::added_album_to_queue(
                    &requester.display_name,
                    &album,
                    self.thumbnail(&album.cover_id),
                ));
            }
            EnqueueBatch::Albums(albums) => {
                for album in albums {
                    let tracks = self.catalog.album_tracks(&album.id).await;
                    if tracks.is_empty() {
                        tracing::warn!(album_id = %album.id, "album returned no tracks; skipped");
                        continue;
                    }
                    self.sessions.enqueue_many(owner.community, tracks).await;
                    replies.push(render::added_album_to_queue(
                        &requester.display_name,
                        &album,
                        self.thumbnail(&album.cover_id),
                    ));
                }
            }
        }
        self.resume_if_attached(owner.community).await?;
        Ok(replies)
    }

    /// Leave the audio channel. The queue is kept.
    pub async fn stop(&self, community: CommunityId) -> Result<Reply, JukeboxError> {
        if !self.sessions.disconnect(community).await {
            return Err(JukeboxError::NotPlaying);
        }
        Ok(render::disconnected())
    }

    pub async fn show_queue(&self, community: CommunityId) -> Reply {
        render::queue(&self.sessions.queue_contents(community).await)
    }

    pub async fn clear_queue(&self, community: CommunityId, requester: &Requester) -> Reply {
        self.sessions.clear_queue(community).await;
        render::queue_cleared(&requester.display_name)
    }

    pub async fn skip(&self, community: CommunityId) -> Result<Reply, JukeboxError> {
        self.sessions.skip(community).await?;
        Ok(render::skipped())
    }

    /// Change the autoplay mode; starts playback when attached and idle.
    pub async fn autoplay(
        &self,
        community: CommunityId,
        requester: &Requester,
        mode: AutoplayMode,
    ) -> Result<Reply, JukeboxError> {
        self.sessions.set_autoplay_mode(community, mode).await;
        let reply = render::autoplay_changed(&requester.display_name, mode);
        if let Err(err) = self.resume_if_attached(community).await {
            tracing::warn!(community = %community, error = %err, "autoplay start failed");
        }
        Ok(reply)
    }

    pub async fn status(&self, community: CommunityId) -> CommunityStatus {
        let current_track = self.sessions.current_track(community).await;
        let reply = match current_track.as_ref() {
            Some(track) => render::playing(track, self.thumbnail(&track.cover_id)),
            None => render::nothing_playing(),
        };
        CommunityStatus {
            community,
            connected: self.sessions.sink(community).await.is_some(),
            is_playing: self.sessions.is_playing(community).await,
            current_track,
            queue_len: self.sessions.queue_contents(community).await.len(),
            autoplay_mode: self.sessions.autoplay_mode(community).await,
            reply,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::events::EventBus;
    use crate::test_support::{FakeCatalog, FakeTransport, album, track};

    const GUILD: CommunityId = CommunityId(1);

    fn controller(catalog: Arc<FakeCatalog>, transport: Arc<FakeTransport>) -> CommandController {
        let (sessions, _session_rx) = PlaybackSessionManager::new(catalog.clone(), EventBus::new());
        CommandController::new(
            Arc::new(sessions),
            catalog,
            transport,
            BrowseRegistry::new(Duration::from_secs(180)),
        )
    }

    fn listener() -> Requester {
        Requester {
            user_id: 7,
            display_name: "ana".to_string(),
            audio_channel: Some(55),
        }
    }

    fn bystander() -> Requester {
        Requester {
            user_id: 8,
            display_name: "bo".to_string(),
            audio_channel: None,
        }
    }

    fn queued_ids(tracks: Vec<Track>) -> Vec<String> {
        tracks.into_iter().map(|t| t.id).collect()
    }

    #[tokio::test]
    async fn play_requires_audio_channel() {
        let c = controller(Arc::new(FakeCatalog::default()), Arc::new(FakeTransport::default()));
        let err = c.play(GUILD, &bystander(), Some("foo")).await.unwrap_err();
        assert_eq!(err, JukeboxError::NotInAudioChannel);
    }

    #[tokio::test]
    async fn play_reports_denied_connection() {
        let c = controller(Arc::new(FakeCatalog::default()), Arc::new(FakeTransport::denying()));
        let err = c.play(GUILD, &listener(), None).await.unwrap_err();
        assert!(matches!(err, JukeboxError::ConnectionDenied(_)));
    }

    #[tokio::test]
    async fn play_without_query_needs_something_to_play() {
        let transport = Arc::new(FakeTransport::default());
        let c = controller(Arc::new(FakeCatalog::default()), transport.clone());
        let err = c.play(GUILD, &listener(), None).await.unwrap_err();
        assert_eq!(err, JukeboxError::QueueEmpty);
        assert!(c.status(GUILD).await.connected);
    }

    #[tokio::test]
    async fn play_query_enqueues_and_starts() {
        let catalog = Arc::new(FakeCatalog::with_library(0, 0, 3));
        let transport = Arc::new(FakeTransport::default());
        let c = controller(catalog, transport.clone());

        let reply = c.play(GUILD, &listener(), Some("foo")).await.unwrap();

        assert_eq!(reply.title, "ana added track to queue");
        let sink = transport.sink_for(GUILD).unwrap();
        assert_eq!(sink.played(), vec!["stream:t0".to_string()]);
        assert_eq!(
            c.play(GUILD, &listener(), None).await.unwrap_err(),
            JukeboxError::AlreadyPlaying
        );
        assert_eq!(transport.connects(), 1);
    }

    #[tokio::test]
    async fn play_query_without_match_is_rejected() {
        let c = controller(Arc::new(FakeCatalog::default()), Arc::new(FakeTransport::default()));
        let err = c.play(GUILD, &listener(), Some("zzz")).await.unwrap_err();
        assert_eq!(err, JukeboxError::NoResults("No result found for **zzz**.".to_string()));
    }

    #[tokio::test]
    async fn album_selection_opens_its_tracks_and_enqueues_all_in_order() {
        let catalog = Arc::new(FakeCatalog::with_library(2, 3, 5));
        catalog.set_album_tracks("al0", vec![track("x"), track("y")]);
        let c = controller(catalog, Arc::new(FakeTransport::default()));

        let view = c.search(GUILD, &listener(), SearchKind::All, "foo").await.unwrap();
        assert_eq!(view.options.len(), 10);
        assert_eq!(view.page, Some(1));
        assert_eq!(view.listing.title, "**Search Results:** foo");

        let SelectOutcome::Opened { view: album_view } = c.select(&view.browse_id, &listener(), 2).await.unwrap()
        else {
            panic!("album selection should open a surface");
        };
        assert!(album_view.enqueue_all);
        assert_eq!(album_view.options.len(), 2);
        assert_eq!(album_view.listing.title, "Artist - **Album al0**");

        let replies = c.enqueue_all(&album_view.browse_id, &listener()).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(queued_ids(c.sessions().queue_contents(GUILD).await), vec!["x", "y"]);
    }

    #[tokio::test]
    async fn artist_enqueue_all_adds_each_album_in_catalog_order() {
        let catalog = Arc::new(FakeCatalog::with_library(1, 0, 0));
        catalog.set_artist_albums("ar0", vec![album("al7"), album("al8")]);
        catalog.set_album_tracks("al7", vec![track("a"), track("b")]);
        catalog.set_album_tracks("al8", vec![track("c")]);
        let c = controller(catalog, Arc::new(FakeTransport::default()));

        let view = c.search(GUILD, &listener(), SearchKind::Artist, "foo").await.unwrap();
        let SelectOutcome::Opened { view: artist_view } = c.select(&view.browse_id, &listener(), 0).await.unwrap()
        else {
            panic!("artist selection should open a surface");
        };
        let replies = c.enqueue_all(&artist_view.browse_id, &listener()).await.unwrap();

        assert_eq!(replies.len(), 2);
        assert_eq!(queued_ids(c.sessions().queue_contents(GUILD).await), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn track_selection_needs_channel_once_connected() {
        let catalog = Arc::new(FakeCatalog::with_library(0, 0, 3));
        let c = controller(catalog, Arc::new(FakeTransport::default()));
        let view = c.search(GUILD, &bystander(), SearchKind::Track, "foo").await.unwrap();

        // Not connected yet: anyone may queue.
        assert!(matches!(
            c.select(&view.browse_id, &bystander(), 1).await,
            Ok(SelectOutcome::Enqueued { .. })
        ));

        c.play(GUILD, &listener(), None).await.unwrap();
        assert_eq!(
            c.select(&view.browse_id, &bystander(), 2).await.unwrap_err(),
            JukeboxError::NotInAudioChannel
        );
    }

    #[tokio::test]
    async fn track_selection_starts_idle_attached_playback() {
        let catalog = Arc::new(FakeCatalog::with_library(0, 0, 3));
        let transport = Arc::new(FakeTransport::default());
        let c = controller(catalog, transport.clone());
        assert_eq!(c.play(GUILD, &listener(), None).await.unwrap_err(), JukeboxError::QueueEmpty);

        let view = c.search(GUILD, &listener(), SearchKind::Track, "foo").await.unwrap();
        c.select(&view.browse_id, &listener(), 1).await.unwrap();

        let sink = transport.sink_for(GUILD).unwrap();
        assert_eq!(sink.played(), vec!["stream:t1".to_string()]);
        assert!(c.sessions().is_playing(GUILD).await);
    }

    #[tokio::test]
    async fn actions_not_offered_by_a_surface_are_rejected() {
        let catalog = Arc::new(FakeCatalog::with_library(0, 1, 0));
        catalog.set_album_tracks("al0", vec![track("x")]);
        let c = controller(catalog, Arc::new(FakeTransport::default()));
        let search = c.search(GUILD, &listener(), SearchKind::Album, "foo").await.unwrap();
        assert_eq!(
            c.enqueue_all(&search.browse_id, &listener()).await.unwrap_err(),
            JukeboxError::ActionUnavailable
        );

        let SelectOutcome::Opened { view } = c.select(&search.browse_id, &listener(), 0).await.unwrap() else {
            panic!("album selection should open a surface");
        };
        assert_eq!(
            c.page(&view.browse_id, Direction::Next).await.unwrap_err(),
            JukeboxError::ActionUnavailable
        );
    }

    #[tokio::test]
    async fn unknown_browse_id_is_expired() {
        let c = controller(Arc::new(FakeCatalog::default()), Arc::new(FakeTransport::default()));
        let id = BrowseId::from("browse:missing".to_string());
        assert!(matches!(
            c.page(&id, Direction::Next).await,
            Err(JukeboxError::BrowseExpired(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_plays_share_one_sink() {
        let catalog = Arc::new(FakeCatalog::with_library(0, 0, 3));
        let transport = Arc::new(FakeTransport::default());
        let c = controller(catalog, transport.clone());
        let other = Requester {
            user_id: 9,
            display_name: "cy".to_string(),
            audio_channel: Some(55),
        };

        let first = listener();
        let (a, b) = tokio::join!(
            c.play(GUILD, &first, Some("foo")),
            c.play(GUILD, &other, Some("foo"))
        );
        a.unwrap();
        b.unwrap();
        c.skip(GUILD).await.unwrap();

        let sinks = transport.sinks_for(GUILD);
        let (playing, idle): (Vec<_>, Vec<_>) =
            sinks.iter().partition(|sink| !sink.played().is_empty());
        assert_eq!(playing.len(), 1);
        assert_eq!(playing[0].played(), vec!["stream:t0".to_string()]);
        assert_eq!(playing[0].stops(), 1);
        assert!(!playing[0].disconnected());
        for sink in idle {
            assert!(sink.disconnected());
            assert_eq!(sink.stops(), 0);
        }
        assert_eq!(queued_ids(c.sessions().queue_contents(GUILD).await), vec!["t0"]);
    }

    #[tokio::test]
    async fn stop_and_skip_need_active_playback() {
        let catalog = Arc::new(FakeCatalog::with_library(0, 0, 3));
        let transport = Arc::new(FakeTransport::default());
        let c = controller(catalog, transport.clone());
        assert_eq!(c.stop(GUILD).await.unwrap_err(), JukeboxError::NotPlaying);
        assert_eq!(c.skip(GUILD).await.unwrap_err(), JukeboxError::NotPlaying);

        c.play(GUILD, &listener(), Some("foo")).await.unwrap();
        assert_eq!(c.skip(GUILD).await.unwrap().title, "Skipped track");
        assert_eq!(c.stop(GUILD).await.unwrap().title, "Disconnected from voice channel");

        assert!(transport.sink_for(GUILD).unwrap().disconnected());
        let status = c.status(GUILD).await;
        assert!(!status.connected);
        assert!(!status.is_playing);
    }

    #[tokio::test]
    async fn autoplay_change_starts_idle_attached_playback() {
        let catalog = Arc::new(FakeCatalog::default());
        catalog.push_random(vec![track("r1")]);
        let transport = Arc::new(FakeTransport::default());
        let c = controller(catalog, transport.clone());
        let _ = c.play(GUILD, &listener(), None).await;

        let reply = c.autoplay(GUILD, &listener(), AutoplayMode::Random).await.unwrap();

        assert_eq!(reply.title, "Autoplay enabled by ana");
        assert_eq!(transport.sink_for(GUILD).unwrap().played(), vec!["stream:r1".to_string()]);
        let status = c.status(GUILD).await;
        assert_eq!(status.autoplay_mode, AutoplayMode::Random);
        assert_eq!(status.reply.title, "Playing:");
    }

    #[tokio::test]
    async fn clear_and_show_queue() {
        let catalog = Arc::new(FakeCatalog::with_library(0, 0, 3));
        let c = controller(catalog, Arc::new(FakeTransport::default()));
        let view = c.search(GUILD, &listener(), SearchKind::Track, "foo").await.unwrap();
        c.select(&view.browse_id, &listener(), 0).await.unwrap();
        assert!(c.show_queue(GUILD).await.description.unwrap().starts_with("1. **Song t0**"));

        assert_eq!(c.clear_queue(GUILD, &listener()).await.title, "ana cleared the queue");
        assert_eq!(c.show_queue(GUILD).await.description.as_deref(), Some("Queue is empty!"));
    }
}
