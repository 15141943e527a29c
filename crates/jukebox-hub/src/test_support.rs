//! In-memory catalog and transport used by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use jukebox_types::{Album, Artist, CatalogEntry, CommunityId, Track};

use crate::catalog::{CatalogClient, RandomFilter, SearchWindow, StreamLocator};
use crate::transport::{AudioSink, AudioTransport, SessionEvent, TrackEndNotifier, TransportError};

pub fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        title: format!("Song {id}"),
        album: "Album".to_string(),
        artist: "Artist".to_string(),
        cover_id: String::new(),
        duration_secs: 200,
    }
}

pub fn album(id: &str) -> Album {
    Album {
        id: id.to_string(),
        name: format!("Album {id}"),
        artist: "Artist".to_string(),
        cover_id: format!("al-{id}"),
        track_count: 2,
        duration_secs: 400,
    }
}

pub fn artist(id: &str) -> Artist {
    Artist {
        id: id.to_string(),
        name: format!("Artist {id}"),
        cover_id: String::new(),
        album_count: 1,
    }
}

fn window<T: Clone>(items: &[T], offset: usize, count: usize) -> Vec<T> {
    items.iter().skip(offset).take(count).cloned().collect()
}

/// Catalog backed by fixed lists. `search` ignores the query text.
#[derive(Default)]
pub struct FakeCatalog {
    artists: Mutex<Vec<Artist>>,
    albums: Mutex<Vec<Album>>,
    tracks: Mutex<Vec<Track>>,
    album_tracks: Mutex<HashMap<String, Vec<Track>>>,
    artist_albums: Mutex<HashMap<String, Vec<Album>>>,
    random: Mutex<VecDeque<Vec<Track>>>,
    similar: Mutex<HashMap<String, Vec<Track>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeCatalog {
    /// Library with `artists`, `albums` and `tracks` numbered entries of each kind.
    pub fn with_library(artists: usize, albums: usize, tracks: usize) -> Self {
        let catalog = Self::default();
        *catalog.artists.lock().unwrap() = (0..artists).map(|i| artist(&format!("ar{i}"))).collect();
        *catalog.albums.lock().unwrap() = (0..albums).map(|i| album(&format!("al{i}"))).collect();
        *catalog.tracks.lock().unwrap() = (0..tracks).map(|i| track(&format!("t{i}"))).collect();
        catalog
    }

    pub fn push_random(&self, tracks: Vec<Track>) {
        self.random.lock().unwrap().push_back(tracks);
    }

    pub fn set_similar(&self, seed: &str, tracks: Vec<Track>) {
        self.similar.lock().unwrap().insert(seed.to_string(), tracks);
    }

    pub fn set_album_tracks(&self, album_id: &str, tracks: Vec<Track>) {
        self.album_tracks.lock().unwrap().insert(album_id.to_string(), tracks);
    }

    pub fn set_artist_albums(&self, artist_id: &str, albums: Vec<Album>) {
        self.artist_albums.lock().unwrap().insert(artist_id.to_string(), albums);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn search(&self, query: &str, w: SearchWindow) -> Vec<CatalogEntry> {
        self.record(format!("search:{query}"));
        let mut out: Vec<CatalogEntry> = Vec::new();
        out.extend(
            window(self.artists.lock().unwrap().as_slice(), w.artist_offset, w.artist_count)
                .into_iter()
                .map(CatalogEntry::Artist),
        );
        out.extend(
            window(self.albums.lock().unwrap().as_slice(), w.album_offset, w.album_count)
                .into_iter()
                .map(CatalogEntry::Album),
        );
        out.extend(
            window(self.tracks.lock().unwrap().as_slice(), w.track_offset, w.track_count)
                .into_iter()
                .map(CatalogEntry::Track),
        );
        out
    }

    async fn random_tracks(&self, _filter: RandomFilter) -> Vec<Track> {
        self.record("random".to_string());
        self.random.lock().unwrap().pop_front().unwrap_or_default()
    }

    async fn similar_tracks(&self, track_id: &str, count: usize) -> Vec<Track> {
        self.record(format!("similar:{track_id}"));
        let similar = self.similar.lock().unwrap();
        similar
            .get(track_id)
            .map(|tracks| tracks.iter().take(count).cloned().collect())
            .unwrap_or_default()
    }

    async fn album_tracks(&self, album_id: &str) -> Vec<Track> {
        self.record(format!("album:{album_id}"));
        self.album_tracks.lock().unwrap().get(album_id).cloned().unwrap_or_default()
    }

    async fn artist_albums(&self, artist_id: &str) -> Vec<Album> {
        self.record(format!("artist:{artist_id}"));
        self.artist_albums.lock().unwrap().get(artist_id).cloned().unwrap_or_default()
    }

    fn stream_locator(&self, track_id: &str) -> StreamLocator {
        StreamLocator(format!("stream:{track_id}"))
    }

    fn cover_art_url(&self, cover_id: &str, size: u32) -> Option<String> {
        (!cover_id.is_empty()).then(|| format!("cover:{cover_id}:{size}"))
    }
}

/// Sink that records what it was asked to do.
#[derive(Default)]
pub struct FakeSink {
    fail_play: bool,
    played: Mutex<Vec<String>>,
    notifiers: Mutex<Vec<TrackEndNotifier>>,
    stops: AtomicUsize,
    playing: AtomicBool,
    disconnected: AtomicBool,
}

impl FakeSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A sink whose `play` always fails.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_play: true,
            ..Self::default()
        })
    }

    pub fn played(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    /// Completion event for the most recently dispatched track.
    pub fn last_end_event(&self) -> SessionEvent {
        self.notifiers
            .lock()
            .unwrap()
            .last()
            .map(TrackEndNotifier::event)
            .expect("no track was dispatched")
    }

    /// Fire the most recent notifier through the session channel.
    pub fn finish_last(&self) {
        self.playing.store(false, Ordering::SeqCst);
        if let Some(notifier) = self.notifiers.lock().unwrap().pop() {
            notifier.finished();
        }
    }
}

impl AudioSink for FakeSink {
    fn play(&self, locator: StreamLocator, notifier: TrackEndNotifier) -> Result<(), TransportError> {
        if self.fail_play {
            return Err(TransportError::Offline);
        }
        self.played.lock().unwrap().push(locator.0);
        self.notifiers.lock().unwrap().push(notifier);
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<(), TransportError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn disconnect(&self) {
        self.playing.store(false, Ordering::SeqCst);
        self.disconnected.store(true, Ordering::SeqCst);
    }
}

/// Transport handing out a fresh [`FakeSink`] per connect.
///
/// `connect` yields once before joining, so concurrent callers interleave.
#[derive(Default)]
pub struct FakeTransport {
    deny: bool,
    sinks: Mutex<Vec<(CommunityId, Arc<FakeSink>)>>,
    connects: AtomicUsize,
}

impl FakeTransport {
    pub fn denying() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }

    /// First sink handed out for `community`.
    pub fn sink_for(&self, community: CommunityId) -> Option<Arc<FakeSink>> {
        self.sinks_for(community).into_iter().next()
    }

    pub fn sinks_for(&self, community: CommunityId) -> Vec<Arc<FakeSink>> {
        self.sinks
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == community)
            .map(|(_, sink)| sink.clone())
            .collect()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioTransport for FakeTransport {
    async fn connect(
        &self,
        community: CommunityId,
        _channel_id: u64,
    ) -> Result<Arc<dyn AudioSink>, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.deny {
            return Err(TransportError::ConnectionDenied("denied".to_string()));
        }
        let sink = FakeSink::new();
        self.sinks.lock().unwrap().push((community, sink.clone()));
        let sink: Arc<dyn AudioSink> = sink;
        Ok(sink)
    }
}
