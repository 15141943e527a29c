//! Per-community playback sessions: queue, autoplay and head-advance.
//!
//! Each community owns one [`PlaybackSessionState`] behind its own async mutex, so
//! requests for the same community serialize while other communities proceed.
//! The manager is the only place that mutates queue or current-track state.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use jukebox_types::{AutoplayMode, CommunityId, CommunitySettings, Track};

use crate::autoplay;
use crate::catalog::CatalogClient;
use crate::error::JukeboxError;
use crate::events::EventBus;
use crate::transport::{AudioSink, SessionEvent, TrackEndNotifier, TransportError};

/// Number of recently played track ids remembered for `Similar` autoplay.
const RECENT_HISTORY: usize = 50;

/// Mutable playback state of one community.
#[derive(Default)]
pub struct PlaybackSessionState {
    queue: VecDeque<Track>,
    autoplay_mode: AutoplayMode,
    is_playing: bool,
    current_track: Option<Track>,
    /// Seed for `Similar` autoplay once the current track is gone.
    last_played: Option<Track>,
    /// Bumped on every dispatch; completion events carry the value they were issued with.
    generation: u64,
    recent: VecDeque<String>,
    sink: Option<Arc<dyn AudioSink>>,
}

impl PlaybackSessionState {
    fn remember(&mut self, track: &Track) {
        self.recent.push_back(track.id.clone());
        while self.recent.len() > RECENT_HISTORY {
            self.recent.pop_front();
        }
    }

    fn seen_ids(&self) -> HashSet<&str> {
        self.recent
            .iter()
            .map(String::as_str)
            .chain(self.queue.iter().map(|t| t.id.as_str()))
            .collect()
    }
}

struct CommunitySession {
    state: tokio::sync::Mutex<PlaybackSessionState>,
}

impl CommunitySession {
    fn new(autoplay_mode: AutoplayMode) -> Self {
        Self {
            state: tokio::sync::Mutex::new(PlaybackSessionState {
                autoplay_mode,
                ..PlaybackSessionState::default()
            }),
        }
    }
}

/// Result of a `start_or_resume` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The queue head (or an autoplay pick) is now streaming.
    Started(Track),
    /// Playback was already active; nothing changed.
    AlreadyPlaying,
    /// Nothing to play.
    QueueEmpty,
}

enum AdvanceOutcome {
    Playing(Track),
    Ended,
    Failed(TransportError),
}

pub struct PlaybackSessionManager {
    sessions: Mutex<HashMap<CommunityId, Arc<CommunitySession>>>,
    catalog: Arc<dyn CatalogClient>,
    events: EventBus,
    session_tx: UnboundedSender<SessionEvent>,
}

impl PlaybackSessionManager {
    /// Create a manager and the receiver its sinks report track ends on.
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        events: EventBus,
    ) -> (Self, UnboundedReceiver<SessionEvent>) {
        let (session_tx, session_rx) = unbounded_channel();
        let manager = Self {
            sessions: Mutex::new(HashMap::new()),
            catalog,
            events,
            session_tx,
        };
        (manager, session_rx)
    }

    /// Return the session for `community`, creating it on first access.
    fn session(&self, community: CommunityId) -> Arc<CommunitySession> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|err| err.into_inner());
        sessions
            .entry(community)
            .or_insert_with(|| Arc::new(CommunitySession::new(AutoplayMode::None)))
            .clone()
    }

    fn existing_session(&self, community: CommunityId) -> Option<Arc<CommunitySession>> {
        self.sessions
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .get(&community)
            .cloned()
    }

    /// Append a track to the tail of the queue.
    pub async fn enqueue(&self, community: CommunityId, track: Track) {
        let session = self.session(community);
        let mut state = session.state.lock().await;
        tracing::debug!(community = %community, track_id = %track.id, "enqueue");
        state.queue.push_back(track);
        self.events.queue_changed(community);
    }

    /// Append a batch in order; no other mutation interleaves with it.
    pub async fn enqueue_many(&self, community: CommunityId, tracks: Vec<Track>) -> usize {
        if tracks.is_empty() {
            return 0;
        }
        let session = self.session(community);
        let mut state = session.state.lock().await;
        let added = tracks.len();
        state.queue.extend(tracks);
        tracing::debug!(community = %community, added, "enqueue batch");
        self.events.queue_changed(community);
        added
    }

    /// Empty the queue. In-progress playback continues.
    pub async fn clear_queue(&self, community: CommunityId) {
        let session = self.session(community);
        let mut state = session.state.lock().await;
        if !state.queue.is_empty() {
            state.queue.clear();
            self.events.queue_changed(community);
        }
    }

    /// Attach a freshly connected sink without starting playback.
    ///
    /// When another sink got attached first, that one is kept and returned and
    /// `sink` is left to the caller.
    pub async fn attach_if_absent(
        &self,
        community: CommunityId,
        sink: Arc<dyn AudioSink>,
    ) -> Option<Arc<dyn AudioSink>> {
        let session = self.session(community);
        let mut state = session.state.lock().await;
        if let Some(existing) = state.sink.clone() {
            return Some(existing);
        }
        state.sink = Some(sink);
        None
    }

    /// Begin playing the queue head unless already playing.
    ///
    /// `sink` is attached only when the community has none; an attached sink
    /// always wins.
    pub async fn start_or_resume(
        &self,
        community: CommunityId,
        sink: Arc<dyn AudioSink>,
    ) -> Result<StartOutcome, JukeboxError> {
        let session = self.session(community);
        let mut state = session.state.lock().await;
        if state.sink.is_none() {
            state.sink = Some(sink);
        }
        if state.is_playing {
            return Ok(StartOutcome::AlreadyPlaying);
        }
        if state.queue.is_empty() && state.autoplay_mode == AutoplayMode::None {
            return Ok(StartOutcome::QueueEmpty);
        }
        match self.advance_locked(community, &mut state).await {
            AdvanceOutcome::Playing(track) => Ok(StartOutcome::Started(track)),
            AdvanceOutcome::Ended => Ok(StartOutcome::QueueEmpty),
            AdvanceOutcome::Failed(err) => Err(JukeboxError::ConnectionDenied(err.to_string())),
        }
    }

    /// Stop the current track; the transport's completion event advances the queue.
    pub async fn skip(&self, community: CommunityId) -> Result<Track, JukeboxError> {
        let session = self.existing_session(community).ok_or(JukeboxError::NotPlaying)?;
        let state = session.state.lock().await;
        let (Some(sink), Some(current)) = (state.sink.clone(), state.current_track.clone()) else {
            return Err(JukeboxError::NotPlaying);
        };
        if !state.is_playing {
            return Err(JukeboxError::NotPlaying);
        }
        tracing::info!(community = %community, track_id = %current.id, "skip");
        sink.stop()
            .map_err(|err| JukeboxError::ConnectionDenied(err.to_string()))?;
        Ok(current)
    }

    /// Detach and disconnect the sink, halting playback but keeping the queue.
    ///
    /// Returns `false` when no sink was attached.
    pub async fn disconnect(&self, community: CommunityId) -> bool {
        let Some(session) = self.existing_session(community) else {
            return false;
        };
        let mut state = session.state.lock().await;
        let Some(sink) = state.sink.take() else {
            return false;
        };
        state.generation += 1;
        let was_playing = std::mem::replace(&mut state.is_playing, false);
        if let Some(track) = state.current_track.take() {
            state.last_played = Some(track);
        }
        sink.disconnect();
        tracing::info!(community = %community, was_playing, "audio sink disconnected");
        if was_playing {
            self.events.playback_ended(community);
        }
        true
    }

    /// Handle a transport completion event.
    pub async fn handle_event(&self, event: SessionEvent) {
        let SessionEvent::TrackEnded {
            community,
            generation,
        } = event;
        let Some(session) = self.existing_session(community) else {
            tracing::debug!(community = %community, "track end for unknown community");
            return;
        };
        let mut state = session.state.lock().await;
        if state.generation != generation || !state.is_playing {
            tracing::debug!(
                community = %community,
                generation,
                current = state.generation,
                "stale track end ignored"
            );
            return;
        }
        if let Some(track) = state.current_track.take() {
            state.last_played = Some(track);
        }
        state.is_playing = false;
        if let AdvanceOutcome::Failed(err) = self.advance_locked(community, &mut state).await {
            tracing::warn!(community = %community, error = %err, "advance after track end failed");
        }
    }

    /// Process completion events until the channel closes.
    ///
    /// Events run as separate tasks so a slow catalog call for one community never
    /// delays another; the per-community lock keeps them sequential per community.
    pub async fn run_events(self: Arc<Self>, mut session_rx: UnboundedReceiver<SessionEvent>) {
        while let Some(event) = session_rx.recv().await {
            let manager = self.clone();
            tokio::spawn(async move { manager.handle_event(event).await });
        }
        tracing::info!("session event loop stopped");
    }

    /// Head-advance: pop the head (or an autoplay pick) and stream it.
    async fn advance_locked(
        &self,
        community: CommunityId,
        state: &mut PlaybackSessionState,
    ) -> AdvanceOutcome {
        if state.queue.is_empty() && state.autoplay_mode != AutoplayMode::None {
            let seed = state.last_played.clone();
            let candidates = {
                let seen = state.seen_ids();
                autoplay::next_candidates(
                    self.catalog.as_ref(),
                    state.autoplay_mode,
                    seed.as_ref(),
                    &seen,
                )
                .await
            };
            if !candidates.is_empty() {
                tracing::info!(
                    community = %community,
                    mode = %state.autoplay_mode,
                    count = candidates.len(),
                    "autoplay enqueued tracks"
                );
                state.queue.extend(candidates);
                self.events.queue_changed(community);
            }
        }

        let Some(track) = state.queue.pop_front() else {
            self.end_playback(community, state);
            return AdvanceOutcome::Ended;
        };
        let Some(sink) = state.sink.clone() else {
            state.queue.push_front(track);
            self.end_playback(community, state);
            return AdvanceOutcome::Failed(TransportError::Offline);
        };

        state.generation += 1;
        state.current_track = Some(track.clone());
        let notifier = TrackEndNotifier::new(community, state.generation, self.session_tx.clone());
        let locator = self.catalog.stream_locator(&track.id);
        match sink.play(locator, notifier) {
            Ok(()) => {
                state.is_playing = true;
                state.remember(&track);
                tracing::info!(
                    community = %community,
                    track_id = %track.id,
                    title = %track.title,
                    generation = state.generation,
                    "now playing"
                );
                self.events.queue_changed(community);
                self.events.now_playing(community, track.clone());
                AdvanceOutcome::Playing(track)
            }
            Err(err) => {
                tracing::warn!(community = %community, track_id = %track.id, error = %err, "transport rejected track");
                state.queue.push_front(track);
                self.end_playback(community, state);
                AdvanceOutcome::Failed(err)
            }
        }
    }

    fn end_playback(&self, community: CommunityId, state: &mut PlaybackSessionState) {
        state.is_playing = false;
        state.current_track = None;
        tracing::info!(community = %community, "playback ended");
        self.events.playback_ended(community);
    }

    pub async fn queue_contents(&self, community: CommunityId) -> Vec<Track> {
        match self.existing_session(community) {
            Some(session) => session.state.lock().await.queue.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    pub async fn current_track(&self, community: CommunityId) -> Option<Track> {
        let session = self.existing_session(community)?;
        let state = session.state.lock().await;
        state.current_track.clone()
    }

    pub async fn is_playing(&self, community: CommunityId) -> bool {
        match self.existing_session(community) {
            Some(session) => session.state.lock().await.is_playing,
            None => false,
        }
    }

    /// The sink attached to `community`, if connected.
    pub async fn sink(&self, community: CommunityId) -> Option<Arc<dyn AudioSink>> {
        let session = self.existing_session(community)?;
        let state = session.state.lock().await;
        state.sink.clone()
    }

    pub async fn autoplay_mode(&self, community: CommunityId) -> AutoplayMode {
        match self.existing_session(community) {
            Some(session) => session.state.lock().await.autoplay_mode,
            None => AutoplayMode::None,
        }
    }

    pub async fn set_autoplay_mode(&self, community: CommunityId, mode: AutoplayMode) {
        let session = self.session(community);
        let mut state = session.state.lock().await;
        state.autoplay_mode = mode;
        tracing::info!(community = %community, mode = %mode, "autoplay mode changed");
        self.events.autoplay_changed(community, mode);
    }

    /// Seed sessions from persisted settings. Existing sessions are left alone.
    pub fn restore_settings(&self, records: Vec<CommunitySettings>) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|err| err.into_inner());
        for record in records {
            sessions
                .entry(record.community_id)
                .or_insert_with(|| Arc::new(CommunitySession::new(record.autoplay_mode)));
        }
    }

    /// The persisted mapping, sorted by community id.
    pub async fn settings_snapshot(&self) -> Vec<CommunitySettings> {
        let sessions: Vec<(CommunityId, Arc<CommunitySession>)> = self
            .sessions
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .iter()
            .map(|(id, session)| (*id, session.clone()))
            .collect();
        let mut records = Vec::with_capacity(sessions.len());
        for (community_id, session) in sessions {
            let autoplay_mode = session.state.lock().await.autoplay_mode;
            records.push(CommunitySettings {
                community_id,
                autoplay_mode,
            });
        }
        records.sort_by_key(|record| record.community_id);
        records
    }
}
