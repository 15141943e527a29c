//! In-process event bus for hub-side updates.
//!
//! Provides a lightweight broadcast channel for the chat gateway stream and the
//! settings persister.

use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;

use jukebox_types::{AutoplayMode, CommunityId, Track};

/// Hub event payloads published by the session manager.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HubEvent {
    QueueChanged { community: CommunityId },
    NowPlaying { community: CommunityId, track: Track },
    PlaybackEnded { community: CommunityId },
    AutoplayChanged { community: CommunityId, mode: AutoplayMode },
}

impl HubEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            HubEvent::QueueChanged { .. } => "queue",
            HubEvent::NowPlaying { .. } => "now_playing",
            HubEvent::PlaybackEnded { .. } => "playback_ended",
            HubEvent::AutoplayChanged { .. } => "autoplay",
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<HubEvent>,
}

impl EventBus {
    /// Create a new event bus with a bounded broadcast channel.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.sender.subscribe()
    }

    pub fn queue_changed(&self, community: CommunityId) {
        let _ = self.sender.send(HubEvent::QueueChanged { community });
    }

    pub fn now_playing(&self, community: CommunityId, track: Track) {
        let _ = self.sender.send(HubEvent::NowPlaying { community, track });
    }

    pub fn playback_ended(&self, community: CommunityId) {
        let _ = self.sender.send(HubEvent::PlaybackEnded { community });
    }

    pub fn autoplay_changed(&self, community: CommunityId, mode: AutoplayMode) {
        let _ = self.sender.send(HubEvent::AutoplayChanged { community, mode });
    }
}
