//! Audio transport abstraction for streaming tracks into a chat audio channel.
//!
//! Implementations translate playback operations into relay commands. Track
//! completion is reported back as a [`SessionEvent`] rather than a callback.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use jukebox_types::CommunityId;

use crate::catalog::StreamLocator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The audio channel could not be joined.
    ConnectionDenied(String),
    /// The sink is gone (relay offline or disconnected).
    Offline,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectionDenied(reason) => write!(f, "connection denied: {reason}"),
            TransportError::Offline => f.write_str("audio sink offline"),
        }
    }
}

/// Messages delivered to the session manager's event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The track dispatched under `generation` finished, naturally or by `stop()`.
    TrackEnded {
        community: CommunityId,
        generation: u64,
    },
}

/// One-shot handle a sink uses to report that the current track ended.
#[derive(Debug, Clone)]
pub struct TrackEndNotifier {
    community: CommunityId,
    generation: u64,
    events: UnboundedSender<SessionEvent>,
}

impl TrackEndNotifier {
    pub fn new(community: CommunityId, generation: u64, events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            community,
            generation,
            events,
        }
    }

    pub fn event(&self) -> SessionEvent {
        SessionEvent::TrackEnded {
            community: self.community,
            generation: self.generation,
        }
    }

    /// Report completion. Safe to call from any thread.
    pub fn finished(self) {
        if self.events.send(self.event()).is_err() {
            tracing::debug!(community = %self.community, "session event loop closed; track end dropped");
        }
    }
}

/// A connected audio output for one community.
pub trait AudioSink: Send + Sync {
    /// Start streaming `locator`; `notifier` fires when the track ends.
    fn play(&self, locator: StreamLocator, notifier: TrackEndNotifier) -> Result<(), TransportError>;
    /// Stop the current track. The pending notifier still fires.
    fn stop(&self) -> Result<(), TransportError>;
    fn is_playing(&self) -> bool;
    /// Leave the audio channel. No notifier fires afterwards.
    fn disconnect(&self);
}

#[async_trait]
pub trait AudioTransport: Send + Sync {
    /// Join `channel_id` on behalf of `community`.
    async fn connect(
        &self,
        community: CommunityId,
        channel_id: u64,
    ) -> Result<Arc<dyn AudioSink>, TransportError>;
}
