//! HTTP voice relay transport.
//!
//! Each community streams through a relay that joins the chat audio channel and
//! plays stream URLs. A worker thread per connected sink serializes relay calls and
//! polls relay status to detect the end of the current track.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use serde::Deserialize;

use jukebox_types::CommunityId;

use crate::catalog::StreamLocator;
use crate::config::RelayConfigResolved;
use crate::transport::{AudioSink, AudioTransport, TrackEndNotifier, TransportError};

const HTTP_TIMEOUT: Duration = Duration::from_secs(3);
const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// How long a freshly started track may report idle before it counts as ended.
const START_GRACE: Duration = Duration::from_secs(3);
const MAX_POLL_FAILURES: u32 = 5;

/// Why the relay went idle.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelayEndReason {
    Eof,
    Error,
    Stopped,
}

/// Status snapshot reported by `GET /status`.
#[derive(Debug, Default, Deserialize)]
pub struct RelayStatus {
    pub now_playing: Option<String>,
    pub end_reason: Option<RelayEndReason>,
}

impl RelayStatus {
    fn is_idle(&self) -> bool {
        self.now_playing.is_none() || self.end_reason.is_some()
    }
}

/// Commands consumed by a relay worker thread.
enum RelayCommand {
    Play {
        url: String,
        notifier: TrackEndNotifier,
    },
    Stop,
    Disconnect,
}

/// Blocking HTTP calls against one relay.
#[derive(Clone)]
struct RelayClient {
    http_addr: SocketAddr,
}

impl RelayClient {
    fn post(&self, path: &str, payload: serde_json::Value) -> Result<()> {
        let url = format!("http://{}{}", self.http_addr, path);
        ureq::post(&url)
            .config()
            .timeout_per_call(Some(HTTP_TIMEOUT))
            .build()
            .send_json(payload)
            .map_err(|e| anyhow::anyhow!("relay {path} request failed: {e}"))?;
        Ok(())
    }

    fn join(&self, channel_id: u64) -> Result<()> {
        self.post("/voice/join", serde_json::json!({ "channel_id": channel_id }))
    }

    fn leave(&self) -> Result<()> {
        self.post("/voice/leave", serde_json::json!({}))
    }

    fn play(&self, url: &str) -> Result<()> {
        self.post("/play", serde_json::json!({ "url": url }))
    }

    fn stop(&self) -> Result<()> {
        self.post("/stop", serde_json::json!({}))
    }

    fn status(&self) -> Result<RelayStatus> {
        let url = format!("http://{}/status", self.http_addr);
        let mut resp = ureq::get(&url)
            .config()
            .timeout_per_call(Some(HTTP_TIMEOUT))
            .build()
            .call()
            .map_err(|e| anyhow::anyhow!("relay status request failed: {e}"))?;
        resp.body_mut()
            .read_json::<RelayStatus>()
            .map_err(|e| anyhow::anyhow!("relay status decode failed: {e}"))
    }
}

/// Transport that maps communities to their configured relays.
pub struct RelayTransport {
    relays: HashMap<CommunityId, SocketAddr>,
}

impl RelayTransport {
    pub fn new(relays: &[RelayConfigResolved]) -> Self {
        Self {
            relays: relays.iter().map(|r| (r.community, r.http_addr)).collect(),
        }
    }
}

#[async_trait]
impl AudioTransport for RelayTransport {
    async fn connect(
        &self,
        community: CommunityId,
        channel_id: u64,
    ) -> Result<Arc<dyn AudioSink>, TransportError> {
        let Some(http_addr) = self.relays.get(&community).copied() else {
            return Err(TransportError::ConnectionDenied(format!(
                "no relay configured for community {community}"
            )));
        };
        let client = RelayClient { http_addr };
        let join_client = client.clone();
        tokio::task::spawn_blocking(move || join_client.join(channel_id))
            .await
            .map_err(|err| TransportError::ConnectionDenied(format!("join task failed: {err}")))?
            .map_err(|err| TransportError::ConnectionDenied(format!("{err:#}")))?;
        tracing::info!(community = %community, relay = %http_addr, channel_id, "joined audio channel");
        Ok(Arc::new(RelaySink::spawn(community, client)))
    }
}

/// Sink handle; the heavy lifting happens on the worker thread.
pub struct RelaySink {
    cmd_tx: Sender<RelayCommand>,
    playing: Arc<AtomicBool>,
}

impl RelaySink {
    fn spawn(community: CommunityId, client: RelayClient) -> Self {
        let (cmd_tx, cmd_rx) = unbounded();
        let playing = Arc::new(AtomicBool::new(false));
        let worker_playing = playing.clone();
        std::thread::spawn(move || run_relay_worker(community, client, cmd_rx, worker_playing));
        Self { cmd_tx, playing }
    }
}

impl AudioSink for RelaySink {
    fn play(&self, locator: StreamLocator, notifier: TrackEndNotifier) -> Result<(), TransportError> {
        self.playing.store(true, Ordering::SeqCst);
        self.cmd_tx
            .send(RelayCommand::Play {
                url: locator.0,
                notifier,
            })
            .map_err(|_| {
                self.playing.store(false, Ordering::SeqCst);
                TransportError::Offline
            })
    }

    fn stop(&self) -> Result<(), TransportError> {
        self.cmd_tx
            .send(RelayCommand::Stop)
            .map_err(|_| TransportError::Offline)
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn disconnect(&self) {
        self.playing.store(false, Ordering::SeqCst);
        let _ = self.cmd_tx.send(RelayCommand::Disconnect);
    }
}

struct ActiveTrack {
    notifier: TrackEndNotifier,
    started_at: Instant,
    seen_playing: bool,
    poll_failures: u32,
}

fn finish(active: &mut Option<ActiveTrack>, playing: &AtomicBool) {
    playing.store(false, Ordering::SeqCst);
    if let Some(track) = active.take() {
        track.notifier.finished();
    }
}

fn run_relay_worker(
    community: CommunityId,
    client: RelayClient,
    cmd_rx: Receiver<RelayCommand>,
    playing: Arc<AtomicBool>,
) {
    let mut active: Option<ActiveTrack> = None;
    loop {
        let cmd = if active.is_some() {
            cmd_rx.recv_timeout(POLL_INTERVAL)
        } else {
            cmd_rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
        };
        match cmd {
            Ok(RelayCommand::Play { url, notifier }) => {
                // A previous track should have ended already; release it first.
                finish(&mut active, &playing);
                match client.play(&url) {
                    Ok(()) => {
                        playing.store(true, Ordering::SeqCst);
                        active = Some(ActiveTrack {
                            notifier,
                            started_at: Instant::now(),
                            seen_playing: false,
                            poll_failures: 0,
                        });
                    }
                    Err(err) => {
                        tracing::warn!(community = %community, error = %err, "relay play failed");
                        playing.store(false, Ordering::SeqCst);
                        notifier.finished();
                    }
                }
            }
            Ok(RelayCommand::Stop) => {
                if let Err(err) = client.stop() {
                    tracing::warn!(community = %community, error = %err, "relay stop failed");
                }
                finish(&mut active, &playing);
            }
            Ok(RelayCommand::Disconnect) => {
                playing.store(false, Ordering::SeqCst);
                active = None;
                if let Err(err) = client.leave() {
                    tracing::warn!(community = %community, error = %err, "relay leave failed");
                }
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                let Some(track) = active.as_mut() else {
                    continue;
                };
                match client.status() {
                    Ok(status) => {
                        track.poll_failures = 0;
                        if !status.is_idle() {
                            track.seen_playing = true;
                            continue;
                        }
                        if track.seen_playing || track.started_at.elapsed() >= START_GRACE {
                            tracing::debug!(
                                community = %community,
                                end_reason = ?status.end_reason,
                                "relay reported end of track"
                            );
                            finish(&mut active, &playing);
                        }
                    }
                    Err(err) => {
                        track.poll_failures += 1;
                        tracing::debug!(community = %community, error = %err, failures = track.poll_failures, "relay status poll failed");
                        if track.poll_failures >= MAX_POLL_FAILURES {
                            tracing::warn!(community = %community, "relay unreachable; ending current track");
                            finish(&mut active, &playing);
                        }
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::info!(community = %community, "relay worker stopped");
}
