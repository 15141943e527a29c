//! Server-sent event stream of hub events.

use std::collections::VecDeque;
use std::time::Instant;

use actix_web::http::header;
use actix_web::web::Bytes;
use actix_web::{get, web, Error, HttpResponse, Responder};
use futures_util::stream::unfold;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Duration, Interval, MissedTickBehavior};
use utoipa::IntoParams;

use jukebox_types::CommunityId;

use crate::events::HubEvent;
use crate::state::AppState;

const PING_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventsQuery {
    /// Only forward events for this community.
    pub community: Option<u64>,
}

struct EventStreamState {
    receiver: broadcast::Receiver<HubEvent>,
    community: Option<CommunityId>,
    interval: Interval,
    pending: VecDeque<Bytes>,
    last_ping: Instant,
}

fn sse_event(event: &str, data: &str) -> Bytes {
    let mut payload = format!("event: {event}\n");
    for line in data.lines() {
        payload.push_str("data: ");
        payload.push_str(line);
        payload.push('\n');
    }
    payload.push('\n');
    Bytes::from(payload)
}

fn event_community(event: &HubEvent) -> CommunityId {
    match event {
        HubEvent::QueueChanged { community }
        | HubEvent::NowPlaying { community, .. }
        | HubEvent::PlaybackEnded { community }
        | HubEvent::AutoplayChanged { community, .. } => *community,
    }
}

#[utoipa::path(
    get,
    path = "/events",
    params(EventsQuery),
    responses(
        (status = 200, description = "Hub event stream (text/event-stream)")
    )
)]
#[get("/events")]
/// Stream queue, playback and autoplay changes via server-sent events.
pub async fn events_stream(state: web::Data<AppState>, query: web::Query<EventsQuery>) -> impl Responder {
    let mut interval = tokio::time::interval(PING_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut pending = VecDeque::new();
    pending.push_back(Bytes::from(": connected\n\n"));

    let stream = unfold(
        EventStreamState {
            receiver: state.events.subscribe(),
            community: query.community.map(CommunityId),
            interval,
            pending,
            last_ping: Instant::now(),
        },
        |mut ctx| async move {
            loop {
                if let Some(bytes) = ctx.pending.pop_front() {
                    return Some((Ok::<Bytes, Error>(bytes), ctx));
                }
                tokio::select! {
                    _ = ctx.interval.tick() => {
                        if ctx.last_ping.elapsed() >= PING_INTERVAL {
                            ctx.last_ping = Instant::now();
                            ctx.pending.push_back(Bytes::from(": ping\n\n"));
                        }
                    }
                    result = ctx.receiver.recv() => match result {
                        Ok(event) => {
                            if ctx.community.is_some_and(|c| c != event_community(&event)) {
                                continue;
                            }
                            let json = serde_json::to_string(&event).unwrap_or_else(|_| "null".to_string());
                            ctx.pending.push_back(sse_event(event.name(), &json));
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "event stream lagged");
                            ctx.pending.push_back(sse_event("lagged", &skipped.to_string()));
                        }
                        Err(RecvError::Closed) => return None,
                    },
                }
            }
        },
    );

    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .insert_header((header::CONNECTION, "keep-alive"))
        .streaming(stream)
}
