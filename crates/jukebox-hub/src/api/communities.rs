//! Per-community command handlers.

use actix_web::{get, post, web, HttpResponse, Responder};

use jukebox_types::CommunityId;

use crate::command_controller::{BrowseView, CommunityStatus};
use crate::error::ErrorBody;
use crate::models::{AutoplayRequest, PlayRequest, QueueResponse, SearchRequest, UserRequest};
use crate::render::Reply;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/communities/{id}/play",
    params(("id" = u64, Path, description = "Community id")),
    request_body = PlayRequest,
    responses(
        (status = 200, description = "Track enqueued or playback started", body = Reply),
        (status = 403, description = "Requester not in an audio channel", body = ErrorBody),
        (status = 404, description = "No track matched the query", body = ErrorBody),
        (status = 409, description = "Already playing or queue empty", body = ErrorBody),
        (status = 502, description = "Audio channel could not be joined", body = ErrorBody)
    )
)]
#[post("/communities/{id}/play")]
/// Enqueue the first track matching a query, or resume the queue.
pub async fn play(
    state: web::Data<AppState>,
    id: web::Path<u64>,
    body: web::Json<PlayRequest>,
) -> impl Responder {
    let community = CommunityId(id.into_inner());
    match state
        .controller
        .play(community, &body.user, body.query.as_deref())
        .await
    {
        Ok(reply) => HttpResponse::Ok().json(reply),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/communities/{id}/search",
    params(("id" = u64, Path, description = "Community id")),
    request_body = SearchRequest,
    responses(
        (status = 200, description = "First result page", body = BrowseView),
        (status = 404, description = "Nothing matched", body = ErrorBody)
    )
)]
#[post("/communities/{id}/search")]
/// Open a paginated search surface.
pub async fn search(
    state: web::Data<AppState>,
    id: web::Path<u64>,
    body: web::Json<SearchRequest>,
) -> impl Responder {
    let community = CommunityId(id.into_inner());
    match state
        .controller
        .search(community, &body.user, body.kind, &body.query)
        .await
    {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/communities/{id}/stop",
    params(("id" = u64, Path, description = "Community id")),
    responses(
        (status = 200, description = "Left the audio channel", body = Reply),
        (status = 409, description = "Not connected", body = ErrorBody)
    )
)]
#[post("/communities/{id}/stop")]
/// Stop playback and leave the audio channel.
pub async fn stop(state: web::Data<AppState>, id: web::Path<u64>) -> impl Responder {
    match state.controller.stop(CommunityId(id.into_inner())).await {
        Ok(reply) => HttpResponse::Ok().json(reply),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/communities/{id}/queue",
    params(("id" = u64, Path, description = "Community id")),
    responses(
        (status = 200, description = "Queued tracks", body = QueueResponse)
    )
)]
#[get("/communities/{id}/queue")]
pub async fn queue(state: web::Data<AppState>, id: web::Path<u64>) -> impl Responder {
    let community = CommunityId(id.into_inner());
    let tracks = state.controller.sessions().queue_contents(community).await;
    let reply = state.controller.show_queue(community).await;
    HttpResponse::Ok().json(QueueResponse { tracks, reply })
}

#[utoipa::path(
    post,
    path = "/communities/{id}/queue/clear",
    params(("id" = u64, Path, description = "Community id")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "Queue cleared", body = Reply)
    )
)]
#[post("/communities/{id}/queue/clear")]
pub async fn queue_clear(
    state: web::Data<AppState>,
    id: web::Path<u64>,
    body: web::Json<UserRequest>,
) -> impl Responder {
    let reply = state
        .controller
        .clear_queue(CommunityId(id.into_inner()), &body.user)
        .await;
    HttpResponse::Ok().json(reply)
}

#[utoipa::path(
    post,
    path = "/communities/{id}/skip",
    params(("id" = u64, Path, description = "Community id")),
    responses(
        (status = 200, description = "Current track stopped", body = Reply),
        (status = 409, description = "Nothing playing", body = ErrorBody)
    )
)]
#[post("/communities/{id}/skip")]
pub async fn skip(state: web::Data<AppState>, id: web::Path<u64>) -> impl Responder {
    match state.controller.skip(CommunityId(id.into_inner())).await {
        Ok(reply) => HttpResponse::Ok().json(reply),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/communities/{id}/autoplay",
    params(("id" = u64, Path, description = "Community id")),
    request_body = AutoplayRequest,
    responses(
        (status = 200, description = "Autoplay mode updated", body = Reply)
    )
)]
#[post("/communities/{id}/autoplay")]
pub async fn autoplay(
    state: web::Data<AppState>,
    id: web::Path<u64>,
    body: web::Json<AutoplayRequest>,
) -> impl Responder {
    match state
        .controller
        .autoplay(CommunityId(id.into_inner()), &body.user, body.mode)
        .await
    {
        Ok(reply) => HttpResponse::Ok().json(reply),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/communities/{id}/status",
    params(("id" = u64, Path, description = "Community id")),
    responses(
        (status = 200, description = "Playback snapshot", body = CommunityStatus)
    )
)]
#[get("/communities/{id}/status")]
pub async fn status(state: web::Data<AppState>, id: web::Path<u64>) -> impl Responder {
    HttpResponse::Ok().json(state.controller.status(CommunityId(id.into_inner())).await)
}
