//! Browse surface handlers: paging, selection and "enqueue all".

use actix_web::{post, web, HttpResponse, Responder};

use crate::browse_registry::BrowseId;
use crate::command_controller::{BrowseView, SelectOutcome};
use crate::error::ErrorBody;
use crate::models::{PageRequest, RepliesResponse, SelectRequest, UserRequest};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/browse/{id}/page",
    params(("id" = String, Path, description = "Browse surface id")),
    request_body = PageRequest,
    responses(
        (status = 200, description = "Page after navigation", body = BrowseView),
        (status = 400, description = "Surface is not paginated", body = ErrorBody),
        (status = 404, description = "Surface expired", body = ErrorBody),
        (status = 409, description = "No further results", body = ErrorBody)
    )
)]
#[post("/browse/{id}/page")]
/// Move a search surface one page back or forward.
pub async fn browse_page(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<PageRequest>,
) -> impl Responder {
    let id = BrowseId::from(id.into_inner());
    match state.controller.page(&id, body.direction).await {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/browse/{id}/select",
    params(("id" = String, Path, description = "Browse surface id")),
    request_body = SelectRequest,
    responses(
        (status = 200, description = "Track enqueued or sub-surface opened", body = SelectOutcome),
        (status = 400, description = "Stale selection index", body = ErrorBody),
        (status = 403, description = "Requester not in an audio channel", body = ErrorBody),
        (status = 404, description = "Surface expired or nothing to open", body = ErrorBody)
    )
)]
#[post("/browse/{id}/select")]
/// Select one entry of the displayed page.
pub async fn browse_select(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<SelectRequest>,
) -> impl Responder {
    let id = BrowseId::from(id.into_inner());
    match state.controller.select(&id, &body.user, body.index).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/browse/{id}/enqueue-all",
    params(("id" = String, Path, description = "Browse surface id")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "Tracks enqueued", body = RepliesResponse),
        (status = 400, description = "Surface has no enqueue-all action", body = ErrorBody),
        (status = 404, description = "Surface expired", body = ErrorBody)
    )
)]
#[post("/browse/{id}/enqueue-all")]
/// Enqueue every track of an album or artist surface.
pub async fn browse_enqueue_all(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<UserRequest>,
) -> impl Responder {
    let id = BrowseId::from(id.into_inner());
    match state.controller.enqueue_all(&id, &body.user).await {
        Ok(replies) => HttpResponse::Ok().json(RepliesResponse { replies }),
        Err(err) => err.into_response(),
    }
}
