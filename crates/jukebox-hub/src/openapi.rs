use utoipa::OpenApi;

use crate::api;
use crate::browse;
use crate::browse_registry;
use crate::command_controller;
use crate::error;
use crate::events;
use crate::models;
use crate::render;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health,
        api::communities::play,
        api::communities::search,
        api::communities::stop,
        api::communities::queue,
        api::communities::queue_clear,
        api::communities::skip,
        api::communities::autoplay,
        api::communities::status,
        api::browse::browse_page,
        api::browse::browse_select,
        api::browse::browse_enqueue_all,
        api::streams::events_stream,
    ),
    components(
        schemas(
            api::health::HealthResponse,
            models::PlayRequest,
            models::SearchRequest,
            models::UserRequest,
            models::AutoplayRequest,
            models::PageRequest,
            models::SelectRequest,
            models::QueueResponse,
            models::RepliesResponse,
            command_controller::Requester,
            command_controller::SearchKind,
            command_controller::BrowseView,
            command_controller::SelectOutcome,
            command_controller::CommunityStatus,
            browse::Direction,
            browse_registry::BrowseId,
            render::Reply,
            render::SelectOption,
            error::ErrorBody,
            events::HubEvent,
            jukebox_types::Track,
            jukebox_types::AutoplayMode,
            jukebox_types::CommunityId,
        )
    ),
    tags(
        (name = "jukebox-hub", description = "Community jukebox command API")
    )
)]
pub struct ApiDoc;
