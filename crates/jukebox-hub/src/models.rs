//! API models and OpenAPI schemas.
//!
//! Request and response bodies for the command API. Browse views, replies and
//! status snapshots are defined next to the code that produces them.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use jukebox_types::{AutoplayMode, Track};

use crate::browse::Direction;
use crate::command_controller::{Requester, SearchKind};
use crate::render::Reply;

/// Body for `POST /communities/{id}/play`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PlayRequest {
    pub user: Requester,
    /// Track query; omit to resume the queue.
    #[serde(default)]
    pub query: Option<String>,
}

/// Body for `POST /communities/{id}/search`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchRequest {
    pub user: Requester,
    pub query: String,
    /// Entry kinds to search; defaults to the mixed search.
    #[serde(default)]
    pub kind: SearchKind,
}

/// Body for commands that only need the requester.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UserRequest {
    pub user: Requester,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AutoplayRequest {
    pub user: Requester,
    pub mode: AutoplayMode,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PageRequest {
    pub direction: Direction,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SelectRequest {
    pub user: Requester,
    /// Option value from the browse view.
    pub index: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct QueueResponse {
    pub tracks: Vec<Track>,
    pub reply: Reply,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RepliesResponse {
    pub replies: Vec<Reply>,
}
