//! Request rejection kinds.
//!
//! Every variant rejects one user request; none of them is fatal to the process.

use std::fmt;

use actix_web::HttpResponse;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JukeboxError {
    /// The requester is not in an audio channel.
    NotInAudioChannel,
    /// The audio transport could not join the channel.
    ConnectionDenied(String),
    /// Play requested without a query, with an empty queue and autoplay off.
    QueueEmpty,
    AlreadyPlaying,
    NotPlaying,
    /// A search or browse produced nothing; carries the user-facing text.
    NoResults(String),
    /// A selection referenced an index outside the displayed page.
    IndexOutOfRange { index: usize, len: usize },
    /// Pagination hit the end of the results.
    NoFurtherResults,
    /// The browse surface expired or was superseded.
    BrowseExpired(String),
    /// The browse surface has no such action (paging an album, play-all on a search).
    ActionUnavailable,
}

/// JSON error body returned by the HTTP API.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl JukeboxError {
    pub fn code(&self) -> &'static str {
        match self {
            JukeboxError::NotInAudioChannel => "not_in_audio_channel",
            JukeboxError::ConnectionDenied(_) => "connection_denied",
            JukeboxError::QueueEmpty => "queue_empty",
            JukeboxError::AlreadyPlaying => "already_playing",
            JukeboxError::NotPlaying => "not_playing",
            JukeboxError::NoResults(_) => "no_results",
            JukeboxError::IndexOutOfRange { .. } => "index_out_of_range",
            JukeboxError::NoFurtherResults => "no_further_results",
            JukeboxError::BrowseExpired(_) => "browse_expired",
            JukeboxError::ActionUnavailable => "action_unavailable",
        }
    }

    /// Convert the rejection into an HTTP response.
    pub fn into_response(self) -> HttpResponse {
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        match self {
            JukeboxError::NotInAudioChannel => HttpResponse::Forbidden().json(body),
            JukeboxError::ConnectionDenied(_) => HttpResponse::BadGateway().json(body),
            JukeboxError::QueueEmpty
            | JukeboxError::AlreadyPlaying
            | JukeboxError::NotPlaying
            | JukeboxError::NoFurtherResults => HttpResponse::Conflict().json(body),
            JukeboxError::NoResults(_) | JukeboxError::BrowseExpired(_) => {
                HttpResponse::NotFound().json(body)
            }
            JukeboxError::IndexOutOfRange { .. } | JukeboxError::ActionUnavailable => {
                HttpResponse::BadRequest().json(body)
            }
        }
    }
}

impl fmt::Display for JukeboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JukeboxError::NotInAudioChannel => f.write_str("You are not connected to a voice channel."),
            JukeboxError::ConnectionDenied(_) => f.write_str("Cannot connect to voice channel."),
            JukeboxError::QueueEmpty => f.write_str("Queue is empty."),
            JukeboxError::AlreadyPlaying => f.write_str("Already playing."),
            JukeboxError::NotPlaying => f.write_str("No track is playing."),
            JukeboxError::NoResults(message) => f.write_str(message),
            JukeboxError::IndexOutOfRange { index, len } => {
                write!(f, "Selection {index} is no longer available ({len} results shown).")
            }
            JukeboxError::NoFurtherResults => f.write_str("No further results."),
            JukeboxError::BrowseExpired(_) => f.write_str("This menu has expired, please search again."),
            JukeboxError::ActionUnavailable => f.write_str("This menu does not support that action."),
        }
    }
}
