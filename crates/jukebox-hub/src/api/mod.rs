//! HTTP API handlers.
//!
//! Defines the Actix routes the chat gateway uses to drive playback and browsing.

pub mod browse;
pub mod communities;
pub mod health;
pub mod streams;

pub use browse::{browse_enqueue_all, browse_page, browse_select};
pub use communities::{autoplay, play, queue, queue_clear, search, skip, status, stop};
pub use streams::events_stream;
