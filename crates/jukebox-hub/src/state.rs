//! Shared application state handed to the HTTP handlers.

use std::sync::Arc;

use crate::command_controller::CommandController;
use crate::events::EventBus;

pub struct AppState {
    pub controller: Arc<CommandController>,
    pub events: EventBus,
}

impl AppState {
    pub fn new(controller: Arc<CommandController>, events: EventBus) -> Self {
        Self { controller, events }
    }
}
