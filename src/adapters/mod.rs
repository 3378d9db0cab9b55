pub mod chat_handler;
pub mod health_handler;
pub mod rmcp_server;
pub mod ui_handler;

use std::sync::Arc;

use crate::agents::SessionRunner;

/// State shared by the axum handlers
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<SessionRunner>,
    pub health: Arc<health_handler::HealthHandler>,
}
