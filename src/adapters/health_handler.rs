use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::agents::ClientManager;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// `running` once the agent runtime has been started, else `stopped`
    pub runtime: String,
}

pub struct HealthHandler {
    clients: Arc<ClientManager>,
    start_time: std::time::Instant,
}

impl HealthHandler {
    pub fn new(clients: Arc<ClientManager>) -> Self {
        Self {
            clients,
            start_time: std::time::Instant::now(),
        }
    }

    pub fn status(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            runtime: if self.clients.is_running() {
                "running"
            } else {
                "stopped"
            }
            .to_string(),
        }
    }

    /// Returns 200 while the process is serving; the runtime starts lazily
    /// so a stopped runtime is not a failure
    pub async fn health(&self) -> (StatusCode, Json<HealthStatus>) {
        (StatusCode::OK, Json(self.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::runtime::{AuthMode, ClientOptions, CliConnector};
    use crate::tools::ToolRegistry;

    #[tokio::test]
    async fn test_health_before_runtime_start() {
        let clients = Arc::new(ClientManager::new(
            Arc::new(CliConnector::new(Arc::new(ToolRegistry::builtin()))),
            ClientOptions {
                cli_path: "copilot".to_string(),
                auth: AuthMode::Token { github_token: None },
                working_dir: None,
                log_level: "info".to_string(),
            },
        ));
        let handler = HealthHandler::new(clients);

        let (status, Json(body)) = handler.health().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "healthy");
        assert_eq!(body.runtime, "stopped");
    }
}
