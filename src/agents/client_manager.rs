//! Process-wide owner of the runtime client

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::agents::error::Result;
use crate::agents::runtime::{ClientOptions, RuntimeClient, RuntimeConnector};

/// Holds at most one started runtime client
///
/// Start-up and shutdown are serialized behind a single async mutex, so
/// concurrent first requests wait for one start instead of racing to spawn
/// several runtime processes. A client that stopped on its own is replaced
/// on the next `get_client`.
pub struct ClientManager {
    connector: Arc<dyn RuntimeConnector>,
    options: ClientOptions,
    client: Mutex<Option<Arc<dyn RuntimeClient>>>,
    running: AtomicBool,
}

impl ClientManager {
    pub fn new(connector: Arc<dyn RuntimeConnector>, options: ClientOptions) -> Self {
        Self {
            connector,
            options,
            client: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Return the live client, starting a fresh one if needed
    pub async fn get_client(&self) -> Result<Arc<dyn RuntimeClient>> {
        let mut slot = self.client.lock().await;

        if let Some(client) = slot.as_ref() {
            if client.is_started() {
                return Ok(client.clone());
            }
            tracing::warn!("Cached runtime client is no longer started; restarting");
            self.running.store(false, Ordering::SeqCst);
        }

        tracing::info!(
            cli_path = %self.options.cli_path,
            auth = self.options.auth.label(),
            "Starting agent runtime"
        );

        let client = self.connector.create(&self.options);
        if let Err(e) = client.start().await {
            *slot = None;
            tracing::error!(cli_path = %self.options.cli_path, error = %e, "Agent runtime failed to start");
            return Err(e);
        }

        *slot = Some(client.clone());
        self.running.store(true, Ordering::SeqCst);
        tracing::info!("Agent runtime started");
        Ok(client)
    }

    /// Stop and forget the cached client; a no-op when nothing was started
    pub async fn shutdown(&self) {
        let mut slot = self.client.lock().await;

        if let Some(client) = slot.take() {
            if let Err(e) = client.stop().await {
                tracing::warn!(error = %e, "Error stopping agent runtime");
            } else {
                tracing::info!("Agent runtime stopped");
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether a started client is cached and its process is still alive
    ///
    /// While a start or shutdown holds the lock, the last recorded state is
    /// reported.
    pub fn is_running(&self) -> bool {
        match self.client.try_lock() {
            Ok(slot) => slot.as_ref().is_some_and(|client| client.is_started()),
            Err(_) => self.running.load(Ordering::SeqCst),
        }
    }
}
