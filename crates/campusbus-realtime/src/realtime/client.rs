//! Owner-facing handle for a private channel connection.

use std::sync::Arc;

use campusbus_common::RealtimeError;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::connection::{connection_loop, Session};
use super::handler::EventMatcher;
use super::types::{ChannelClientConfig, ConnectionStatus};
use crate::authorizer::ChannelAuthorizer;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Owns at most one live channel connection.
///
/// `connect` replaces any previous connection after it has fully shut
/// down, so two sockets or two heartbeats never run side by side. Dropping
/// the client cancels the connection.
pub struct RealtimeClient {
    config: ChannelClientConfig,
    authorizer: Arc<dyn ChannelAuthorizer>,
    active: Option<ActiveConnection>,
}

struct ActiveConnection {
    channel: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RealtimeClient {
    pub fn new(config: ChannelClientConfig, authorizer: Arc<dyn ChannelAuthorizer>) -> Self {
        Self {
            config,
            authorizer,
            active: None,
        }
    }

    /// Join `channel` and call `on_message` with every payload of `event`.
    ///
    /// Returns as soon as the background task is started; the handshake
    /// proceeds asynchronously and its progress is visible on the returned
    /// handle. Only an empty channel name fails here.
    pub async fn connect<F>(
        &mut self,
        channel: &str,
        event: &str,
        on_message: F,
    ) -> Result<ConnectionHandle, RealtimeError>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        if channel.trim().is_empty() {
            return Err(RealtimeError::InvalidChannel(channel.to_string()));
        }

        if self.active.is_some() {
            info!("Replacing existing channel connection");
            self.disconnect().await;
        }

        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
        let cancel = CancellationToken::new();

        let session = Session {
            config: self.config.clone(),
            channel: channel.to_string(),
            matcher: EventMatcher::new(event, self.config.match_location_shape),
            authorizer: Arc::clone(&self.authorizer),
            on_message: Arc::new(on_message),
            status_tx,
            cancel: cancel.clone(),
        };

        let task = tokio::spawn(connection_loop(session));

        self.active = Some(ActiveConnection {
            channel: channel.to_string(),
            cancel,
            task,
        });

        Ok(ConnectionHandle {
            channel: channel.to_string(),
            status: status_rx,
        })
    }

    /// Close the socket and stop the heartbeat. Safe to call when idle.
    pub async fn disconnect(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        info!(channel = %active.channel, "Closing channel connection");
        active.cancel.cancel();
        if let Err(e) = active.task.await {
            warn!(error = %e, "Connection task ended abnormally");
        }
    }

    /// Whether a connection task is currently owned by this client.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Observes one connection started by [`RealtimeClient::connect`].
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    channel: String,
    status: watch::Receiver<ConnectionStatus>,
}

impl ConnectionHandle {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Current status snapshot.
    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    /// A receiver for following status changes.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Wait until the channel is subscribed, or report why it never will be.
    pub async fn wait_subscribed(&mut self) -> Result<(), RealtimeError> {
        let status = match self
            .status
            .wait_for(|s| {
                matches!(
                    s,
                    ConnectionStatus::Subscribed
                        | ConnectionStatus::Failed(_)
                        | ConnectionStatus::Closed
                )
            })
            .await
        {
            Ok(status) => status.clone(),
            Err(_) => return Err(RealtimeError::Closed),
        };

        match status {
            ConnectionStatus::Subscribed => Ok(()),
            ConnectionStatus::Failed(reason) => Err(RealtimeError::Failed(reason)),
            _ => Err(RealtimeError::Closed),
        }
    }
}
