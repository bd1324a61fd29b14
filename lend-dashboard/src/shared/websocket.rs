//! WebSocket client for the lending market snapshot feed
//!
//! Provides automatic reconnection, heartbeat, and snapshot parsing. Each valid snapshot
//! replaces the previous one in a `watch` channel; invalid snapshots are dropped.

use crate::shared::error::DashboardError;
use crate::shared::types::MarketSnapshot;
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// WebSocket server URL
    pub url: String,
    /// Ping interval to keep connection alive
    pub ping_interval: Duration,
    /// Reconnection delay after disconnect
    pub reconnect_delay: Duration,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:9002".to_string(),
            ping_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(2),
        }
    }
}

impl WebSocketConfig {
    /// Create a new configuration with custom URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set ping interval
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Set reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

/// Messages published by lend-snapshot-server
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedMessage {
    Welcome {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    Snapshot(MarketSnapshot),
}

/// Parse one feed message, returning the snapshot it carries (if any)
///
/// Snapshots failing validation are rejected so the previous snapshot stays on screen.
pub fn parse_feed_message(text: &str) -> Result<Option<MarketSnapshot>, DashboardError> {
    match serde_json::from_str::<FeedMessage>(text)? {
        FeedMessage::Welcome { message, timestamp } => {
            debug!(?timestamp, "Received welcome message: {}", message.unwrap_or_default());
            Ok(None)
        }
        FeedMessage::Snapshot(snapshot) => {
            snapshot.validate()?;
            Ok(Some(snapshot))
        }
    }
}

/// Snapshot feed client
pub struct SnapshotClient {
    config: WebSocketConfig,
    snapshot_tx: watch::Sender<Arc<MarketSnapshot>>,
    snapshot_rx: watch::Receiver<Arc<MarketSnapshot>>,
    status_tx: mpsc::Sender<ConnectionStatus>,
    status_rx: mpsc::Receiver<ConnectionStatus>,
}

/// Connection status updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

impl SnapshotClient {
    /// Create a new client with default configuration
    pub fn new() -> Self {
        Self::with_config(WebSocketConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: WebSocketConfig) -> Self {
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(MarketSnapshot::default()));
        let (status_tx, status_rx) = mpsc::channel(10);

        Self {
            config,
            snapshot_tx,
            snapshot_rx,
            status_tx,
            status_rx,
        }
    }

    /// Start the WebSocket client connection
    ///
    /// Returns a receiver always holding the latest snapshot and a receiver for connection status updates
    pub fn start(
        self,
    ) -> (
        watch::Receiver<Arc<MarketSnapshot>>,
        mpsc::Receiver<ConnectionStatus>,
    ) {
        let config = self.config.clone();
        let snapshot_tx = self.snapshot_tx;
        let status_tx = self.status_tx;

        tokio::spawn(async move {
            run_websocket_loop(config, snapshot_tx, status_tx).await;
        });

        (self.snapshot_rx, self.status_rx)
    }
}

impl Default for SnapshotClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Main WebSocket connection loop with auto-reconnect
async fn run_websocket_loop(
    config: WebSocketConfig,
    snapshot_tx: watch::Sender<Arc<MarketSnapshot>>,
    status_tx: mpsc::Sender<ConnectionStatus>,
) {
    info!("Starting snapshot feed client for {}", config.url);

    loop {
        // Notify about reconnection attempt
        let _ = status_tx.send(ConnectionStatus::Reconnecting).await;

        match connect_async(&config.url).await {
            Ok((ws_stream, _)) => {
                info!("Connected to snapshot feed at {}", config.url);
                let _ = status_tx.send(ConnectionStatus::Connected).await;

                let (mut write, mut read) = ws_stream.split();

                // Spawn ping task to keep connection alive
                let ping_interval = config.ping_interval;
                let (ping_shutdown_tx, mut ping_shutdown_rx) = mpsc::channel::<()>(1);

                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(ping_interval);
                    loop {
                        tokio::select! {
                            _ = interval.tick() => {
                                if write.send(Message::Ping(vec![].into())).await.is_err() {
                                    debug!("Failed to send ping, connection likely dead");
                                    break;
                                }
                            }
                            _ = ping_shutdown_rx.recv() => {
                                debug!("Ping task shutting down");
                                break;
                            }
                        }
                    }
                });

                while let Some(msg) = read.next().await {
                    match msg {
                        Ok(Message::Text(text)) => match parse_feed_message(&text) {
                            Ok(Some(snapshot)) => {
                                debug!(
                                    banks = snapshot.banks.len(),
                                    published = %snapshot.time_published,
                                    "Received snapshot"
                                );
                                if snapshot_tx.send(Arc::new(snapshot)).is_err() {
                                    warn!("Snapshot receiver dropped, stopping client");
                                    let _ = ping_shutdown_tx.send(()).await;
                                    return;
                                }
                            }
                            Ok(None) => {}
                            Err(e) if e.is_recoverable() => {
                                warn!("Dropping snapshot: {}", e);
                            }
                            Err(e) => {
                                error!("Failed to handle message: {}", e);
                            }
                        },
                        Ok(Message::Close(_)) => {
                            info!("Server closed connection");
                            break;
                        }
                        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                            // Heartbeat messages - tungstenite handles these automatically
                        }
                        Err(e) => {
                            error!("WebSocket error: {}", DashboardError::from(e));
                            break;
                        }
                        _ => {}
                    }
                }

                // Stop ping task
                let _ = ping_shutdown_tx.send(()).await;

                // Notify disconnection
                let _ = status_tx.send(ConnectionStatus::Disconnected).await;
                warn!("Connection closed, will reconnect...");
            }
            Err(e) => {
                error!("Failed to connect to {}: {}", config.url, e);
                let _ = status_tx.send(ConnectionStatus::Disconnected).await;
            }
        }

        // Wait before reconnecting
        debug!(
            "Waiting {:?} before reconnecting...",
            config.reconnect_delay
        );
        tokio::time::sleep(config.reconnect_delay).await;
    }
}
