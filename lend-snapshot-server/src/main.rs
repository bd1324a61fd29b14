//! Publishes a lending market snapshot file to WebSocket clients whenever it changes

use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use lend_dashboard::{DashboardError, MarketSnapshot};
use serde::Serialize;
use std::error::Error;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::watch,
    time::interval,
};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

const DEFAULT_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 9002);
const DEFAULT_SNAPSHOT_PATH: &str = "snapshot.json";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Snapshot wrapper for JSON serialization
#[derive(Debug, Serialize)]
struct SnapshotMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    snapshot: &'a MarketSnapshot,
}

/// Latest serialized snapshot, `None` until the first valid file has been read
type Latest = Option<Arc<String>>;

#[derive(Debug, Clone, PartialEq)]
struct ServerConfig {
    addr: SocketAddr,
    snapshot_path: PathBuf,
    poll_interval: Duration,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Configurable via WS_ADDR env var (default: 0.0.0.0:9002)
        let addr = lookup("WS_ADDR")
            .and_then(|s| s.parse::<SocketAddr>().ok())
            .unwrap_or(DEFAULT_ADDR);

        let snapshot_path = lookup("SNAPSHOT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH));

        let poll_interval = lookup("POLL_INTERVAL_MS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        Self {
            addr,
            snapshot_path,
            poll_interval,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    init_logging();

    info!("Starting lend snapshot server");

    let config = ServerConfig::from_env();
    info!(
        "Serving {} every {:?}",
        config.snapshot_path.display(),
        config.poll_interval
    );

    let (tx, _rx) = watch::channel::<Latest>(None);
    let tx = Arc::new(tx);

    let listener = TcpListener::bind(&config.addr).await?;
    info!("WebSocket server listening on ws://{}", config.addr);
    info!("Clients can connect to receive lending market snapshots");

    let tx_clone = tx.clone();
    tokio::spawn(async move {
        start_websocket_server(listener, tx_clone).await;
    });

    tokio::select! {
        _ = poll_snapshot_file(config, tx) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown requested");
        }
    }

    Ok(())
}

/// Re-read the snapshot file every tick and publish it whenever its content changes
async fn poll_snapshot_file(config: ServerConfig, tx: Arc<watch::Sender<Latest>>) {
    let mut ticker = interval(config.poll_interval);
    let mut last_raw: Option<String> = None;
    let mut read_failing = false;

    loop {
        ticker.tick().await;

        let raw = match tokio::fs::read_to_string(&config.snapshot_path).await {
            Ok(raw) => {
                read_failing = false;
                raw
            }
            Err(e) => {
                // Warn once per outage, the file may simply not exist yet
                if !read_failing {
                    warn!(
                        "Cannot read {}: {}",
                        config.snapshot_path.display(),
                        DashboardError::from(e)
                    );
                    read_failing = true;
                }
                continue;
            }
        };

        if last_raw.as_deref() == Some(raw.as_str()) {
            continue;
        }

        match encode_snapshot(&raw, Utc::now()) {
            Ok(json) => {
                info!("Publishing snapshot ({} bytes) to {} clients", json.len(), tx.receiver_count());
                tx.send_replace(Some(Arc::new(json)));
            }
            Err(e) => {
                // Keep serving the previous snapshot
                warn!("Dropping snapshot from {}: {}", config.snapshot_path.display(), e);
            }
        }
        last_raw = Some(raw);
    }
}

/// Parse, validate and stamp a snapshot file, returning the wire message
fn encode_snapshot(raw: &str, now: DateTime<Utc>) -> Result<String, DashboardError> {
    let mut snapshot: MarketSnapshot = serde_json::from_str(raw)?;
    snapshot.validate()?;
    snapshot.time_published = now;

    let message = SnapshotMessage {
        kind: "snapshot",
        snapshot: &snapshot,
    };
    Ok(serde_json::to_string(&message)?)
}

/// Accept WebSocket clients and hand each one the snapshot channel
async fn start_websocket_server(listener: TcpListener, tx: Arc<watch::Sender<Latest>>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                info!("New WebSocket connection from {}", peer_addr);
                let rx = tx.subscribe();
                tokio::spawn(handle_client(stream, peer_addr, rx));
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Handle individual WebSocket client connection
async fn handle_client(stream: TcpStream, peer_addr: SocketAddr, mut rx: watch::Receiver<Latest>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("WebSocket handshake failed for {}: {}", peer_addr, e);
            return;
        }
    };

    info!("WebSocket handshake completed for {}", peer_addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Send welcome message
    let welcome = serde_json::json!({
        "type": "welcome",
        "message": "Connected to lend snapshot feed",
        "timestamp": Utc::now()
    });
    if let Ok(msg) = serde_json::to_string(&welcome) {
        let _ = ws_sender.send(Message::Text(msg.into())).await;
    }

    // Spawn task sending the current snapshot, then every replacement
    let mut send_task = tokio::spawn(async move {
        loop {
            let latest = rx.borrow_and_update().clone();
            if let Some(json) = latest {
                if ws_sender.send(Message::Text(json.as_str().into())).await.is_err() {
                    break;
                }
            }
            if rx.changed().await.is_err() {
                info!("Snapshot channel closed for {}", peer_addr);
                break;
            }
        }
    });

    // Handle incoming messages from client (e.g., ping/pong)
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(Message::Ping(_)) => {
                    // Tungstenite handles pong automatically, but log it
                    debug!("Received ping from {}", peer_addr);
                }
                Ok(Message::Text(text)) => {
                    debug!("Received text from {}: {}", peer_addr, text);
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", peer_addr, e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            info!("Send task completed for {}", peer_addr);
            recv_task.abort();
        }
        _ = &mut recv_task => {
            info!("Receive task completed for {}", peer_addr);
            send_task.abort();
        }
    }

    info!("WebSocket connection closed for {}", peer_addr);
}

/// Initialize logging
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
