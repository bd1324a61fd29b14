//! Lend Dashboard - Shared Library
//!
//! This library provides the asset-list pipeline behind the `asset-list` TUI:
//! - metrics: per-pool rate, weight and capacity derivation
//! - filter / sort: pool filtering and mode-aware ordering
//! - table / view: row view-models for the global and isolated tables
//! - hotkeys: timed row-number navigation
//!
//! The library also includes the snapshot feed client used to receive market snapshots
//! from lend-snapshot-server.

pub mod shared;

// Re-export commonly used types for convenience
pub use shared::types::{
    AccountPositions, BankConfig, BankState, Emissions, LendingMode, MarketRecord, MarketSnapshot,
    PoolCategory, PositionSide, UserPosition,
};

pub use shared::config::DashboardConfig;
pub use shared::error::DashboardError;
pub use shared::websocket::ConnectionStatus;
pub use shared::websocket::{SnapshotClient, WebSocketConfig};

// Asset-list pipeline
pub use shared::filter::{PoolFilter, SymbolSets};
pub use shared::hotkeys::{HotkeyAction, HotkeyInput, HotkeyRouter};
pub use shared::metrics::AssetMetrics;
pub use shared::sort::{SortDirection, SortField, SortSpec};
pub use shared::table::{AssetRow, Column, ColumnKind, Denomination};
pub use shared::view::{derive_asset_list, AssetListView, UiSettings};
