//! Dashboard configuration loaded from environment variables
//!
//! Every setting has a default so the dashboard starts with no environment at all.

use std::path::PathBuf;
use std::time::Duration;

use crate::shared::filter::{PoolFilter, SymbolSets};
use crate::shared::hotkeys::DEFAULT_HOTKEY_WINDOW;
use crate::shared::sort::SortSpec;
use crate::shared::table::Denomination;
use crate::shared::types::LendingMode;
use crate::shared::view::UiSettings;
use crate::shared::websocket::WebSocketConfig;

/// Complete dashboard configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Snapshot feed connection
    pub feed: WebSocketConfig,
    /// Settings the asset list starts with
    pub initial: UiSettings,
    /// Symbols behind the stable / lst filters
    pub symbols: SymbolSets,
    /// How long hotkey mode stays armed
    pub hotkey_window: Duration,
    /// Redraw interval of the UI loop
    pub tick_rate: Duration,
    /// Log destination; stdout belongs to the terminal UI
    pub log_file: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            feed: WebSocketConfig::default(),
            initial: UiSettings::default(),
            symbols: SymbolSets::default(),
            hotkey_window: DEFAULT_HOTKEY_WINDOW,
            tick_rate: Duration::from_millis(250),
            log_file: PathBuf::from("lend-dashboard.log"),
        }
    }
}

impl DashboardConfig {
    /// Load from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("WS_URL") {
            config.feed = WebSocketConfig::new(url);
        }

        if let Some(mode) = lookup("LEND_MODE") {
            config.initial.mode = match mode.trim().to_lowercase().as_str() {
                "borrow" => LendingMode::Borrow,
                _ => LendingMode::Lend,
            };
        }
        if let Some(filter) = lookup("POOL_FILTER") {
            config.initial.pool_filter = PoolFilter::parse(&filter);
        }
        if let Some(sort) = lookup("SORT") {
            config.initial.sort = SortSpec::parse(&sort);
        }
        if let Some(denomination) = lookup("DENOMINATION") {
            config.initial.denomination = match denomination.trim().to_lowercase().as_str() {
                "native" => Denomination::Native,
                _ => Denomination::Usd,
            };
        }

        if let Some(window) = lookup("HOTKEY_WINDOW_MS").and_then(|s| s.parse().ok()) {
            config.hotkey_window = Duration::from_millis(window);
        }
        if let Some(tick) = lookup("TICK_RATE_MS").and_then(|s| s.parse().ok()) {
            config.tick_rate = Duration::from_millis(tick);
        }

        if let Some(stablecoins) = lookup("STABLECOINS") {
            config.symbols.stablecoins = parse_symbols(&stablecoins);
        }
        if let Some(lsts) = lookup("LSTS") {
            config.symbols.lsts = parse_symbols(&lsts);
        }

        if let Some(path) = lookup("LOG_FILE") {
            config.log_file = PathBuf::from(path);
        }

        config
    }

    pub fn with_initial(mut self, initial: UiSettings) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_symbols(mut self, symbols: SymbolSets) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn with_hotkey_window(mut self, window: Duration) -> Self {
        self.hotkey_window = window;
        self
    }
}

/// Comma separated symbols; case is kept because LST symbols are mixed case (mSOL, jitoSOL)
fn parse_symbols(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
