//! Pool-category filtering of market records
//!
//! Filters never reorder and never deduplicate; symbols are assumed unique per snapshot.

use serde::{Deserialize, Serialize};

use crate::shared::types::{AccountPositions, MarketRecord};

/// Pool filter chosen in the filter bar
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PoolFilter {
    #[default]
    None,
    Isolated,
    Stable,
    Lst,
    /// Unrecognised filter value, treated as pass-through
    #[serde(other)]
    Unknown,
}

impl PoolFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolFilter::None => "ALL",
            PoolFilter::Isolated => "ISOLATED",
            PoolFilter::Stable => "STABLE",
            PoolFilter::Lst => "LST",
            PoolFilter::Unknown => "ALL",
        }
    }

    /// Next filter in the filter bar cycle
    pub fn next(&self) -> Self {
        match self {
            PoolFilter::None | PoolFilter::Unknown => PoolFilter::Isolated,
            PoolFilter::Isolated => PoolFilter::Stable,
            PoolFilter::Stable => PoolFilter::Lst,
            PoolFilter::Lst => PoolFilter::None,
        }
    }

    /// Parse a filter name, falling back to `Unknown`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "" | "none" | "all" => PoolFilter::None,
            "isolated" => PoolFilter::Isolated,
            "stable" => PoolFilter::Stable,
            "lst" => PoolFilter::Lst,
            _ => PoolFilter::Unknown,
        }
    }
}

/// Reference symbol sets for the stablecoin and liquid-staking-token filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSets {
    pub stablecoins: Vec<String>,
    pub lsts: Vec<String>,
}

impl Default for SymbolSets {
    fn default() -> Self {
        Self {
            stablecoins: ["USDC", "USDT", "UXD", "USDY", "PYUSD"]
                .into_iter()
                .map(String::from)
                .collect(),
            lsts: ["LST", "mSOL", "jitoSOL", "bSOL", "stSOL", "INF"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl SymbolSets {
    pub fn is_stablecoin(&self, symbol: &str) -> bool {
        self.stablecoins.iter().any(|s| s == symbol)
    }

    pub fn is_lst(&self, symbol: &str) -> bool {
        self.lsts.iter().any(|s| s == symbol)
    }
}

/// Keep the records matching `category`
pub fn filter(records: &[MarketRecord], category: PoolFilter, symbols: &SymbolSets) -> Vec<MarketRecord> {
    records
        .iter()
        .filter(|record| match category {
            PoolFilter::Isolated => record.is_isolated(),
            PoolFilter::Stable => symbols.is_stablecoin(&record.symbol),
            PoolFilter::Lst => symbols.is_lst(&record.symbol),
            PoolFilter::None | PoolFilter::Unknown => true,
        })
        .cloned()
        .collect()
}

/// Split records into (global, isolated), preserving order within each
pub fn split_by_pool(records: Vec<MarketRecord>) -> (Vec<MarketRecord>, Vec<MarketRecord>) {
    records.into_iter().partition(|record| !record.is_isolated())
}

/// Keep the records the account holds an active position in
pub fn positions_only(records: Vec<MarketRecord>, account: Option<&AccountPositions>) -> Vec<MarketRecord> {
    let Some(account) = account else {
        return Vec::new();
    };
    records
        .into_iter()
        .filter(|record| account.has_position(&record.symbol))
        .collect()
}
