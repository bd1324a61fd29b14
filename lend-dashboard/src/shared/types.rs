//! Core data types for lending market snapshots
//!
//! These types match the JSON message format published by lend-snapshot-server
//! at ws://127.0.0.1:9002

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::error::DashboardError;

/// Snapshot of every lending pool plus the caller's account state
///
/// Published wholesale on every poll tick, never mutated in place
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketSnapshot {
    /// Time the publisher stamped this snapshot
    #[serde(default = "Utc::now")]
    pub time_published: DateTime<Utc>,
    /// One record per lending pool
    pub banks: Vec<MarketRecord>,
    /// Positions of the selected margin account, if a wallet is connected
    #[serde(default)]
    pub account: Option<AccountPositions>,
    /// Native SOL held by the wallet outside of token accounts
    #[serde(default)]
    pub native_sol_balance: Decimal,
}

impl MarketSnapshot {
    /// Reject snapshots carrying values the derivation pipeline does not defend against
    pub fn validate(&self) -> Result<(), DashboardError> {
        self.banks.iter().try_for_each(MarketRecord::validate)
    }
}

impl Default for MarketSnapshot {
    fn default() -> Self {
        Self {
            time_published: Utc::now(),
            banks: Vec::new(),
            account: None,
            native_sol_balance: Decimal::ZERO,
        }
    }
}

/// Pool category of a lending market
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PoolCategory {
    #[default]
    Global,
    Isolated,
}

/// Which side of the market receives emissions
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Emissions {
    #[default]
    None,
    Lending,
    Borrowing,
}

/// Lending or borrowing perspective of the dashboard
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LendingMode {
    #[default]
    Lend,
    Borrow,
}

impl LendingMode {
    pub fn toggled(&self) -> Self {
        match self {
            LendingMode::Lend => LendingMode::Borrow,
            LendingMode::Borrow => LendingMode::Lend,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LendingMode::Lend => "LEND",
            LendingMode::Borrow => "BORROW",
        }
    }
}

impl std::fmt::Display for LendingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Risk configuration of a lending pool, in raw on-chain units
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BankConfig {
    /// Initial asset weight (collateral factor), 0..=1
    pub asset_weight_init: Decimal,
    /// Initial liability weight, >= 1
    pub liability_weight_init: Decimal,
    /// Deposit cap in raw token units
    pub deposit_limit: Decimal,
    /// Borrow cap in raw token units
    pub borrow_limit: Decimal,
    /// USD value above which the initial asset weight is discounted (0 = no limit)
    #[serde(default)]
    pub total_asset_value_init_limit: Decimal,
}

/// Live state of a lending pool
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BankState {
    /// Total deposits in token units
    pub total_deposits: Decimal,
    /// Total borrows in token units
    pub total_borrows: Decimal,
    /// Lending APY as a fraction (0.05 = 5%)
    pub lending_rate: f64,
    /// Borrowing APR as a fraction
    pub borrowing_rate: f64,
    /// Incentive rate as a fraction
    #[serde(default)]
    pub emissions_rate: f64,
    #[serde(default)]
    pub emissions: Emissions,
}

/// One lending pool
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MarketRecord {
    /// Token symbol (e.g., "SOL", "USDC")
    pub symbol: String,
    #[serde(default)]
    pub category: PoolCategory,
    /// Token mint decimals used to scale raw on-chain limits
    pub decimals: u8,
    /// Oracle price in USD
    pub price: Decimal,
    pub config: BankConfig,
    pub state: BankState,
    /// Connected wallet's token balance for this asset
    #[serde(default)]
    pub wallet_balance: Decimal,
}

impl MarketRecord {
    pub fn is_isolated(&self) -> bool {
        matches!(self.category, PoolCategory::Isolated)
    }

    /// Check the non-negative invariants of capacity numbers and prices
    pub fn validate(&self) -> Result<(), DashboardError> {
        let fields = [
            ("deposit_limit", self.config.deposit_limit),
            ("borrow_limit", self.config.borrow_limit),
            ("total_deposits", self.state.total_deposits),
            ("total_borrows", self.state.total_borrows),
            ("price", self.price),
        ];

        if let Some((name, value)) = fields.iter().find(|(_, value)| *value < Decimal::ZERO) {
            return Err(DashboardError::InvalidRecord {
                symbol: self.symbol.clone(),
                reason: format!("{name} is negative: {value}"),
            });
        }

        let rates = [
            ("lending_rate", self.state.lending_rate),
            ("borrowing_rate", self.state.borrowing_rate),
            ("emissions_rate", self.state.emissions_rate),
        ];

        if let Some((name, value)) = rates.iter().find(|(_, value)| !value.is_finite()) {
            return Err(DashboardError::InvalidRecord {
                symbol: self.symbol.clone(),
                reason: format!("{name} is not finite: {value}"),
            });
        }

        Ok(())
    }
}

/// Side of an open position
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Lending,
    Borrowing,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Lending => "Lending",
            PositionSide::Borrowing => "Borrowing",
        }
    }
}

/// Caller's active stake in one lending pool
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UserPosition {
    pub symbol: String,
    /// Position size in token units
    pub amount: Decimal,
    pub side: PositionSide,
    /// Position value in USD
    #[serde(default)]
    pub usd_value: Decimal,
}

/// Positions of one margin account
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AccountPositions {
    /// Margin account address
    pub address: String,
    #[serde(default)]
    pub positions: Vec<UserPosition>,
}

impl AccountPositions {
    /// Zero-or-one active position per market
    pub fn position(&self, symbol: &str) -> Option<&UserPosition> {
        self.positions.iter().find(|p| p.symbol == symbol)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.position(symbol).is_some()
    }
}
