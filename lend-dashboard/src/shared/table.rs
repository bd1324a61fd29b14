//! Row view-models and column definitions for the asset tables

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::format;
use crate::shared::metrics::{self, AssetMetrics};
use crate::shared::types::{AccountPositions, LendingMode, MarketRecord, PoolCategory, UserPosition};

/// Symbol whose wallet balance includes native (non-token-account) SOL
const NATIVE_SOL_SYMBOL: &str = "SOL";

/// Unit amounts are displayed in
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Denomination {
    #[default]
    Usd,
    Native,
}

impl Denomination {
    pub fn toggled(&self) -> Self {
        match self {
            Denomination::Usd => Denomination::Native,
            Denomination::Native => Denomination::Usd,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Denomination::Usd => "USD",
            Denomination::Native => "NATIVE",
        }
    }
}

/// One row of an asset table
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRow {
    pub symbol: String,
    pub category: PoolCategory,
    pub price: Decimal,
    pub metrics: AssetMetrics,
    /// Total deposits while lending, borrowable liquidity while borrowing (token units)
    pub deposits: Decimal,
    pub utilization: Decimal,
    /// Wallet balance in token units
    pub wallet_balance: Decimal,
    pub denomination: Denomination,
    pub position: Option<UserPosition>,
    /// 1-based hotkey badge, global pool rows only
    pub hotkey: Option<usize>,
}

impl AssetRow {
    fn amount(&self, tokens: Decimal) -> String {
        match self.denomination {
            Denomination::Usd => format::usd(tokens.saturating_mul(self.price)),
            Denomination::Native => format!("{} {}", format::token_amount(tokens), self.symbol),
        }
    }

    pub fn price_cell(&self) -> String {
        format::usd(self.price)
    }

    pub fn deposits_cell(&self) -> String {
        self.amount(self.deposits)
    }

    pub fn capacity_cell(&self) -> String {
        self.amount(self.metrics.capacity)
    }

    pub fn wallet_cell(&self) -> String {
        self.amount(self.wallet_balance)
    }

    /// Position size; in USD the value reported by the account is used as is
    pub fn position_cell(&self) -> String {
        match &self.position {
            Some(position) => {
                let amount = match self.denomination {
                    Denomination::Usd => format::usd(position.usd_value),
                    Denomination::Native => self.amount(position.amount),
                };
                format!("{} {}", position.side.as_str(), amount)
            }
            None => "-".to_string(),
        }
    }

    pub fn utilization_cell(&self) -> String {
        format::whole_percent(self.utilization)
    }

    /// Text of the `kind` column; the Deposits column also shows the pool cap
    pub fn cell(&self, kind: ColumnKind) -> String {
        match kind {
            ColumnKind::Asset => self.symbol.clone(),
            ColumnKind::Price => self.price_cell(),
            ColumnKind::Rate => self.metrics.effective_rate.clone(),
            ColumnKind::Weight => self.metrics.weight.clone(),
            ColumnKind::Deposits => format!("{} / {}", self.deposits_cell(), self.capacity_cell()),
            ColumnKind::Utilization => self.utilization_cell(),
            ColumnKind::Wallet => self.wallet_cell(),
            ColumnKind::Position => self.position_cell(),
        }
    }
}

/// Column of an asset table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Asset,
    Price,
    Rate,
    Weight,
    Deposits,
    Utilization,
    Wallet,
    Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub kind: ColumnKind,
    pub header: &'static str,
    /// Preferred width in terminal cells
    pub width: u16,
}

/// Column definitions for `mode`
pub fn columns(mode: LendingMode) -> Vec<Column> {
    let (rate, weight, deposits) = match mode {
        LendingMode::Lend => ("APY", "Weight", "Deposits"),
        LendingMode::Borrow => ("APR", "LTV", "Available"),
    };

    vec![
        Column { kind: ColumnKind::Asset, header: "Asset", width: 12 },
        Column { kind: ColumnKind::Price, header: "Price", width: 14 },
        Column { kind: ColumnKind::Rate, header: rate, width: 10 },
        Column { kind: ColumnKind::Weight, header: weight, width: 8 },
        Column { kind: ColumnKind::Deposits, header: deposits, width: 34 },
        Column { kind: ColumnKind::Utilization, header: "Util", width: 6 },
        Column { kind: ColumnKind::Wallet, header: "Wallet", width: 20 },
        Column { kind: ColumnKind::Position, header: "Position", width: 28 },
    ]
}

/// Map already filtered and sorted records to table rows, preserving their order
pub fn build(
    records: &[MarketRecord],
    mode: LendingMode,
    denomination: Denomination,
    native_sol_balance: Decimal,
    account: Option<&AccountPositions>,
) -> Vec<AssetRow> {
    records
        .iter()
        .map(|record| {
            let deposits = match mode {
                LendingMode::Lend => record.state.total_deposits,
                LendingMode::Borrow => metrics::available_liquidity(record),
            };
            let wallet_balance = if record.symbol == NATIVE_SOL_SYMBOL {
                record.wallet_balance.saturating_add(native_sol_balance)
            } else {
                record.wallet_balance
            };

            AssetRow {
                symbol: record.symbol.clone(),
                category: record.category,
                price: record.price,
                metrics: metrics::derive(Some(record), mode),
                deposits,
                utilization: metrics::utilization(record),
                wallet_balance,
                denomination,
                position: account.and_then(|account| account.position(&record.symbol)).cloned(),
                hotkey: None,
            }
        })
        .collect()
}

/// Attach the 1-based hotkey badge each row's symbol holds in `ranking`
pub fn with_hotkeys(rows: Vec<AssetRow>, ranking: &[String]) -> Vec<AssetRow> {
    rows.into_iter()
        .map(|row| {
            let hotkey = ranking.iter().position(|symbol| *symbol == row.symbol).map(|index| index + 1);
            AssetRow { hotkey, ..row }
        })
        .collect()
}
