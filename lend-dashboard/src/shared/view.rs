//! Full asset-list pipeline: filter -> sort -> split -> rows
//!
//! Recomputed from scratch for every snapshot or settings change; nothing is cached.

use crate::shared::filter::{self, PoolFilter, SymbolSets};
use crate::shared::sort::{self, SortSpec};
use crate::shared::table::{self, AssetRow, Denomination};
use crate::shared::types::{LendingMode, MarketRecord, MarketSnapshot};

/// User-controlled settings of the asset list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UiSettings {
    pub mode: LendingMode,
    pub pool_filter: PoolFilter,
    /// `None` keeps the snapshot order
    pub sort: Option<SortSpec>,
    pub denomination: Denomination,
    /// Only list pools the account holds a position in
    pub positions_only: bool,
}

/// Rows of the two asset tables
#[derive(Debug, Clone, Default)]
pub struct AssetListView {
    pub global: Vec<AssetRow>,
    pub isolated: Vec<AssetRow>,
    /// Hotkey order of global pool symbols
    pub hotkey_ranking: Vec<String>,
}

impl AssetListView {
    /// Index of `symbol` in the global table
    pub fn global_index(&self, symbol: &str) -> Option<usize> {
        self.global.iter().position(|row| row.symbol == symbol)
    }
}

/// Derive both asset tables from one snapshot
pub fn derive_asset_list(snapshot: &MarketSnapshot, settings: &UiSettings, symbols: &SymbolSets) -> AssetListView {
    let filtered = filter::filter(&snapshot.banks, settings.pool_filter, symbols);
    let sorted = match settings.sort {
        Some(spec) => sort::sort_records(&filtered, spec, settings.mode),
        None => filtered,
    };

    let account = snapshot.account.as_ref();
    let (global, isolated) = filter::split_by_pool(sorted);
    let (global, isolated) = if settings.positions_only {
        (filter::positions_only(global, account), filter::positions_only(isolated, account))
    } else {
        (global, isolated)
    };

    let build = |records: &[MarketRecord]| {
        table::build(records, settings.mode, settings.denomination, snapshot.native_sol_balance, account)
    };

    // Digit hotkeys address global pools regardless of the active filter
    let hotkey_ranking = sort::hotkey_ranking(&snapshot.banks);

    AssetListView {
        global: table::with_hotkeys(build(&global), &hotkey_ranking),
        isolated: build(&isolated),
        hotkey_ranking,
    }
}
