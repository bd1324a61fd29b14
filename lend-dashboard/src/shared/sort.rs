//! Stable ordering of market records by APY or TVL

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::shared::metrics::{effective_rate_value, tvl_usd};
use crate::shared::types::{LendingMode, MarketRecord};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum SortField {
    #[serde(rename = "APY")]
    Apy,
    #[serde(rename = "TVL")]
    Tvl,
    /// Unrecognised sort field, leaves the order untouched
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sort option picked in the filter bar
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn label(&self) -> &'static str {
        match (self.field, self.direction) {
            (SortField::Apy, SortDirection::Descending) => "APY ↓",
            (SortField::Apy, SortDirection::Ascending) => "APY ↑",
            (SortField::Tvl, SortDirection::Descending) => "TVL ↓",
            (SortField::Tvl, SortDirection::Ascending) => "TVL ↑",
            (SortField::Unknown, _) => "NONE",
        }
    }

    /// Parse "APY_DESC" / "tvl-asc" style names
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_uppercase().replace('-', "_");
        let (field, direction) = normalized.split_once('_').unwrap_or((normalized.as_str(), "DESC"));
        let field = match field {
            "APY" => SortField::Apy,
            "TVL" => SortField::Tvl,
            _ => return None,
        };
        let direction = match direction {
            "ASC" => SortDirection::Ascending,
            "DESC" => SortDirection::Descending,
            _ => return None,
        };
        Some(Self::new(field, direction))
    }
}

/// Next entry of the sort cycle: APY ↓, APY ↑, TVL ↓, TVL ↑, unsorted
pub fn next_sort(current: Option<SortSpec>) -> Option<SortSpec> {
    use SortDirection::*;
    use SortField::*;

    match current.map(|spec| (spec.field, spec.direction)) {
        None | Some((Unknown, _)) => Some(SortSpec::new(Apy, Descending)),
        Some((Apy, Descending)) => Some(SortSpec::new(Apy, Ascending)),
        Some((Apy, Ascending)) => Some(SortSpec::new(Tvl, Descending)),
        Some((Tvl, Descending)) => Some(SortSpec::new(Tvl, Ascending)),
        Some((Tvl, Ascending)) => None,
    }
}

/// Build the comparator for `spec` in `mode`
///
/// Keys compare ascending and descending reverses them; equal keys compare `Equal` so a
/// stable sort keeps their input order.
pub fn compare_factory(spec: SortSpec, mode: LendingMode) -> impl Fn(&MarketRecord, &MarketRecord) -> Ordering {
    move |a, b| {
        let ordering = match spec.field {
            SortField::Apy => effective_rate_value(a, mode).total_cmp(&effective_rate_value(b, mode)),
            SortField::Tvl => a.state.total_deposits.cmp(&b.state.total_deposits),
            SortField::Unknown => Ordering::Equal,
        };

        match spec.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Return a stably sorted copy of `records`
pub fn sort_records(records: &[MarketRecord], spec: SortSpec, mode: LendingMode) -> Vec<MarketRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(compare_factory(spec, mode));
    sorted
}

/// Symbols of global pools ranked by USD TVL, highest first; digit hotkeys index into this
pub fn hotkey_ranking(records: &[MarketRecord]) -> Vec<String> {
    let mut global: Vec<&MarketRecord> = records.iter().filter(|r| !r.is_isolated()).collect();
    global.sort_by(|a, b| tvl_usd(b).cmp(&tvl_usd(a)));
    global.into_iter().map(|r| r.symbol.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::{BankState, Emissions, PoolCategory};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn record(symbol: &str, tvl: Decimal, lending_rate: f64) -> MarketRecord {
        MarketRecord {
            symbol: symbol.to_string(),
            price: dec!(1),
            state: BankState {
                total_deposits: tvl,
                lending_rate,
                borrowing_rate: lending_rate * 2.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn symbols(records: &[MarketRecord]) -> Vec<&str> {
        records.iter().map(|r| r.symbol.as_str()).collect()
    }

    #[test]
    fn test_sort_tvl_both_directions() {
        let records = vec![
            record("a", dec!(10), 0.0),
            record("b", dec!(50), 0.0),
            record("c", dec!(30), 0.0),
        ];

        let desc = sort_records(&records, SortSpec::new(SortField::Tvl, SortDirection::Descending), LendingMode::Lend);
        assert_eq!(symbols(&desc), vec!["b", "c", "a"]);

        let asc = sort_records(&records, SortSpec::new(SortField::Tvl, SortDirection::Ascending), LendingMode::Lend);
        assert_eq!(symbols(&asc), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_sort_apy_is_stable_for_ties() {
        let records = vec![
            record("a", dec!(0), 0.05),
            record("b", dec!(0), 0.05),
            record("c", dec!(0), 0.01),
        ];

        let desc = sort_records(&records, SortSpec::new(SortField::Apy, SortDirection::Descending), LendingMode::Lend);
        assert_eq!(symbols(&desc), vec!["a", "b", "c"]);

        let asc = sort_records(&records, SortSpec::new(SortField::Apy, SortDirection::Ascending), LendingMode::Lend);
        assert_eq!(symbols(&asc), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_sort_apy_is_mode_aware() {
        let mut boosted = record("boosted", dec!(0), 0.01);
        boosted.state.emissions = Emissions::Borrowing;
        boosted.state.emissions_rate = 0.5;
        let plain = record("plain", dec!(0), 0.03);
        let records = vec![boosted, plain];
        let spec = SortSpec::new(SortField::Apy, SortDirection::Descending);

        assert_eq!(symbols(&sort_records(&records, spec, LendingMode::Lend)), vec!["plain", "boosted"]);
        assert_eq!(symbols(&sort_records(&records, spec, LendingMode::Borrow)), vec!["boosted", "plain"]);
    }

    #[test]
    fn test_unknown_field_keeps_order() {
        let spec: SortSpec = serde_json::from_str(r#"{"field":"VOLUME","direction":"descending"}"#).unwrap();
        assert_eq!(spec.field, SortField::Unknown);

        let records = vec![
            record("a", dec!(1), 0.01),
            record("b", dec!(3), 0.03),
            record("c", dec!(2), 0.02),
        ];
        assert_eq!(symbols(&sort_records(&records, spec, LendingMode::Lend)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_does_not_mutate_input() {
        let records = vec![record("a", dec!(1), 0.0), record("b", dec!(2), 0.0)];
        let _ = sort_records(&records, SortSpec::new(SortField::Tvl, SortDirection::Descending), LendingMode::Lend);
        assert_eq!(symbols(&records), vec!["a", "b"]);
    }

    #[test]
    fn test_sort_spec_parse() {
        assert_eq!(SortSpec::parse("APY_DESC"), Some(SortSpec::new(SortField::Apy, SortDirection::Descending)));
        assert_eq!(SortSpec::parse("tvl-asc"), Some(SortSpec::new(SortField::Tvl, SortDirection::Ascending)));
        assert_eq!(SortSpec::parse("tvl"), Some(SortSpec::new(SortField::Tvl, SortDirection::Descending)));
        assert_eq!(SortSpec::parse("volume_desc"), None);
    }

    #[test]
    fn test_sort_cycle_returns_to_unsorted() {
        let mut current = None;
        let mut labels = Vec::new();
        for _ in 0..5 {
            current = next_sort(current);
            labels.push(current.map(|s| s.label()).unwrap_or("NONE"));
        }
        assert_eq!(labels, vec!["APY ↓", "APY ↑", "TVL ↓", "TVL ↑", "NONE"]);
    }

    #[test]
    fn test_hotkey_ranking_uses_usd_tvl_and_skips_isolated() {
        let mut sol = record("SOL", dec!(1000), 0.0);
        sol.price = dec!(150);
        let usdc = record("USDC", dec!(100000), 0.0);
        let mut xyz = record("XYZ", dec!(99999999), 0.0);
        xyz.category = PoolCategory::Isolated;

        assert_eq!(hotkey_ranking(&[usdc, xyz, sol]), vec!["SOL".to_string(), "USDC".to_string()]);
    }
}
