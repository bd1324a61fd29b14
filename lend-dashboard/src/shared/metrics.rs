//! Per-market display metrics for the asset table
//!
//! Every function here is pure and total: an absent record degrades to neutral defaults, and
//! arithmetic that would leave `Decimal`'s range saturates or falls back instead of panicking.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use crate::shared::format;
use crate::shared::types::{Emissions, LendingMode, MarketRecord};

/// Weight cell shown when an asset cannot be used as collateral.
/// Downstream rendering compares against this exact string.
pub const NO_WEIGHT: &str = "-";

/// Fraction of capacity at which a pool counts as full
pub const FILLED_THRESHOLD: Decimal = dec!(0.99999);

/// Fraction of capacity at which a pool is flagged as nearly full
pub const HIGH_THRESHOLD: Decimal = dec!(0.9);

/// Display-ready metrics for one market in one mode
#[derive(Debug, Clone, PartialEq)]
pub struct AssetMetrics {
    /// Base rate plus matching emissions, formatted as a percentage
    pub effective_rate: String,
    /// Collateral weight (lending) or LTV (borrowing), or [`NO_WEIGHT`]
    pub weight: String,
    /// Deposit or borrow cap in token units
    pub capacity: Decimal,
    pub is_filled: bool,
    pub is_high: bool,
}

impl Default for AssetMetrics {
    fn default() -> Self {
        Self {
            effective_rate: format::percent(0.0),
            weight: NO_WEIGHT.to_string(),
            capacity: Decimal::ZERO,
            is_filled: false,
            is_high: false,
        }
    }
}

/// Derive the table metrics of `record` for `mode`
pub fn derive(record: Option<&MarketRecord>, mode: LendingMode) -> AssetMetrics {
    let Some(record) = record else {
        return AssetMetrics::default();
    };

    let capacity = capacity(record, mode);
    let total = relevant_total(record, mode);

    AssetMetrics {
        effective_rate: format::percent(effective_rate_value(record, mode)),
        weight: weight(record, mode),
        capacity,
        is_filled: total >= capacity.saturating_mul(FILLED_THRESHOLD),
        is_high: total >= capacity.saturating_mul(HIGH_THRESHOLD),
    }
}

/// Raw effective rate: base rate for the mode plus emissions iff they target that mode
pub fn effective_rate_value(record: &MarketRecord, mode: LendingMode) -> f64 {
    let state = &record.state;
    let (base, emissions_side) = match mode {
        LendingMode::Lend => (state.lending_rate, Emissions::Lending),
        LendingMode::Borrow => (state.borrowing_rate, Emissions::Borrowing),
    };

    if state.emissions == emissions_side {
        base + state.emissions_rate
    } else {
        base
    }
}

/// Initial asset weight at the current price
///
/// Once the USD value of deposits exceeds `total_asset_value_init_limit`, the weight is
/// discounted proportionally so the pool's collateral value stays capped at the limit.
pub fn initial_asset_weight(record: &MarketRecord) -> Decimal {
    let config = &record.config;
    let limit = config.total_asset_value_init_limit;
    if limit.is_zero() {
        return config.asset_weight_init;
    }

    let deposits_value = tvl_usd(record);
    if deposits_value <= limit {
        return config.asset_weight_init;
    }

    // limit / value < 1, so the product cannot exceed the configured weight
    limit
        .checked_div(deposits_value)
        .and_then(|ratio| config.asset_weight_init.checked_mul(ratio))
        .unwrap_or(config.asset_weight_init)
}

fn weight(record: &MarketRecord, mode: LendingMode) -> String {
    let weight = match mode {
        LendingMode::Lend => Some(initial_asset_weight(record)),
        LendingMode::Borrow => {
            let liability_weight = record.config.liability_weight_init;
            if liability_weight <= Decimal::ZERO {
                None
            } else {
                Decimal::ONE.checked_div(liability_weight)
            }
        }
    };

    match weight {
        // A weight whose percentage overflows has no meaningful cell either
        Some(weight) if weight > Decimal::ZERO && weight.checked_mul(Decimal::ONE_HUNDRED).is_some() => {
            format::whole_percent(weight)
        }
        _ => NO_WEIGHT.to_string(),
    }
}

/// Deposit (lending) or borrow (borrowing) cap scaled from raw units to token units
pub fn capacity(record: &MarketRecord, mode: LendingMode) -> Decimal {
    let raw = match mode {
        LendingMode::Lend => record.config.deposit_limit,
        LendingMode::Borrow => record.config.borrow_limit,
    };
    scale_down(raw, record.decimals)
}

/// Divide a raw on-chain amount by `10^decimals`
///
/// Scales beyond what `Decimal` can represent collapse to zero.
pub fn scale_down(raw: Decimal, decimals: u8) -> Decimal {
    Decimal::TEN
        .checked_powu(u64::from(decimals))
        .and_then(|factor| raw.checked_div(factor))
        .unwrap_or(Decimal::ZERO)
}

fn relevant_total(record: &MarketRecord, mode: LendingMode) -> Decimal {
    match mode {
        LendingMode::Lend => record.state.total_deposits,
        LendingMode::Borrow => record.state.total_borrows,
    }
}

/// Share of deposits currently borrowed, 0 when the pool is empty
pub fn utilization(record: &MarketRecord) -> Decimal {
    let deposits = record.state.total_deposits;
    if deposits.is_zero() {
        return Decimal::ZERO;
    }
    record
        .state
        .total_borrows
        .checked_div(deposits)
        .unwrap_or(Decimal::MAX)
}

/// Tokens still borrowable: deposits bounded by the borrow cap, minus outstanding borrows
pub fn available_liquidity(record: &MarketRecord) -> Decimal {
    let cap = capacity(record, LendingMode::Borrow);
    let available = record.state.total_deposits.min(cap) - record.state.total_borrows;
    available.max(Decimal::ZERO)
}

/// Total value locked in USD, saturating at `Decimal::MAX`
pub fn tvl_usd(record: &MarketRecord) -> Decimal {
    record.state.total_deposits.saturating_mul(record.price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::{BankConfig, BankState};

    fn usdc() -> MarketRecord {
        MarketRecord {
            symbol: "USDC".to_string(),
            decimals: 6,
            price: dec!(1),
            config: BankConfig {
                asset_weight_init: dec!(0.9),
                liability_weight_init: dec!(1.25),
                deposit_limit: dec!(1000000000000), // 1,000,000 USDC
                borrow_limit: dec!(500000000000),   // 500,000 USDC
                total_asset_value_init_limit: Decimal::ZERO,
            },
            state: BankState {
                total_deposits: dec!(400000),
                total_borrows: dec!(250000),
                lending_rate: 0.04,
                borrowing_rate: 0.07,
                emissions_rate: 0.02,
                emissions: Emissions::Lending,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_effective_rate_adds_matching_emissions() {
        struct TestCase {
            emissions: Emissions,
            mode: LendingMode,
            expected: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0: lending emissions count while lending
                emissions: Emissions::Lending,
                mode: LendingMode::Lend,
                expected: "6.00%",
            },
            TestCase {
                // TC1: lending emissions ignored while borrowing
                emissions: Emissions::Lending,
                mode: LendingMode::Borrow,
                expected: "7.00%",
            },
            TestCase {
                // TC2: borrowing emissions count while borrowing
                emissions: Emissions::Borrowing,
                mode: LendingMode::Borrow,
                expected: "9.00%",
            },
            TestCase {
                // TC3: no emissions
                emissions: Emissions::None,
                mode: LendingMode::Lend,
                expected: "4.00%",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let mut record = usdc();
            record.state.emissions = test.emissions;
            let actual = derive(Some(&record), test.mode).effective_rate;
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_weight_lending_and_borrowing() {
        let record = usdc();
        assert_eq!(derive(Some(&record), LendingMode::Lend).weight, "90%");
        assert_eq!(derive(Some(&record), LendingMode::Borrow).weight, "80%");
    }

    #[test]
    fn test_non_positive_weight_is_sentinel() {
        let mut record = usdc();
        record.config.asset_weight_init = Decimal::ZERO;
        assert_eq!(derive(Some(&record), LendingMode::Lend).weight, NO_WEIGHT);

        record.config.asset_weight_init = dec!(-0.5);
        assert_eq!(derive(Some(&record), LendingMode::Lend).weight, "-");

        record.config.liability_weight_init = Decimal::ZERO;
        assert_eq!(derive(Some(&record), LendingMode::Borrow).weight, "-");
    }

    #[test]
    fn test_initial_asset_weight_discounted_above_value_limit() {
        let mut record = usdc();
        // $400k deposited against a $200k limit halves the weight
        record.config.total_asset_value_init_limit = dec!(200000);
        assert_eq!(initial_asset_weight(&record), dec!(0.45));
        assert_eq!(derive(Some(&record), LendingMode::Lend).weight, "45%");

        record.config.total_asset_value_init_limit = dec!(1000000);
        assert_eq!(initial_asset_weight(&record), dec!(0.9));
    }

    #[test]
    fn test_capacity_scaled_by_decimals() {
        let record = usdc();
        assert_eq!(capacity(&record, LendingMode::Lend), dec!(1000000));
        assert_eq!(capacity(&record, LendingMode::Borrow), dec!(500000));
        assert_eq!(derive(Some(&record), LendingMode::Lend).capacity, dec!(1000000));
    }

    #[test]
    fn test_scale_down_out_of_range_decimals() {
        assert_eq!(scale_down(dec!(12345), 0), dec!(12345));
        assert_eq!(scale_down(dec!(1000000000), 9), dec!(1));
        assert_eq!(scale_down(dec!(1), 200), Decimal::ZERO);
    }

    #[test]
    fn test_utilization_flags() {
        struct TestCase {
            total_deposits: Decimal,
            expected_filled: bool,
            expected_high: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: 40% utilised
                total_deposits: dec!(400000),
                expected_filled: false,
                expected_high: false,
            },
            TestCase {
                // TC1: exactly 90% is high
                total_deposits: dec!(900000),
                expected_filled: false,
                expected_high: true,
            },
            TestCase {
                // TC2: just under the fill threshold
                total_deposits: dec!(999989),
                expected_filled: false,
                expected_high: true,
            },
            TestCase {
                // TC3: within rounding of the cap is filled
                total_deposits: dec!(999990),
                expected_filled: true,
                expected_high: true,
            },
            TestCase {
                // TC4: over the cap
                total_deposits: dec!(1200000),
                expected_filled: true,
                expected_high: true,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let mut record = usdc();
            record.state.total_deposits = test.total_deposits;
            let metrics = derive(Some(&record), LendingMode::Lend);
            assert_eq!(metrics.is_filled, test.expected_filled, "TC{} failed", index);
            assert_eq!(metrics.is_high, test.expected_high, "TC{} failed", index);
        }
    }

    #[test]
    fn test_filled_implies_high() {
        let totals = [dec!(0), dec!(1), dec!(250000), dec!(449999), dec!(450000), dec!(499995), dec!(500000), dec!(9000000)];
        for mode in [LendingMode::Lend, LendingMode::Borrow] {
            for total in totals {
                let mut record = usdc();
                record.state.total_deposits = total;
                record.state.total_borrows = total;
                let metrics = derive(Some(&record), mode);
                assert!(!metrics.is_filled || metrics.is_high, "{mode} total {total}");
            }
        }
    }

    #[test]
    fn test_extreme_values_stay_in_range() {
        struct TestCase {
            record: MarketRecord,
            mode: LendingMode,
            expected_weight: &'static str,
            expected_tvl: Decimal,
            expected_utilization: Decimal,
        }

        let huge = dec!(1000000000000000000000); // 1e21
        let tiny = dec!(0.0000000000000000000000000001); // 1e-28

        let tests = vec![
            TestCase {
                // TC0: deposit value past Decimal::MAX saturates
                record: MarketRecord {
                    price: dec!(100000000000),
                    state: BankState { total_deposits: huge, total_borrows: dec!(0), ..usdc().state },
                    ..usdc()
                },
                mode: LendingMode::Lend,
                expected_weight: "90%",
                expected_tvl: Decimal::MAX,
                expected_utilization: dec!(0),
            },
            TestCase {
                // TC1: saturated value still discounts against the value limit
                record: MarketRecord {
                    price: dec!(100000000000),
                    config: BankConfig { total_asset_value_init_limit: dec!(200000), ..usdc().config },
                    state: BankState { total_deposits: huge, total_borrows: dec!(0), ..usdc().state },
                    ..usdc()
                },
                mode: LendingMode::Lend,
                expected_weight: "0%",
                expected_tvl: Decimal::MAX,
                expected_utilization: dec!(0),
            },
            TestCase {
                // TC2: 1 / liability weight fits but its percentage does not
                record: MarketRecord {
                    config: BankConfig { liability_weight_init: tiny, ..usdc().config },
                    ..usdc()
                },
                mode: LendingMode::Borrow,
                expected_weight: NO_WEIGHT,
                expected_tvl: dec!(400000),
                expected_utilization: dec!(0.625),
            },
            TestCase {
                // TC3: asset weight above one renders as is
                record: MarketRecord {
                    config: BankConfig { asset_weight_init: dec!(2), ..usdc().config },
                    ..usdc()
                },
                mode: LendingMode::Lend,
                expected_weight: "200%",
                expected_tvl: dec!(400000),
                expected_utilization: dec!(0.625),
            },
            TestCase {
                // TC4: asset weight whose percentage overflows
                record: MarketRecord {
                    config: BankConfig { asset_weight_init: dec!(1000000000000000000000000000), ..usdc().config },
                    ..usdc()
                },
                mode: LendingMode::Lend,
                expected_weight: NO_WEIGHT,
                expected_tvl: dec!(400000),
                expected_utilization: dec!(0.625),
            },
            TestCase {
                // TC5: borrows dwarfing dust deposits
                record: MarketRecord {
                    state: BankState { total_deposits: tiny, total_borrows: huge, ..usdc().state },
                    ..usdc()
                },
                mode: LendingMode::Borrow,
                expected_weight: "80%",
                expected_tvl: tiny,
                expected_utilization: Decimal::MAX,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert!(test.record.validate().is_ok(), "TC{} failed", index);
            let metrics = derive(Some(&test.record), test.mode);
            assert_eq!(metrics.weight, test.expected_weight, "TC{} failed", index);
            assert_eq!(tvl_usd(&test.record), test.expected_tvl, "TC{} failed", index);
            assert_eq!(utilization(&test.record), test.expected_utilization, "TC{} failed", index);
        }
    }

    #[test]
    fn test_borrow_ltv_ignores_asset_weight() {
        let mut record = usdc();
        record.config.asset_weight_init = Decimal::ZERO;
        assert_eq!(derive(Some(&record), LendingMode::Lend).weight, NO_WEIGHT);
        assert_eq!(derive(Some(&record), LendingMode::Borrow).weight, "80%");
    }

    #[test]
    fn test_absent_record_degrades_to_defaults() {
        let metrics = derive(None, LendingMode::Borrow);
        assert_eq!(metrics.effective_rate, "0.00%");
        assert_eq!(metrics.weight, NO_WEIGHT);
        assert_eq!(metrics.capacity, Decimal::ZERO);
        assert!(!metrics.is_filled);
        assert!(!metrics.is_high);
    }

    #[test]
    fn test_liquidity_helpers() {
        let record = usdc();
        assert_eq!(utilization(&record), dec!(0.625));
        assert_eq!(available_liquidity(&record), dec!(150000));
        assert_eq!(tvl_usd(&record), dec!(400000));

        let empty = MarketRecord::default();
        assert_eq!(utilization(&empty), Decimal::ZERO);
        assert_eq!(available_liquidity(&empty), Decimal::ZERO);
    }
}
