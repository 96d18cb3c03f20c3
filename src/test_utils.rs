//! Shared fixtures for unit tests
//!
//! Instruments mirror the default seed list; trades are timestamped relative
//! to a fixed `NOW` so window tests are deterministic.

use crate::core::{Instrument, Side, Symbol, Transaction};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

/// Reference clock for window calculations
pub const NOW: OffsetDateTime = datetime!(2015-11-24 16:40:00 UTC);

/// Common, pays nothing
pub fn tea() -> Instrument {
    Instrument::common("TEA", dec!(100), dec!(0), 1, dec!(0)).unwrap()
}

/// Common, last dividend 8
pub fn pop() -> Instrument {
    Instrument::common("POP", dec!(100), dec!(8), 1, dec!(8)).unwrap()
}

/// Preferred, 2% of par quarterly
pub fn gin() -> Instrument {
    Instrument::preferred("GIN", dec!(100), dec!(8), 4, dec!(0.02)).unwrap()
}

/// Trade executed `minutes_ago` before `NOW`
pub fn trade_minutes_ago(
    symbol: &str,
    minutes_ago: i64,
    quantity: u64,
    side: Side,
    price: Decimal,
) -> Transaction {
    Transaction::new(
        Symbol::parse(symbol).unwrap(),
        NOW - Duration::minutes(minutes_ago),
        quantity,
        side,
        price,
    )
    .unwrap()
}
