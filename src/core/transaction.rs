//! Trade records
//!
//! A `Transaction` is immutable once built. Construction validates quantity
//! and price and canonicalizes the price to 8 fractional digits.

use super::decimal::{canonicalize, is_positive};
use super::Symbol;
use crate::ValidationError;
use rust_decimal::Decimal;
use std::fmt;
use time::OffsetDateTime;

/// Trade side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    Buy = 1,
    Sell = 2,
}

impl Side {
    /// Parse the one-letter console code (`B` or `S`)
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "B" => Some(Self::Buy),
            "S" => Some(Self::Sell),
            _ => None,
        }
    }

    /// One-letter code
    #[inline(always)]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Buy => "B",
            Self::Sell => "S",
        }
    }

    #[inline(always)]
    pub const fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }

    #[inline(always)]
    pub const fn is_sell(&self) -> bool {
        matches!(self, Self::Sell)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One executed trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    symbol: Symbol,
    timestamp: OffsetDateTime,
    quantity: u64,
    side: Side,
    price: Decimal,
}

impl Transaction {
    /// Build a trade record.
    ///
    /// Quantity and price must be strictly positive. The positivity check
    /// runs on the price as given; the stored price is then rounded, so a
    /// sub-`10^-8` price is accepted and stored as zero.
    pub fn new(
        symbol: Symbol,
        timestamp: OffsetDateTime,
        quantity: u64,
        side: Side,
        price: Decimal,
    ) -> Result<Self, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::NonPositiveQuantity);
        }
        if !is_positive(price) {
            return Err(ValidationError::NonPositivePrice(price));
        }
        Ok(Self {
            symbol,
            timestamp,
            quantity,
            side,
            price: canonicalize(price),
        })
    }

    #[inline(always)]
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    #[inline(always)]
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    #[inline(always)]
    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    #[inline(always)]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline(always)]
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Notional value (price * quantity), `None` on overflow
    #[inline]
    pub fn notional(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}
