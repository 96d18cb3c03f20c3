//! Stocks and their per-instrument metrics
//!
//! An `Instrument` carries static financial parameters, a dividend `Kind`
//! and an append-only list of trades. Metrics return `None` when they are
//! undefined for the given inputs.

use super::decimal::{self, canonicalize, is_positive};
use super::{Symbol, Transaction};
use crate::ValidationError;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

/// Dividend model of an instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Pays a fixed amount each period
    Common { dividend_per_period: Decimal },
    /// Pays a fixed fraction of par value each period
    Preferred { fixed_dividend_rate: Decimal },
}

impl Kind {
    pub fn common(dividend_per_period: Decimal) -> Result<Self, ValidationError> {
        if is_negative(dividend_per_period) {
            return Err(ValidationError::InvalidDividendAttribute(dividend_per_period));
        }
        Ok(Self::Common {
            dividend_per_period: canonicalize(dividend_per_period),
        })
    }

    pub fn preferred(fixed_dividend_rate: Decimal) -> Result<Self, ValidationError> {
        if !is_positive(fixed_dividend_rate) {
            return Err(ValidationError::InvalidDividendAttribute(fixed_dividend_rate));
        }
        Ok(Self::Preferred {
            fixed_dividend_rate: canonicalize(fixed_dividend_rate),
        })
    }

    /// Dividend per period (common) or fixed dividend rate (preferred)
    #[inline]
    pub fn dividend_attribute(&self) -> Decimal {
        match self {
            Self::Common { dividend_per_period } => *dividend_per_period,
            Self::Preferred { fixed_dividend_rate } => *fixed_dividend_rate,
        }
    }

    #[inline(always)]
    pub const fn is_preferred(&self) -> bool {
        matches!(self, Self::Preferred { .. })
    }

    /// Re-check the attribute against the kind's rule and canonicalize it
    pub fn validated(self) -> Result<Self, ValidationError> {
        match self {
            Self::Common { dividend_per_period } => Self::common(dividend_per_period),
            Self::Preferred { fixed_dividend_rate } => Self::preferred(fixed_dividend_rate),
        }
    }

    /// Same kind with a new attribute, `None` if the kind's rule rejects it
    fn with_attribute(self, value: Decimal) -> Option<Self> {
        match self {
            Self::Common { .. } => Self::common(value).ok(),
            Self::Preferred { .. } => Self::preferred(value).ok(),
        }
    }
}

/// A tradable stock
#[derive(Debug, Clone)]
pub struct Instrument {
    symbol: Symbol,
    par_value: Decimal,
    last_annual_dividend: Decimal,
    periods_per_year: u32,
    kind: Kind,
    transactions: Vec<Transaction>,
}

impl Instrument {
    /// Build an instrument, validating every field.
    pub fn new(
        symbol: &str,
        par_value: Decimal,
        last_annual_dividend: Decimal,
        periods_per_year: u32,
        kind: Kind,
    ) -> Result<Self, ValidationError> {
        let symbol = Symbol::parse(symbol)?;
        if is_negative(par_value) {
            return Err(ValidationError::Negative {
                field: "par value",
                value: par_value,
            });
        }
        if is_negative(last_annual_dividend) {
            return Err(ValidationError::Negative {
                field: "last annual dividend",
                value: last_annual_dividend,
            });
        }
        if periods_per_year == 0 {
            return Err(ValidationError::NonPositivePeriods);
        }
        let kind = kind.validated()?;

        Ok(Self {
            symbol,
            par_value: canonicalize(par_value),
            last_annual_dividend: canonicalize(last_annual_dividend),
            periods_per_year,
            kind,
            transactions: Vec::new(),
        })
    }

    /// Common stock paying `dividend_per_period` each period
    pub fn common(
        symbol: &str,
        par_value: Decimal,
        last_annual_dividend: Decimal,
        periods_per_year: u32,
        dividend_per_period: Decimal,
    ) -> Result<Self, ValidationError> {
        Self::new(
            symbol,
            par_value,
            last_annual_dividend,
            periods_per_year,
            Kind::Common { dividend_per_period },
        )
    }

    /// Preferred stock paying `fixed_dividend_rate` of par each period
    pub fn preferred(
        symbol: &str,
        par_value: Decimal,
        last_annual_dividend: Decimal,
        periods_per_year: u32,
        fixed_dividend_rate: Decimal,
    ) -> Result<Self, ValidationError> {
        Self::new(
            symbol,
            par_value,
            last_annual_dividend,
            periods_per_year,
            Kind::Preferred { fixed_dividend_rate },
        )
    }

    #[inline(always)]
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    #[inline(always)]
    pub fn par_value(&self) -> Decimal {
        self.par_value
    }

    #[inline(always)]
    pub fn last_annual_dividend(&self) -> Decimal {
        self.last_annual_dividend
    }

    #[inline(always)]
    pub fn periods_per_year(&self) -> u32 {
        self.periods_per_year
    }

    #[inline(always)]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[inline]
    pub fn dividend_attribute(&self) -> Decimal {
        self.kind.dividend_attribute()
    }

    /// Trades in the order they were appended
    #[inline]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    // Setters keep the previous value when the new one is out of policy
    // and report whether the value was applied.

    pub fn set_par_value(&mut self, par_value: Decimal) -> bool {
        if is_negative(par_value) {
            return false;
        }
        self.par_value = canonicalize(par_value);
        true
    }

    pub fn set_last_annual_dividend(&mut self, last_annual_dividend: Decimal) -> bool {
        if is_negative(last_annual_dividend) {
            return false;
        }
        self.last_annual_dividend = canonicalize(last_annual_dividend);
        true
    }

    pub fn set_periods_per_year(&mut self, periods_per_year: u32) -> bool {
        if periods_per_year == 0 {
            return false;
        }
        self.periods_per_year = periods_per_year;
        true
    }

    pub fn set_dividend_attribute(&mut self, value: Decimal) -> bool {
        match self.kind.with_attribute(value) {
            Some(kind) => {
                self.kind = kind;
                true
            }
            None => false,
        }
    }

    /// Append a trade; no ordering or duplicate checks.
    #[inline]
    pub fn add_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    /// Annual dividend the kind pays at the current parameters, unrounded
    ///
    /// Common: dividend per period * periods per year.
    /// Preferred: rate * par value * periods per year.
    fn annual_dividend(&self) -> Option<Decimal> {
        let periods = Decimal::from(self.periods_per_year);
        match self.kind {
            Kind::Common { dividend_per_period } => dividend_per_period.checked_mul(periods),
            Kind::Preferred { fixed_dividend_rate } => fixed_dividend_rate
                .checked_mul(self.par_value)?
                .checked_mul(periods),
        }
    }

    /// Annual dividend, canonicalized
    pub fn current_dividend(&self) -> Option<Decimal> {
        self.annual_dividend().map(canonicalize)
    }

    /// Dividend yield at `price`, `None` unless the price is strictly positive
    pub fn dividend_yield(&self, price: Decimal) -> Option<Decimal> {
        if !is_positive(price) {
            return None;
        }
        let dividend = match self.kind {
            Kind::Common { .. } => self.last_annual_dividend,
            Kind::Preferred { .. } => self.annual_dividend()?,
        };
        decimal::divide(dividend, price)
    }

    /// Price / earnings ratio, `None` unless the current dividend is strictly
    /// positive. The price itself is not range-checked.
    pub fn pe_ratio(&self, price: Decimal) -> Option<Decimal> {
        let dividend = self.annual_dividend()?;
        decimal::divide(price, dividend)
    }

    /// Volume-weighted price over the trailing `window_minutes`, as of now
    pub fn volume_weighted_price(&self, window_minutes: u32) -> Option<Decimal> {
        self.volume_weighted_price_at(window_minutes, OffsetDateTime::now_utc())
    }

    /// Volume-weighted price over trades strictly inside
    /// `(now - window_minutes, now)`.
    pub fn volume_weighted_price_at(
        &self,
        window_minutes: u32,
        now: OffsetDateTime,
    ) -> Option<Decimal> {
        let window_start = now - Duration::minutes(i64::from(window_minutes));

        let mut total_price_quantity = Decimal::ZERO;
        let mut total_quantity = Decimal::ZERO;
        for trade in self
            .transactions
            .iter()
            .filter(|t| t.timestamp() > window_start && t.timestamp() < now)
        {
            total_price_quantity = decimal::add(total_price_quantity, trade.notional()?)?;
            total_quantity = total_quantity.checked_add(Decimal::from(trade.quantity()))?;
        }

        if total_price_quantity.is_zero() || total_quantity.is_zero() {
            return None;
        }
        decimal::divide(total_price_quantity, total_quantity)
    }
}

#[inline(always)]
fn is_negative(value: Decimal) -> bool {
    value < Decimal::ZERO
}
