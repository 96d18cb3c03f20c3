//! Concurrent instrument registry
//!
//! Maps symbols to instruments. Map operations (insert, remove, lookup) are
//! atomic per key through `DashMap`'s sharded locks. Each instrument sits
//! behind its own `RwLock`, so mutations of one symbol serialize with each
//! other while different symbols never block one another.
//!
//! Mutations are applied while the map entry is still held, so an
//! instrument that has been removed is never written through the registry.

use super::nth_root::{NthRootSolver, RootError};
use super::{Instrument, Magnitude, Symbol, Transaction};
use crate::infrastructure::config::{Config, EngineConfig};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Instrument handle shared between the registry and its callers
pub type SharedInstrument = Arc<RwLock<Instrument>>;

/// Symbol → instrument store with the cross-instrument index
pub struct Registry {
    instruments: DashMap<Symbol, SharedInstrument>,
    solver: NthRootSolver,
}

impl Registry {
    /// Empty registry with the default root solver
    pub fn new() -> Self {
        Self::with_solver(NthRootSolver::default())
    }

    pub fn with_solver(solver: NthRootSolver) -> Self {
        Self {
            instruments: DashMap::new(),
            solver,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_solver(NthRootSolver::new(config.max_root_iterations))
    }

    /// Validate `config` and register every configured instrument.
    pub fn bootstrap(config: &Config) -> crate::Result<Self> {
        config.validate()?;
        let registry = Self::from_config(&config.engine);
        for seed in &config.instruments {
            registry.add_instrument(seed.build()?);
        }
        tracing::info!(instruments = registry.len(), "registry bootstrapped");
        Ok(registry)
    }

    /// Insert unless the symbol is already taken. Returns whether it was inserted.
    pub fn add_instrument(&self, instrument: Instrument) -> bool {
        let symbol = instrument.symbol();
        match self.instruments.entry(symbol) {
            Entry::Occupied(_) => {
                tracing::warn!(%symbol, "instrument already registered");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(RwLock::new(instrument)));
                tracing::debug!(%symbol, "instrument added");
                true
            }
        }
    }

    /// Remove if present. Returns whether something was removed.
    pub fn remove_instrument(&self, symbol: &str) -> bool {
        let removed = key(symbol)
            .and_then(|symbol| self.instruments.remove(&symbol))
            .is_some();
        if removed {
            tracing::debug!(symbol, "instrument removed");
        }
        removed
    }

    /// Shared handle to the instrument, `None` for unknown symbols
    pub fn get_instrument(&self, symbol: &str) -> Option<SharedInstrument> {
        let symbol = key(symbol)?;
        self.instruments.get(&symbol).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        key(symbol).is_some_and(|symbol| self.instruments.contains_key(&symbol))
    }

    /// Append a trade to the instrument registered under `symbol`.
    pub fn add_transaction(&self, symbol: &str, transaction: Transaction) -> bool {
        self.mutate(symbol, |instrument| {
            instrument.add_transaction(transaction);
            true
        })
    }

    pub fn set_last_annual_dividend(&self, symbol: &str, value: Decimal) -> bool {
        self.mutate(symbol, |instrument| instrument.set_last_annual_dividend(value))
    }

    pub fn set_periods_per_year(&self, symbol: &str, periods_per_year: u32) -> bool {
        self.mutate(symbol, |instrument| {
            instrument.set_periods_per_year(periods_per_year)
        })
    }

    /// Dividend per period (common) or fixed dividend rate (preferred)
    pub fn set_dividend_attribute(&self, symbol: &str, value: Decimal) -> bool {
        self.mutate(symbol, |instrument| instrument.set_dividend_attribute(value))
    }

    /// Run `f` under the instrument's write lock while its map entry is held.
    ///
    /// Returns whether the instrument exists. A value the instrument rejects
    /// is a silent no-op and still reports `true`.
    fn mutate<F>(&self, symbol: &str, f: F) -> bool
    where
        F: FnOnce(&mut Instrument) -> bool,
    {
        let Some(entry) = key(symbol).and_then(|symbol| self.instruments.get(&symbol)) else {
            tracing::warn!(symbol, "mutation addressed at unknown instrument");
            return false;
        };
        if f(&mut entry.value().write()) {
            tracing::debug!(symbol, "mutation applied");
        } else {
            tracing::debug!(symbol, "mutation ignored by instrument policy");
        }
        true
    }

    /// Run `f` under the instrument's read lock
    fn read<T>(&self, symbol: &str, f: impl FnOnce(&Instrument) -> Option<T>) -> Option<T> {
        let entry = self.instruments.get(&key(symbol)?)?;
        let instrument = entry.value().read();
        f(&instrument)
    }

    pub fn dividend_yield(&self, symbol: &str, price: Decimal) -> Option<Decimal> {
        self.read(symbol, |instrument| instrument.dividend_yield(price))
    }

    pub fn pe_ratio(&self, symbol: &str, price: Decimal) -> Option<Decimal> {
        self.read(symbol, |instrument| instrument.pe_ratio(price))
    }

    pub fn volume_weighted_price(&self, symbol: &str, window_minutes: u32) -> Option<Decimal> {
        self.read(symbol, |instrument| {
            instrument.volume_weighted_price(window_minutes)
        })
    }

    /// Geometric mean of every strictly positive trade price across all
    /// instruments; `None` when there is none or the solver fails.
    pub fn market_index(&self) -> Option<Decimal> {
        match self.try_market_index() {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(error = %e, "market index computation failed");
                None
            }
        }
    }

    /// Like [`Registry::market_index`] but surfaces solver failures.
    ///
    /// The full product is accumulated before the root is taken; nothing is
    /// rounded to the canonical scale per multiplication.
    pub fn try_market_index(&self) -> Result<Option<Decimal>, RootError> {
        let mut count = 0u64;
        let mut product = Magnitude::ONE;
        for entry in self.instruments.iter() {
            let instrument = entry.value().read();
            for trade in instrument.transactions() {
                if trade.price() > Decimal::ZERO {
                    product = product.mul(Magnitude::from(trade.price()));
                    count += 1;
                }
            }
        }

        if count == 0 || !product.is_positive() {
            return Ok(None);
        }
        let index = self.solver.solve(count, product)?;
        tracing::info!(trades = count, %index, "market index computed");
        Ok(Some(index))
    }

    /// Remove every instrument. Returns whether the registry is now empty.
    pub fn clear(&self) -> bool {
        self.instruments.clear();
        self.instruments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Registered symbols, sorted
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.instruments.iter().map(|e| *e.key()).collect();
        symbols.sort_unstable();
        symbols
    }

    /// Trades recorded across all instruments
    pub fn transaction_count(&self) -> usize {
        self.instruments
            .iter()
            .map(|e| e.value().read().transactions().len())
            .sum()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Map key for a caller-supplied symbol; malformed symbols are never present.
#[inline]
fn key(symbol: &str) -> Option<Symbol> {
    Symbol::from_bytes(symbol.as_bytes())
}
