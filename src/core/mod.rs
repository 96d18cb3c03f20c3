//! Core domain types and calculations
//!
//! - `decimal`: canonical 8-digit decimal policy
//! - `Magnitude`: scientific-notation decimal for products beyond `Decimal`'s range
//! - `Symbol`, `Transaction`, `Instrument`: the market model
//! - `NthRootSolver`: Newton iteration for the market index
//! - `Registry`: concurrent symbol → instrument store

pub mod decimal;
pub mod instrument;
pub mod magnitude;
pub mod nth_root;
pub mod registry;
pub mod symbol;
pub mod transaction;

pub use instrument::{Instrument, Kind};
pub use magnitude::Magnitude;
pub use nth_root::{NthRootSolver, RootError};
pub use registry::{Registry, SharedInstrument};
pub use symbol::Symbol;
pub use transaction::{Side, Transaction};
