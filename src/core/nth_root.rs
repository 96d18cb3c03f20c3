//! Newton's method for integer roots in exact decimal arithmetic
//!
//! Solves `x^n = base` with the iteration
//! `x' = ((n - 1) * x + base / x^(n - 1)) / n`, starting from `base / n`
//! and rounding to the canonical scale after every step. Stops once two
//! successive iterates are within `10^-8` of each other. At least one step
//! is always taken for `n > 1`.
//!
//! From far above the root each step only shrinks the iterate by about
//! `(n - 1) / n`. The start is therefore capped at `10^ceil((e + 1) / n)`,
//! where `e` is the decimal exponent of the base; that bound is never below
//! the root and at most about a decade above it. The cap also replaces a
//! `base / n` that rounds to zero.

use super::decimal::{canonicalize, EPSILON, SCALE};
use super::Magnitude;
use rust_decimal::Decimal;

/// Solver failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RootError {
    #[error("root degree must be at least 1")]
    ZeroDegree,
    #[error("root base must be strictly positive")]
    NonPositiveBase,
    #[error("root did not converge after {iterations} iterations")]
    NotConverged { iterations: u64 },
    #[error("root exceeds the decimal range")]
    OutOfRange,
}

/// Iterative n-th root to a fixed absolute precision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthRootSolver {
    max_iterations: u64,
}

impl NthRootSolver {
    /// Default iteration ceiling
    pub const DEFAULT_MAX_ITERATIONS: u64 = 1_000_000;

    /// Absolute stopping tolerance (10^-8)
    pub const PRECISION: Decimal = EPSILON;

    pub fn new(max_iterations: u64) -> Self {
        Self { max_iterations }
    }

    #[inline(always)]
    pub fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    /// `base^(1/n)` for a plain decimal base
    pub fn solve_decimal(&self, n: u64, base: Decimal) -> Result<Decimal, RootError> {
        self.solve(n, Magnitude::from(base))
    }

    /// `base^(1/n)`, canonicalized.
    ///
    /// The base may exceed `Decimal`'s range; the root must not.
    pub fn solve(&self, n: u64, base: Magnitude) -> Result<Decimal, RootError> {
        if n == 0 {
            return Err(RootError::ZeroDegree);
        }
        if !base.is_positive() {
            return Err(RootError::NonPositiveBase);
        }

        if n == 1 {
            return base
                .canonical()
                .to_decimal()
                .map(canonicalize)
                .ok_or(RootError::OutOfRange);
        }

        let degree = Magnitude::from(n);
        let degree_minus_one = Magnitude::from(n - 1);
        let precision = Magnitude::from(Self::PRECISION);

        let mut curr = initial_guess(base, degree, n)?;
        let mut iterations = 0u64;

        loop {
            if iterations >= self.max_iterations() {
                tracing::warn!(n, iterations, "nth root did not converge");
                return Err(RootError::NotConverged { iterations });
            }
            let prev = curr;
            let quotient = step(base.checked_div(curr.powi(n - 1)))?;
            let numerator = degree_minus_one.mul(curr).add(quotient);
            curr = step(numerator.checked_div(degree))?;
            iterations += 1;

            if curr.sub(prev).abs() <= precision {
                break;
            }
        }

        tracing::trace!(n, iterations, "nth root converged");
        curr.to_decimal()
            .map(canonicalize)
            .ok_or(RootError::OutOfRange)
    }
}

impl Default for NthRootSolver {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ITERATIONS)
    }
}

/// `base / n`, capped at the decade bound on the root.
fn initial_guess(base: Magnitude, degree: Magnitude, n: u64) -> Result<Magnitude, RootError> {
    let bound = root_upper_bound(base, n);
    let guess = base
        .checked_div(degree)
        .ok_or(RootError::OutOfRange)?
        .canonical();
    if guess.is_positive() && guess <= bound {
        Ok(guess)
    } else {
        Ok(bound)
    }
}

/// Power of ten at or above `base^(1/n)`, never below `10^-8`.
///
/// `base < 10^(e + 1)`, so `base^(1/n) < 10^((e + 1) / n)`.
fn root_upper_bound(base: Magnitude, n: u64) -> Magnitude {
    let n = i64::try_from(n).unwrap_or(i64::MAX);
    let decades = base.exponent() + 1;
    let exponent = decades.div_euclid(n) + i64::from(decades.rem_euclid(n) != 0);
    Magnitude::power_of_ten(exponent.max(-(SCALE as i64)))
}

/// Canonicalize an iterate. An iterate that rounds to zero is lifted to the
/// smallest positive canonical value so the next division stays defined;
/// Newton's step from below lands above the root and descends from there.
#[inline]
fn step(value: Option<Magnitude>) -> Result<Magnitude, RootError> {
    let value = value.ok_or(RootError::OutOfRange)?.canonical();
    if value.is_positive() {
        Ok(value)
    } else {
        Ok(Magnitude::from(EPSILON))
    }
}
