//! Line-oriented console over a registry
//!
//! One command per line, tokens separated by single spaces. The number of
//! tokens selects the command:
//!
//! | tokens | input                                   | reply                                  |
//! |--------|-----------------------------------------|----------------------------------------|
//! | 1      | (empty line)                            | `GBCE Index of All Stock: <v>`         |
//! | 1      | `SYM`                                   | `Volume Weighted Stock Price of SYM: <v>` |
//! | 2      | `SYM PRICE`                             | `P/E Ratio: <v>` / `Dividend Yield: <v>` |
//! | 5      | `SYM yyyy-MM-ddTHH:mm:ss QTY B\|S PRICE` | `Success.` / `Fail.`                   |
//! | 6      | `C\|P SYM PAR LAST_DIV PERIODS DIVIDEND` | `Success.` / `Fail.`                   |
//!
//! `EXIT` stops the loop. Absent metrics print `0`. Timestamps are UTC.

use crate::core::{Registry, Side, Symbol, Transaction};
use crate::infrastructure::config::{InstrumentSeed, SeedKind};
use crate::ValidationError;
use rust_decimal::Decimal;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use thiserror::Error;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Line that ends the session
pub const EXIT: &str = "EXIT";

/// Rejected console input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("Unrecognized Operation.")]
    Unrecognized,

    #[error("Invalid Price")]
    InvalidPrice,

    #[error("Invalid Quantity or Price")]
    InvalidQuantityOrPrice,

    #[error("Invalid Par Value, Last Annual Dividend, Period Per Year or Dividend Per Period")]
    InvalidInstrumentParameters,

    #[error("Invalid Buy/Sell Indicator {0:?}: expected B or S")]
    InvalidSide(String),

    #[error("Invalid Transaction Time {0:?}: expected yyyy-MM-ddTHH:mm:ss")]
    InvalidTimestamp(String),

    #[error("Invalid Stock Type {0:?}: expected C or P")]
    InvalidKind(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),
}

/// Parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Market-wide index
    Index,
    /// Volume-weighted price over the configured window
    VolumeWeightedPrice { symbol: String },
    /// P/E ratio and dividend yield at a price
    Valuation { symbol: String, price: Decimal },
    /// Record a trade
    Trade { symbol: String, transaction: Transaction },
    /// Register an instrument
    AddInstrument(InstrumentSeed),
    Exit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ConsoleError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line == EXIT {
            return Ok(Self::Exit);
        }

        let mut tokens: Vec<&str> = line.split(' ').collect();
        while tokens.len() > 1 && tokens.last().is_some_and(|t| t.is_empty()) {
            tokens.pop();
        }

        match tokens.as_slice() {
            [""] => Ok(Self::Index),
            [symbol] => Ok(Self::VolumeWeightedPrice {
                symbol: symbol.to_string(),
            }),
            [symbol, price] => Ok(Self::Valuation {
                symbol: symbol.to_string(),
                price: parse_decimal(price).ok_or(ConsoleError::InvalidPrice)?,
            }),
            [symbol, timestamp, quantity, side, price] => {
                let timestamp = parse_timestamp(timestamp)?;
                let quantity = parse_count(quantity).ok_or(ConsoleError::InvalidQuantityOrPrice)?;
                let side = Side::from_code(side)
                    .ok_or_else(|| ConsoleError::InvalidSide(side.to_string()))?;
                let price = parse_decimal(price).ok_or(ConsoleError::InvalidQuantityOrPrice)?;

                let quantity = u64::try_from(quantity)
                    .ok()
                    .filter(|q| *q > 0)
                    .ok_or(ValidationError::NonPositiveQuantity)?;
                let transaction =
                    Transaction::new(Symbol::parse(symbol)?, timestamp, quantity, side, price)?;
                Ok(Self::Trade {
                    symbol: symbol.to_string(),
                    transaction,
                })
            }
            [kind, symbol, par_value, last_dividend, periods, dividend] => {
                let invalid = || ConsoleError::InvalidInstrumentParameters;
                let par_value = parse_decimal(par_value).ok_or_else(invalid)?;
                let last_annual_dividend = parse_decimal(last_dividend).ok_or_else(invalid)?;
                let periods = parse_count(periods).ok_or_else(invalid)?;
                let dividend = parse_decimal(dividend).ok_or_else(invalid)?;

                let kind = match *kind {
                    "C" => SeedKind::Common,
                    "P" => SeedKind::Preferred,
                    other => return Err(ConsoleError::InvalidKind(other.to_string())),
                };
                if periods <= 0 {
                    return Err(ValidationError::NonPositivePeriods.into());
                }
                let periods_per_year = u32::try_from(periods).map_err(|_| invalid())?;

                Ok(Self::AddInstrument(InstrumentSeed {
                    kind,
                    symbol: symbol.to_string(),
                    par_value,
                    last_annual_dividend,
                    periods_per_year,
                    dividend,
                }))
            }
            _ => Err(ConsoleError::Unrecognized),
        }
    }
}

/// Whether the session continues after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Interactive front end bound to one registry
pub struct Console<'a> {
    registry: &'a Registry,
    window_minutes: u32,
}

impl<'a> Console<'a> {
    pub fn new(registry: &'a Registry, window_minutes: u32) -> Self {
        Self {
            registry,
            window_minutes,
        }
    }

    /// Read commands until `EXIT` or end of input
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> crate::Result<()> {
        for line in input.lines() {
            if self.execute(&line?, &mut output)? == Flow::Exit {
                break;
            }
            output.flush()?;
        }
        output.flush()?;
        Ok(())
    }

    /// Run one line and write its reply
    pub fn execute<W: Write>(&self, line: &str, out: &mut W) -> io::Result<Flow> {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(line, error = %e, "rejected console input");
                writeln!(out, "{e}")?;
                return Ok(Flow::Continue);
            }
        };

        match command {
            Command::Exit => return Ok(Flow::Exit),
            Command::Index => {
                let index = self.registry.market_index().unwrap_or(Decimal::ZERO);
                writeln!(out, "GBCE Index of All Stock: {index}")?;
            }
            Command::VolumeWeightedPrice { symbol } => {
                let vwap = self
                    .registry
                    .volume_weighted_price(&symbol, self.window_minutes)
                    .unwrap_or(Decimal::ZERO);
                writeln!(out, "Volume Weighted Stock Price of {symbol}: {vwap}")?;
            }
            Command::Valuation { symbol, price } => {
                let pe = self.registry.pe_ratio(&symbol, price).unwrap_or(Decimal::ZERO);
                let dividend_yield = self
                    .registry
                    .dividend_yield(&symbol, price)
                    .unwrap_or(Decimal::ZERO);
                writeln!(out, "P/E Ratio: {pe}")?;
                writeln!(out, "Dividend Yield: {dividend_yield}")?;
            }
            Command::Trade {
                symbol,
                transaction,
            } => {
                let recorded = self.registry.add_transaction(&symbol, transaction);
                write_outcome(out, recorded)?;
            }
            Command::AddInstrument(seed) => match seed.build() {
                Ok(instrument) => write_outcome(out, self.registry.add_instrument(instrument))?,
                Err(e) => writeln!(out, "{e}")?,
            },
        }
        Ok(Flow::Continue)
    }
}

fn write_outcome<W: Write>(out: &mut W, success: bool) -> io::Result<()> {
    if success {
        writeln!(out, "Success.")
    } else {
        writeln!(out, "Fail.")
    }
}

/// Plain or scientific decimal literal
fn parse_decimal(token: &str) -> Option<Decimal> {
    Decimal::from_str(token)
        .or_else(|_| Decimal::from_scientific(token))
        .ok()
}

/// Signed integer; sign is checked by the caller so negatives surface as
/// validation errors rather than parse errors
fn parse_count(token: &str) -> Option<i64> {
    token.parse().ok()
}

fn parse_timestamp(token: &str) -> Result<OffsetDateTime, ConsoleError> {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    PrimitiveDateTime::parse(token, format)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|_| ConsoleError::InvalidTimestamp(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{gin, pop, tea};
    use rust_decimal_macros::dec;
    use std::io::Cursor;
    use time::macros::datetime;
    use time::Duration;

    fn registry() -> Registry {
        let registry = Registry::new();
        registry.add_instrument(tea());
        registry.add_instrument(pop());
        registry.add_instrument(gin());
        registry
    }

    fn reply(registry: &Registry, line: &str) -> String {
        let mut out = Vec::new();
        Console::new(registry, 15).execute(line, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn console_time(ts: OffsetDateTime) -> String {
        let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
        ts.format(format).unwrap()
    }

    #[test]
    fn test_parse_queries() {
        assert_eq!(Command::parse(""), Ok(Command::Index));
        assert_eq!(Command::parse("EXIT"), Ok(Command::Exit));
        assert_eq!(
            Command::parse("POP"),
            Ok(Command::VolumeWeightedPrice {
                symbol: "POP".to_string()
            })
        );
        assert_eq!(
            Command::parse("POP 3.23"),
            Ok(Command::Valuation {
                symbol: "POP".to_string(),
                price: dec!(3.23)
            })
        );
        assert_eq!(Command::parse("POP abc"), Err(ConsoleError::InvalidPrice));
        assert_eq!(Command::parse("a b c"), Err(ConsoleError::Unrecognized));
    }

    #[test]
    fn test_parse_trade() {
        let Ok(Command::Trade {
            symbol,
            transaction,
        }) = Command::parse("POP 2015-11-24T16:36:31 1000 B 117.23")
        else {
            panic!("expected a trade");
        };
        assert_eq!(symbol, "POP");
        assert_eq!(transaction.timestamp(), datetime!(2015-11-24 16:36:31 UTC));
        assert_eq!(transaction.quantity(), 1000);
        assert_eq!(transaction.side(), Side::Buy);
        assert_eq!(transaction.price(), dec!(117.23));
    }

    #[test]
    fn test_parse_trade_errors() {
        assert!(matches!(
            Command::parse("POP 2015-11-24 1000 B 117.23"),
            Err(ConsoleError::InvalidTimestamp(_))
        ));
        assert_eq!(
            Command::parse("POP 2015-11-24T16:36:31 lots B 117.23"),
            Err(ConsoleError::InvalidQuantityOrPrice)
        );
        assert!(matches!(
            Command::parse("POP 2015-11-24T16:36:31 1000 X 117.23"),
            Err(ConsoleError::InvalidSide(_))
        ));
        assert_eq!(
            Command::parse("POP 2015-11-24T16:36:31 -5 B 117.23"),
            Err(ConsoleError::Validation(ValidationError::NonPositiveQuantity))
        );
        assert!(matches!(
            Command::parse("POP 2015-11-24T16:36:31 5 S 0"),
            Err(ConsoleError::Validation(ValidationError::NonPositivePrice(_)))
        ));
    }

    #[test]
    fn test_parse_add_instrument() {
        let Ok(Command::AddInstrument(seed)) = Command::parse("P MSFT 1000 10 2 5") else {
            panic!("expected an instrument");
        };
        assert_eq!(seed.kind, SeedKind::Preferred);
        assert_eq!(seed.symbol, "MSFT");
        assert_eq!(seed.periods_per_year, 2);
        assert_eq!(seed.dividend, dec!(5));

        assert!(matches!(
            Command::parse("X MSFT 1000 10 2 5"),
            Err(ConsoleError::InvalidKind(_))
        ));
        assert_eq!(
            Command::parse("C MSFT ten 10 2 5"),
            Err(ConsoleError::InvalidInstrumentParameters)
        );
        assert_eq!(
            Command::parse("C MSFT 1000 10 0 5"),
            Err(ConsoleError::Validation(ValidationError::NonPositivePeriods))
        );
        assert_eq!(
            Command::parse("C MSFT 1000 10 -2 5"),
            Err(ConsoleError::Validation(ValidationError::NonPositivePeriods))
        );
    }

    #[test]
    fn test_valuation_reply() {
        let registry = registry();
        assert_eq!(reply(&registry, "POP 4"), "P/E Ratio: 0.5\nDividend Yield: 2\n");
        assert_eq!(reply(&registry, "TEA 4"), "P/E Ratio: 0\nDividend Yield: 0\n");
        assert_eq!(reply(&registry, "JOE 4"), "P/E Ratio: 0\nDividend Yield: 0\n");
    }

    #[test]
    fn test_trade_and_vwap_reply() {
        let registry = registry();
        let recent = console_time(OffsetDateTime::now_utc() - Duration::minutes(2));

        assert_eq!(reply(&registry, &format!("POP {recent} 10 B 10")), "Success.\n");
        assert_eq!(reply(&registry, &format!("POP {recent} 20 S 20")), "Success.\n");
        assert_eq!(reply(&registry, &format!("JOE {recent} 20 S 20")), "Fail.\n");

        assert_eq!(
            reply(&registry, "POP"),
            "Volume Weighted Stock Price of POP: 16.66666667\n"
        );
        assert_eq!(reply(&registry, "GIN"), "Volume Weighted Stock Price of GIN: 0\n");
    }

    #[test]
    fn test_index_reply() {
        let registry = registry();
        assert_eq!(reply(&registry, ""), "GBCE Index of All Stock: 0\n");

        reply(&registry, "POP 2015-11-24T16:36:31 1 B 4");
        reply(&registry, "GIN 2015-11-24T16:36:31 1 B 9");
        assert_eq!(reply(&registry, ""), "GBCE Index of All Stock: 6\n");
    }

    #[test]
    fn test_add_instrument_reply() {
        let registry = registry();
        assert_eq!(reply(&registry, "C MSFT 1000 10 2 5"), "Success.\n");
        assert_eq!(reply(&registry, "C MSFT 1000 10 2 5"), "Fail.\n");
        assert!(reply(&registry, "P NEW 1000 10 2 0").starts_with("dividend attribute"));
        assert!(reply(&registry, "C TOOLONG 1 1 1 1").starts_with("invalid symbol"));
        assert_eq!(registry.len(), 4);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_run_surfaces_output_failure() {
        let registry = registry();
        let result = Console::new(&registry, 15).run(Cursor::new("POP 4\n"), ClosedPipe);
        assert!(matches!(result, Err(crate::EngineError::Io(_))));
    }

    #[test]
    fn test_run_stops_at_exit() {
        let registry = registry();
        let input = Cursor::new("POP 4\na b c\nEXIT\nPOP 4\n");
        let mut output = Vec::new();
        Console::new(&registry, 15).run(input, &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_eq!(
            output,
            "P/E Ratio: 0.5\nDividend Yield: 2\nUnrecognized Operation.\n"
        );
    }
}
