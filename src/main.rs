//! Stock market metrics console
//!
//! Loads configuration, registers the configured instruments and serves
//! console commands from stdin until `EXIT` or end of input.

use anyhow::Context;
use stock_metrics::console::Console;
use stock_metrics::infrastructure::{init_logging, Config};
use stock_metrics::Registry;

fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    let _guards = init_logging(&config.logging).context("initializing logging")?;

    let registry = Registry::bootstrap(&config).context("building registry")?;
    tracing::info!(
        instruments = registry.len(),
        window_minutes = config.engine.vwap_window_minutes,
        "registry ready"
    );

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    Console::new(&registry, config.engine.vwap_window_minutes)
        .run(stdin.lock(), stdout.lock())
        .context("console session")?;

    tracing::info!("console closed");
    Ok(())
}
