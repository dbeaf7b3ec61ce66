#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::unnecessary_wraps, clippy::cast_precision_loss)]

mod scenarios;

use anyhow::{bail, Context as _, Result};
use imgcompute::converters::{self, ConverterRegistry};
use imgcompute::dispatch::Dispatcher;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let inject_mismatch = std::env::args().skip(1).any(|arg| arg == "--inject-mismatch");

    converters::initialize(ConverterRegistry::with_builtin()?)
        .context("Failed to install the converter registry")?;
    let ctx = imgcompute::default_context();
    tracing::info!("Running self-check on the {} backend.", ctx.name());
    let dispatcher = Dispatcher::new(ctx.clone())?;

    let mut scenarios = scenarios::all();
    if inject_mismatch {
        scenarios.push(scenarios::injected_mismatch());
    }

    let mut failed = 0;
    for scenario in &scenarios {
        match (scenario.run)(&dispatcher) {
            Ok(()) => tracing::info!("{}: ok", scenario.name),
            Err(e) => {
                failed += 1;
                tracing::error!("{}: {e:#}", scenario.name);
            }
        }
    }

    if ctx.live_resources() != 0 {
        bail!("{} device resources leaked", ctx.live_resources());
    }
    if failed > 0 {
        bail!("{failed} of {} scenarios failed", scenarios.len());
    }
    tracing::info!("selfcheck passed: {} scenarios, {} allocations.", scenarios.len(), ctx.total_allocations());
    Ok(())
}
