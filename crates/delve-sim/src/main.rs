//! # Delve Sim
//!
//! Headless smoke run of the movement core.
//!
//! Builds a test room, fills it with walkers, bullets and particles, and
//! steps it at a fixed rate while logging what happens.
//!
//! Usage: `delve-sim [physics.toml] [ticks]`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod scenario;

use anyhow::{Context, Result};
use delve_gameplay::{Level, PhysicsConfig, TickSummary};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Fixed step length in seconds.
const TICK_SECONDS: f32 = 1.0 / 60.0;

/// Ticks to run when no count is given.
const DEFAULT_TICKS: u32 = 600;

/// Seed for the scenario's random scatter.
const SCENARIO_SEED: u64 = 0x00de_17e5;

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("delve=info".parse()?))
        .init();

    info!("Delve sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => PhysicsConfig::load_from(&path)
            .with_context(|| format!("Failed to load physics config from {path}"))?,
        None => PhysicsConfig::default(),
    };
    let ticks = args
        .next()
        .map(|count| count.parse::<u32>())
        .transpose()
        .context("Tick count must be a non-negative integer")?
        .unwrap_or(DEFAULT_TICKS);

    let mut level = scenario::build(&config, SCENARIO_SEED)?;
    let totals = run(&mut level, ticks);

    info!(
        "Ran {} ticks: {} world hits, {} entity hits, {} removed, {} alive",
        ticks,
        totals.world_hits,
        totals.entity_hits,
        totals.removed,
        level.entities().len()
    );
    scenario::report(&level);

    info!("Delve sim shutdown complete");
    Ok(())
}

/// Steps `level` for `ticks` ticks, logging once per simulated second.
fn run(level: &mut Level, ticks: u32) -> TickSummary {
    let per_second = (1.0 / TICK_SECONDS).round() as u32;
    let mut totals = TickSummary::default();

    for tick in 1..=ticks {
        let summary = level.tick(TICK_SECONDS);
        totals.registered += summary.registered;
        totals.killed_overlapping += summary.killed_overlapping;
        totals.moved += summary.moved;
        totals.world_hits += summary.world_hits;
        totals.entity_hits += summary.entity_hits;
        totals.removed += summary.removed;

        if tick % per_second == 0 {
            info!(
                "t = {:.1}s: {} alive, {} world hits, {} entity hits so far",
                tick as f32 * TICK_SECONDS,
                level.entities().len(),
                totals.world_hits,
                totals.entity_hits
            );
        }
    }
    totals
}
