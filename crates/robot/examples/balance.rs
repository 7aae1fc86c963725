//! Runs one balance simulation and writes every tick to stdout as CSV.
//!
//! ```text
//! cargo run -p teeter-robot --example balance -- crates/robot/config/balance.toml
//! ```
//!
//! Without a path the default robot starts from a 0.05 rad lean. Set
//! `RUST_LOG=teeter_robot=trace` to log each tick.

use std::{env, error::Error, io};

use serde::Serialize;
use teeter_robot::{Config, SimulationTick};

#[derive(Serialize)]
struct Row {
    time: f64,
    position: f64,
    velocity: f64,
    tilt_angle: f64,
    tilt_rate: f64,
    actuation: f64,
}

impl From<SimulationTick> for Row {
    fn from(tick: SimulationTick) -> Self {
        Self {
            time: tick.time,
            position: tick.state.position,
            velocity: tick.state.velocity,
            tilt_angle: tick.state.wrapped_tilt(),
            tilt_rate: tick.state.tilt_rate,
            actuation: tick.actuation,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    let config = match env::args().nth(1) {
        Some(path) => Config::from_path(path)?,
        None => Config::from_toml_str("[simulation]\ninitial_tilt = 0.05\n")?,
    };

    let mut sim = config.simulation()?;
    let mut wtr = csv::Writer::from_writer(io::stdout().lock());
    for tick in sim.by_ref() {
        wtr.serialize(Row::from(tick?))?;
    }
    wtr.flush()?;

    eprintln!("{}", sim.summary());
    Ok(())
}
