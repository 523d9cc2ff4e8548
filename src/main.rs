//! # Streaming Metrics Load Generator
//!
//! Wires the simulated client into the goose harness. Everything beyond the
//! client behavior itself (target host, user count, spawn rate, run time,
//! reporting) comes from goose's own command line.
//!
//! ```bash
//! streaming-loadtest --host http://localhost:8080 --users 1000 --hatch-rate 100 --run-time 5m
//! ```

use goose::prelude::*;
use streaming_loadtest::{host_header, metrics_user};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    info!("routing requests with Host: {}", host_header());

    GooseAttack::initialize()?
        .register_scenario(metrics_user()?)
        .set_scheduler(GooseScheduler::Random)
        .execute()
        .await?;

    Ok(())
}
