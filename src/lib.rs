//! # Streaming Metrics Load Generation
//!
//! Synthetic client behavior for driving the streaming metrics backend
//! under load.
//!
//! Each simulated client waits a few milliseconds, then issues one of two
//! weighted requests against the backend, repeating until the harness stops
//! it:
//!
//! - `POST /ingest` with a freshly sampled metric payload (weight 10)
//! - `GET /analyze` polling the latest analysis snapshot (weight 1)
//!
//! User pools, scheduling, ramp-up and statistics aggregation all belong to
//! the [goose](https://docs.rs/goose) harness. This crate only defines what
//! a single client does per iteration, plus the per-client `Host` header
//! initialization that lets requests route through virtual-host dispatch
//! while physically connecting to one address.
//!
//! ## Usage
//!
//! ```bash
//! # 500 clients against a local backend for one minute
//! cargo run --release -- --host http://localhost:8080 --users 500 --run-time 60
//!
//! # Route through an ingress that dispatches on the Host header
//! HOST_HEADER=metrics.internal cargo run --release -- --host http://ingress:80 --users 1000
//! ```

use std::env;
use std::time::Duration;

use chrono::Utc;
use goose::prelude::*;
use once_cell::sync::Lazy;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, HOST};
use serde::{Deserialize, Serialize};
use tracing::warn;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Host header applied when `HOST_HEADER` is not set in the environment.
pub const DEFAULT_HOST_HEADER: &str = "streaming.local";

/// Relative frequency of the metric ingestion transaction.
pub const SEND_METRIC_WEIGHT: usize = 10;

/// Relative frequency of the analysis read transaction.
pub const READ_ANALYSIS_WEIGHT: usize = 1;

/// Lower bound of the random pause between consecutive transactions.
pub const WAIT_TIME_MIN: Duration = Duration::from_millis(1);

/// Upper bound of the random pause between consecutive transactions.
pub const WAIT_TIME_MAX: Duration = Duration::from_millis(10);

static HOST_HEADER: Lazy<String> = Lazy::new(host_header_from_env);

/// Host header value shared by every simulated client.
///
/// Resolved from the `HOST_HEADER` environment variable on first use and
/// never re-read afterwards, so all clients see the same value for the
/// lifetime of the process.
pub fn host_header() -> &'static str {
    &HOST_HEADER
}

fn host_header_from_env() -> String {
    match env::var("HOST_HEADER") {
        Ok(value) if HeaderValue::from_str(&value).is_ok() => value,
        Ok(value) => {
            warn!(
                "HOST_HEADER {:?} is not a valid header value, using {:?}",
                value, DEFAULT_HOST_HEADER
            );
            DEFAULT_HOST_HEADER.to_string()
        }
        Err(_) => DEFAULT_HOST_HEADER.to_string(),
    }
}

// ============================================================================
// METRIC PAYLOAD
// ============================================================================

/// One synthetic metric sample, serialized as the body of an ingestion
/// request and discarded immediately afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPayload {
    /// Seconds since the Unix epoch at generation time.
    pub timestamp: i64,

    /// CPU utilization percentage, uniform in [5, 90].
    pub cpu: f64,

    /// Observed request rate, uniform in [100, 900].
    pub rps: f64,
}

impl MetricPayload {
    /// Sample a fresh payload. Every field is drawn independently on each
    /// call; nothing is memoized across calls.
    pub fn sample() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            timestamp: Utc::now().timestamp(),
            cpu: round2(rng.gen_range(5.0..=90.0)),
            rps: round2(rng.gen_range(100.0..=900.0)),
        }
    }
}

/// Round to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// CLIENT BEHAVIOR
// ============================================================================

/// Per-client initialization: pin the `Host` header on every outgoing
/// request by swapping in a client whose default headers carry the
/// configured value. Runs once per simulated client, before any task.
pub async fn apply_host_header(user: &mut GooseUser) -> TransactionResult {
    let mut headers = HeaderMap::new();
    // host_header() only ever yields values that passed HeaderValue parsing.
    let value = HeaderValue::from_str(host_header()).expect("validated host header");
    headers.insert(HOST, value);

    let builder = reqwest::Client::builder().default_headers(headers);
    user.set_client_builder(builder).await?;
    Ok(())
}

/// Sample one metric payload and post it to the ingestion endpoint.
///
/// The response is not inspected; status and latency land in the harness's
/// aggregate statistics.
pub async fn send_metric(user: &mut GooseUser) -> TransactionResult {
    let payload = MetricPayload::sample();
    let _response = user.post_json("/ingest", &payload).await?;
    Ok(())
}

/// Poll the latest analysis snapshot. Same non-inspection contract as
/// [`send_metric`].
pub async fn read_analysis(user: &mut GooseUser) -> TransactionResult {
    let _response = user.get("/analyze").await?;
    Ok(())
}

/// Assemble the simulated client: one on-start step plus the two weighted
/// transactions, paced by the declared wait-time bounds.
pub fn metrics_user() -> Result<Scenario, GooseError> {
    Ok(scenario!("MetricsUser")
        .set_wait_time(WAIT_TIME_MIN, WAIT_TIME_MAX)?
        .register_transaction(transaction!(apply_host_header).set_on_start())
        .register_transaction(
            transaction!(send_metric)
                .set_name("send_metric")
                .set_weight(SEND_METRIC_WEIGHT)?,
        )
        .register_transaction(
            transaction!(read_analysis)
                .set_name("read_analysis")
                .set_weight(READ_ANALYSIS_WEIGHT)?,
        ))
}

// ============================================================================
// TESTS
// ============================================================================
