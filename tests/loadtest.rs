//! End-to-end checks running the simulated client against a mock backend.
//!
//! A short goose attack is driven at a mockito server; the mocks assert the
//! wire contract (method, path, Host header, JSON body shape) and the
//! harness metrics are used to check the send/read weighting.

use goose::config::GooseConfiguration;
use goose::prelude::*;
use gumdrop::Options;
use streaming_loadtest::metrics_user;

/// Headless harness configuration pointed at the mock backend.
fn attack_configuration(host: &str) -> GooseConfiguration {
    let args = vec![
        "--host",
        host,
        "--users",
        "2",
        "--hatch-rate",
        "4",
        "--run-time",
        "2",
        "--no-reset-metrics",
        "--no-print-metrics",
        "--no-telnet",
        "--no-websocket",
    ];
    GooseConfiguration::parse_args_default(&args).expect("bad harness arguments")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simulated_client_drives_both_endpoints() {
    std::env::remove_var("HOST_HEADER");

    let mut server = mockito::Server::new_async().await;

    // POST /ingest: JSON object with exactly timestamp/cpu/rps, routed to
    // the default virtual host.
    let ingest = server
        .mock("POST", "/ingest")
        .match_header("host", "streaming.local")
        .match_header("content-type", "application/json")
        .match_body(mockito::Matcher::Regex(
            r#"^\{"timestamp":\d+,"cpu":\d+(\.\d+)?,"rps":\d+(\.\d+)?\}$"#.to_string(),
        ))
        .with_status(202)
        .expect_at_least(20)
        .create_async()
        .await;

    // GET /analyze: no body, same virtual host.
    let analyze = server
        .mock("GET", "/analyze")
        .match_header("host", "streaming.local")
        .match_body(mockito::Matcher::Exact(String::new()))
        .with_status(200)
        .with_body("{}")
        .expect_at_least(1)
        .create_async()
        .await;

    let metrics = GooseAttack::initialize_with_config(attack_configuration(&server.url()))
        .expect("harness initialization failed")
        .register_scenario(metrics_user().expect("scenario assembly failed"))
        .set_scheduler(GooseScheduler::Random)
        .execute()
        .await
        .expect("load test failed");

    ingest.assert_async().await;
    analyze.assert_async().await;

    let sends: usize = metrics
        .requests
        .iter()
        .filter(|(key, _)| key.ends_with("/ingest"))
        .map(|(_, aggregate)| aggregate.success_count)
        .sum();
    let reads: usize = metrics
        .requests
        .iter()
        .filter(|(key, _)| key.ends_with("/analyze"))
        .map(|(_, aggregate)| aggregate.success_count)
        .sum();

    assert!(sends >= 40, "too few ingestion requests: {sends}");
    assert!(reads >= 1, "no analysis requests issued");

    // Weighted 10:1 in expectation; allow slack for the short run.
    let ratio = sends as f64 / reads as f64;
    assert!(
        (5.0..=20.0).contains(&ratio),
        "send/read ratio {ratio:.2} strayed from 10:1 (sends={sends}, reads={reads})"
    );
}
