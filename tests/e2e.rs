//! End-to-end tests against the gateway worker.
//!
//! These tests require a running worker at localhost:8787 (`wrangler dev`).
//! Run with: cargo test --test e2e -- --ignored

use rumie_reader::{GatewaySource, load_data};

fn worker_url() -> String {
    std::env::var("WORKER_URL").unwrap_or_else(|_| "http://localhost:8787".to_string())
}

/// Preflight answers 200 with the CORS headers and no body
#[test]
#[ignore] // Requires running worker
fn test_e2e_preflight() {
    let url = format!("{}/api/proxy", worker_url());
    let response = ureq::request("OPTIONS", &url)
        .call()
        .expect("preflight failed");

    assert_eq!(response.status(), 200);
    assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
    let methods = response
        .header("Access-Control-Allow-Methods")
        .expect("missing allow-methods");
    assert!(methods.contains("GET"));
    assert!(methods.contains("OPTIONS"));
    assert_eq!(response.into_string().unwrap(), "");
}

/// GET either relays the webhook's JSON or returns the error envelope;
/// both carry CORS headers
#[test]
#[ignore] // Requires running worker
fn test_e2e_proxy_get() {
    let url = format!("{}/api/proxy", worker_url());
    match ureq::get(&url).call() {
        Ok(response) => {
            assert_eq!(response.status(), 200);
            assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
            let body: serde_json::Value = response.into_json().expect("parse body");
            println!("Relayed payload: {body}");
        }
        Err(ureq::Error::Status(status, response)) => {
            assert_eq!(status, 500);
            assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
            let body: serde_json::Value = response.into_json().expect("parse envelope");
            assert!(body["error"].is_string(), "unexpected envelope: {body}");
            println!("Error envelope: {body}");
        }
        Err(err) => panic!("request failed: {err}"),
    }
}

/// The CLI loader reads whatever the worker relays
#[test]
#[ignore] // Requires running worker with N8N_WEBHOOK_URL configured
fn test_e2e_load_records() {
    let source = GatewaySource::new(&worker_url());
    let records = load_data(&source).expect("load failed");
    println!("Loaded {} records", records.len());
}
