#![allow(clippy::unwrap_used)]
// Poller tests against a wiremock-backed Govee API.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use govee_core::{ClientConfig, GoveeClient, PollState, Poller, Token, poll_once};

const DEVICES: &str = "/bff-app/v1/device/list";

// ── Helpers ─────────────────────────────────────────────────────────

fn cached_token() -> Token {
    let exp = Utc::now().timestamp() + 3600;
    let header = URL_SAFE_NO_PAD.encode(b"{}");
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
    Token::new(format!("{header}.{payload}.sig"))
}

/// Client with a valid token already cached, so no login is needed.
fn client(server: &MockServer, cache: &TempDir) -> Arc<GoveeClient> {
    let config = ClientConfig {
        base_url: Url::parse(&server.uri()).unwrap(),
        email: "me@example.com".into(),
        password: "pw".to_string().into(),
        cache_dir: cache.path().to_path_buf(),
        timeout: Duration::from_secs(5),
        poll_interval: Duration::from_secs(300),
    };
    config.token_store().save(&cached_token());
    Arc::new(config.build_client().unwrap())
}

fn devices_body(temperature: i64) -> serde_json::Value {
    json!({
        "status": 200,
        "data": { "devices": [
            {
                "device": "AA:BB:CC:DD:EE:FF:00:11",
                "sku": "H5111",
                "deviceName": "Bedroom",
                "deviceExt": {
                    "lastDeviceData": format!("{{\"online\":true,\"tem\":{temperature},\"hum\":5100}}"),
                    "deviceSettings": "{\"battery\":77}"
                }
            },
            { "device": "11:22", "sku": "H6008", "deviceName": "Lamp" }
        ]}
    })
}

async fn wait_for_cycles(rx: &mut tokio::sync::watch::Receiver<PollState>, n: u64) -> PollState {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if rx.borrow().cycles >= n {
                return rx.borrow().clone();
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap()
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_poll_once_normalizes_thermometers() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(DEVICES))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body(2234)))
        .mount(&server)
        .await;

    let thermometers = poll_once(&client(&server, &cache)).await.unwrap();
    assert_eq!(thermometers.len(), 1);
    let t = &thermometers[0];
    assert_eq!(t.name, "Bedroom");
    assert_eq!(t.telemetry.temperature, Some(22.3));
    assert_eq!(t.telemetry.humidity, Some(51.0));
    assert_eq!(t.telemetry.battery, Some(77));
    assert!(t.telemetry.online);
}

#[tokio::test]
async fn test_first_cycle_runs_immediately() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(DEVICES))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body(2000)))
        .expect(1)
        .mount(&server)
        .await;

    let poller = Poller::spawn(
        client(&server, &cache),
        Duration::from_secs(3600),
        CancellationToken::new(),
    );
    let mut rx = poller.subscribe();
    let state = wait_for_cycles(&mut rx, 1).await;

    assert!(state.available);
    assert_eq!(state.thermometers.len(), 1);
    assert_eq!(state.thermometers[0].telemetry.temperature, Some(20.0));

    poller.shutdown().await;
}

#[tokio::test]
async fn test_failed_cycle_keeps_previous_readings() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(DEVICES))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body(1850)))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(DEVICES))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let poller = Poller::spawn(
        client(&server, &cache),
        Duration::from_secs(1),
        CancellationToken::new(),
    );
    let mut rx = poller.subscribe();

    let first = wait_for_cycles(&mut rx, 1).await;
    assert!(first.available);

    let second = wait_for_cycles(&mut rx, 2).await;
    assert!(!second.available);
    assert_eq!(second.thermometers.len(), 1);
    assert_eq!(second.thermometers[0].telemetry.temperature, Some(18.5));
    assert!(second.last_error.unwrap().contains("502"));
    assert_eq!(second.last_success, first.last_success);

    poller.shutdown().await;
}

#[tokio::test]
async fn test_cancellation_stops_polling() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(DEVICES))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body(2000)))
        .mount(&server)
        .await;

    let parent = CancellationToken::new();
    let poller = Poller::spawn(
        client(&server, &cache),
        Duration::from_secs(1),
        parent.child_token(),
    );
    let mut rx = poller.subscribe();
    wait_for_cycles(&mut rx, 1).await;

    parent.cancel();
    tokio::time::timeout(Duration::from_secs(5), poller.shutdown())
        .await
        .unwrap();

    let seen = server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), seen);
}
