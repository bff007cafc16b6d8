//! HTTP round trips against a live listener
//!
//! The peers forward to each other over real HTTP, so these runs exercise the
//! 202-accept chain end to end.

use std::net::SocketAddr;
use std::time::Duration;

use pingpong::config::RelayConfig;
use pingpong::{AppState, PingPongClient, ProgressStatus, ProgressStore, RoundStatus, create_router};
use reqwest::StatusCode;
use tokio::net::TcpListener;

async fn start_server(remote_authority: bool) -> (SocketAddr, ProgressStore) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let relay = RelayConfig {
        base_url: format!("http://{}/api", addr),
        forward_timeout_ms: 5_000,
        report_timeout_ms: 2_000,
        remote_authority,
    };

    let store = ProgressStore::spawn();
    let state = AppState::from_config(store.clone(), &relay).unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });
    (addr, store)
}

fn client(addr: SocketAddr) -> PingPongClient {
    PingPongClient::new(&format!("http://{}/api", addr)).unwrap()
}

async fn wait_until_done(client: &PingPongClient) -> ProgressStatus {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    loop {
        let status = client.status().await.unwrap();
        if status.done {
            return status;
        }
        assert!(tokio::time::Instant::now() < deadline, "fill did not finish: {:?}", status);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_small_grid_fills_over_http() {
    let (addr, _store) = start_server(false).await;
    let client = client(addr);

    let configured = client.configure(5, 5).await.unwrap();
    assert_eq!((configured.m, configured.n), (5, 5));

    let summary = client.generate().await.unwrap();
    assert_eq!(summary.status, RoundStatus::PixelAdded);

    let status = wait_until_done(&client).await;
    assert_eq!(status.colored_pixels, 25);
    assert_eq!(status.run_id, configured.run_id);

    let validation = client.validate().await.unwrap();
    assert!(validation.is_valid);
    assert_eq!(validation.total_pixels, 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_medium_grid_fills_with_remote_authority() {
    let (addr, _store) = start_server(true).await;
    let client = client(addr);

    client.configure(20, 40).await.unwrap();
    client.generate().await.unwrap();

    let status = wait_until_done(&client).await;
    assert_eq!(status.colored_pixels, 800);
    assert_eq!(status.progress_percentage, 100.0);

    let image = client.image().await.unwrap();
    assert_eq!(image.image.len(), 800);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_large_grid_fills_over_http() {
    let (addr, _store) = start_server(false).await;
    let client = client(addr);

    client.configure(300, 300).await.unwrap();
    client.generate().await.unwrap();

    let status = wait_until_done(&client).await;
    assert_eq!(status.colored_pixels, 90_000);
    assert_eq!(status.current_position, None);
}

#[tokio::test]
async fn test_error_statuses() {
    let (addr, _store) = start_server(false).await;
    let http = reqwest::Client::new();
    let base = format!("http://{}/api", addr);

    // nothing configured yet
    let response = http.post(format!("{}/generate/", base)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = http
        .post(format!("{}/configure/", base))
        .json(&serde_json::json!({"m": 3}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = http
        .post(format!("{}/configure/", base))
        .json(&serde_json::json!({"m": 0, "n": 3}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = http
        .post(format!("{}/configure/", base))
        .json(&serde_json::json!({"m": 5000, "n": 5000}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = http.post(format!("{}/generate/", base)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No strategy for size 25000000");

    let response = http
        .get(format!("{}/status/?m=10&n=10", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_peer_endpoint_accepts_and_rejects() {
    let (addr, store) = start_server(false).await;
    let http = reqwest::Client::new();
    let base = format!("http://{}/api", addr);

    let response = http
        .post(format!("{}/pong/", base))
        .json(&serde_json::json!({"n": 3}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    store.configure(1, 1).await.unwrap();
    let response = http
        .post(format!("{}/pong/", base))
        .json(&serde_json::json!({"m": 1, "n": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"status": "accepted", "peer": "pong"}));
}

#[tokio::test]
async fn test_update_pixel_endpoint() {
    let (addr, store) = start_server(false).await;
    let http = reqwest::Client::new();
    let url = format!("http://{}/api/status/update_pixel/", addr);
    store.configure(100, 100).await.unwrap();

    let response = http
        .post(&url)
        .json(&serde_json::json!({"start_index": 0, "end_index": 250}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "range_updated");
    assert_eq!(body["pixels_updated"], 250);

    let response = http
        .post(&url)
        .json(&serde_json::json!({"pixel": {"x": 500, "y": 0}}))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "out_of_bounds");

    let status = store.status().await.unwrap();
    assert_eq!(status.colored_pixels, 250);
}
