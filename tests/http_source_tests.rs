// HttpMetricsSource against a local axum collector: success, status, malformed, timeout, refused

use axum::{Router, http::StatusCode, routing::get};
use healthwatch::source::{FetchError, HttpMetricsSource, MetricsSource};
use std::time::Duration;

const GOOD_BODY: &str = r#"{
    "cpu_usage_pct": 23.5,
    "memory_usage_pct": 61.25,
    "disks": [
        {"mount": "/", "total_gb": 256.0, "used_gb": 128.5},
        {"mount": "/data", "total_gb": 10.0, "used_gb": 12.0}
    ],
    "network": {
        "ip": "192.168.1.20",
        "subnet_mask": "255.255.255.0",
        "gateway": "192.168.1.1",
        "dns_servers": ["192.168.1.1", "9.9.9.9"]
    }
}"#;

/// Serves `app` on an ephemeral port and returns its base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}/metrics", addr)
}

fn source(url: &str, timeout_ms: u64) -> HttpMetricsSource {
    HttpMetricsSource::new(url, Duration::from_millis(timeout_ms)).unwrap()
}

#[tokio::test]
async fn test_fetch_parses_collector_body() {
    let url = serve(Router::new().route("/metrics", get(|| async { GOOD_BODY }))).await;
    let snapshot = source(&url, 1000).fetch().await.unwrap();
    assert_eq!(snapshot.cpu_usage_pct, 23.5);
    assert_eq!(snapshot.memory_usage_pct, 61.25);
    assert_eq!(snapshot.disks.len(), 2);
    assert_eq!(snapshot.disks[0].mount_name, "/");
    assert_eq!(snapshot.disks[0].used_gb, 128.5);
    assert_eq!(snapshot.network.gateway, "192.168.1.1");
    assert_eq!(snapshot.network.dns_servers, vec!["192.168.1.1", "9.9.9.9"]);
}

#[tokio::test]
async fn test_overcommitted_disk_is_kept() {
    let url = serve(Router::new().route("/metrics", get(|| async { GOOD_BODY }))).await;
    let snapshot = source(&url, 1000).fetch().await.unwrap();
    assert!(snapshot.disks[1].is_overcommitted());
    assert_eq!(snapshot.disks[1].used_gb, 12.0);
}

#[tokio::test]
async fn test_non_success_status_is_error() {
    let url = serve(Router::new().route(
        "/metrics",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
    ))
    .await;
    let err = source(&url, 1000).fetch().await.unwrap_err();
    assert_eq!(err, FetchError::Status(503));
}

#[tokio::test]
async fn test_missing_route_is_status_404() {
    let url = serve(Router::new()).await;
    let err = source(&url, 1000).fetch().await.unwrap_err();
    assert_eq!(err, FetchError::Status(404));
}

#[tokio::test]
async fn test_malformed_body_is_error() {
    let url = serve(Router::new().route("/metrics", get(|| async { "{\"cpu_usage_pct\": 1" }))).await;
    let err = source(&url, 1000).fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_missing_field_is_error() {
    let body = r#"{"cpu_usage_pct": 1.0, "disks": [], "network": {"ip": "", "subnet_mask": "", "gateway": "", "dns_servers": []}}"#;
    let url = serve(Router::new().route("/metrics", get(move || async move { body }))).await;
    let err = source(&url, 1000).fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(ref m) if m.contains("memory_usage_pct")));
}

#[tokio::test]
async fn test_out_of_range_percentage_is_clamped() {
    let body = GOOD_BODY.replace("61.25", "140.0");
    let url = serve(Router::new().route(
        "/metrics",
        get(move || {
            let body = body.clone();
            async move { body }
        }),
    ))
    .await;
    let snapshot = source(&url, 1000).fetch().await.unwrap();
    assert_eq!(snapshot.memory_usage_pct, 100.0);
}

#[tokio::test]
async fn test_slow_collector_times_out() {
    let url = serve(Router::new().route(
        "/metrics",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            GOOD_BODY
        }),
    ))
    .await;
    let err = source(&url, 50).fetch().await.unwrap_err();
    assert_eq!(err, FetchError::Timeout(50));
}

#[tokio::test]
async fn test_refused_connection_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = source(&format!("http://{}/metrics", addr), 500)
        .fetch()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Unreachable(_)), "got {:?}", err);
}

#[test]
fn test_invalid_url_is_rejected_at_construction() {
    let err = HttpMetricsSource::new("not a url", Duration::from_secs(1))
        .err()
        .expect("invalid url must fail");
    assert!(err.to_string().contains("invalid source url"));
}
