// Remote collector: one GET per fetch, bounded by the client timeout, no retries

use super::{FetchError, MetricsSource, validate};
use crate::models::{DiskInfo, NetworkInfo, Snapshot};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

#[derive(Debug, Deserialize)]
struct WireSnapshot {
    cpu_usage_pct: f64,
    memory_usage_pct: f64,
    disks: Vec<WireDisk>,
    network: WireNetwork,
}

#[derive(Debug, Deserialize)]
struct WireDisk {
    mount: String,
    total_gb: f64,
    used_gb: f64,
}

#[derive(Debug, Deserialize)]
struct WireNetwork {
    ip: String,
    subnet_mask: String,
    gateway: String,
    dns_servers: Vec<String>,
}

impl From<WireSnapshot> for Snapshot {
    fn from(w: WireSnapshot) -> Self {
        Snapshot {
            cpu_usage_pct: w.cpu_usage_pct,
            memory_usage_pct: w.memory_usage_pct,
            disks: w
                .disks
                .into_iter()
                .map(|d| DiskInfo {
                    mount_name: d.mount,
                    total_gb: d.total_gb,
                    used_gb: d.used_gb,
                })
                .collect(),
            network: NetworkInfo {
                ip: w.network.ip,
                subnet_mask: w.network.subnet_mask,
                gateway: w.network.gateway,
                dns_servers: w.network.dns_servers,
            },
        }
    }
}

pub struct HttpMetricsSource {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl HttpMetricsSource {
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let url =
            Url::parse(url).map_err(|e| anyhow::anyhow!("invalid source url {}: {}", url, e))?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::version::user_agent())
            .build()?;
        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout.as_millis() as u64)
        } else {
            FetchError::Unreachable(e.to_string())
        }
    }
}

/// Parses a collector response body.
pub(super) fn parse_body(body: &[u8]) -> Result<Snapshot, FetchError> {
    let wire: WireSnapshot =
        serde_json::from_slice(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
    validate(wire.into())
}

impl MetricsSource for HttpMetricsSource {
    #[instrument(skip(self), fields(source = "http", operation = "fetch", url = %self.url))]
    async fn fetch(&self) -> Result<Snapshot, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        parse_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_body_maps_wire_fields() {
        let body = br#"{
            "cpu_usage_pct": 12.5,
            "memory_usage_pct": 40.0,
            "disks": [{"mount": "/", "total_gb": 100.0, "used_gb": 25.0}],
            "network": {"ip": "10.0.0.2", "subnet_mask": "255.255.255.0", "gateway": "10.0.0.1", "dns_servers": ["1.1.1.1"]}
        }"#;
        let snapshot = parse_body(body).unwrap();
        assert_eq!(snapshot.disks[0].mount_name, "/");
        assert_eq!(snapshot.network.gateway, "10.0.0.1");
    }

    #[test]
    fn parse_body_keeps_disks_with_negative_size() {
        let body = br#"{
            "cpu_usage_pct": 1.0,
            "memory_usage_pct": 2.0,
            "disks": [{"mount": "/mnt/odd", "total_gb": -1.0, "used_gb": 3.0}],
            "network": {"ip": "", "subnet_mask": "", "gateway": "", "dns_servers": []}
        }"#;
        let snapshot = parse_body(body).unwrap();
        assert_eq!(snapshot.disks[0].total_gb, -1.0);
        assert!(snapshot.disks[0].has_negative_size());
    }

    #[test]
    fn parse_body_rejects_missing_network() {
        let body = br#"{"cpu_usage_pct": 1.0, "memory_usage_pct": 2.0, "disks": []}"#;
        assert!(matches!(parse_body(body), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn parse_body_rejects_string_percentage() {
        let body = br#"{
            "cpu_usage_pct": "high",
            "memory_usage_pct": 2.0,
            "disks": [],
            "network": {"ip": "", "subnet_mask": "", "gateway": "", "dns_servers": []}
        }"#;
        assert!(matches!(parse_body(body), Err(FetchError::Malformed(_))));
    }
}
