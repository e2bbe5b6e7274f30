// Metrics sources: a remote collector over HTTP, or the local host via sysinfo.
// A source performs exactly one fetch per call; retry policy belongs to the poller.

mod http;
mod linux;
mod local;

pub use http::HttpMetricsSource;
pub use local::LocalMetricsSource;

use crate::config::{SourceConfig, SourceKind};
use crate::models::Snapshot;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a fetch produced no snapshot. Always recoverable: the next tick retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("metrics source unreachable: {0}")]
    Unreachable(String),
    #[error("metrics request timed out after {0} ms")]
    Timeout(u64),
    #[error("metrics source returned HTTP {0}")]
    Status(u16),
    #[error("malformed metrics body: {0}")]
    Malformed(String),
    #[error("local collector failed: {0}")]
    Collector(String),
}

pub trait MetricsSource: Send + Sync + 'static {
    /// Fetches a single snapshot.
    fn fetch(&self) -> impl Future<Output = Result<Snapshot, FetchError>> + Send;
}

impl<S: MetricsSource> MetricsSource for Arc<S> {
    fn fetch(&self) -> impl Future<Output = Result<Snapshot, FetchError>> + Send {
        self.as_ref().fetch()
    }
}

/// Source selected by `[source] kind` in the config file.
pub enum ConfiguredSource {
    Http(HttpMetricsSource),
    Local(LocalMetricsSource),
}

impl ConfiguredSource {
    pub fn from_config(config: &SourceConfig) -> anyhow::Result<Self> {
        match config.kind {
            SourceKind::Http => Ok(Self::Http(HttpMetricsSource::new(
                &config.url,
                Duration::from_millis(config.timeout_ms),
            )?)),
            SourceKind::Local => Ok(Self::Local(LocalMetricsSource::new())),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Http(s) => format!("http {}", s.url()),
            Self::Local(_) => "local host".to_string(),
        }
    }
}

impl MetricsSource for ConfiguredSource {
    async fn fetch(&self) -> Result<Snapshot, FetchError> {
        match self {
            Self::Http(s) => s.fetch().await,
            Self::Local(s) => s.fetch().await,
        }
    }
}

/// Checks a freshly collected snapshot before it leaves the source.
///
/// Non-finite percentages are malformed. Finite ones outside [0, 100] are clamped, and disks
/// reporting negative sizes or more used than total space are kept; all of these log a
/// data-quality warning.
pub(crate) fn validate(mut snapshot: Snapshot) -> Result<Snapshot, FetchError> {
    snapshot.cpu_usage_pct = checked_percent("cpu_usage_pct", snapshot.cpu_usage_pct)?;
    snapshot.memory_usage_pct = checked_percent("memory_usage_pct", snapshot.memory_usage_pct)?;
    for disk in &snapshot.disks {
        if !disk.total_gb.is_finite() || !disk.used_gb.is_finite() {
            return Err(FetchError::Malformed(format!(
                "disk {} has non-finite size",
                disk.mount_name
            )));
        }
        if disk.has_negative_size() {
            tracing::warn!(
                mount = %disk.mount_name,
                total_gb = disk.total_gb,
                used_gb = disk.used_gb,
                "disk reports a negative size"
            );
        }
        if disk.is_overcommitted() {
            tracing::warn!(
                mount = %disk.mount_name,
                total_gb = disk.total_gb,
                used_gb = disk.used_gb,
                "disk reports more used than total space"
            );
        }
    }
    Ok(snapshot)
}

fn checked_percent(field: &str, value: f64) -> Result<f64, FetchError> {
    if !value.is_finite() {
        return Err(FetchError::Malformed(format!("{} is not a finite number", field)));
    }
    if !(0.0..=100.0).contains(&value) {
        tracing::warn!(field, value, "percentage out of range; clamping");
    }
    Ok(value.clamp(0.0, 100.0))
}
