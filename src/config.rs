use serde::Deserialize;

use crate::alarm::MemoryLimit;
use crate::rolling_window::DEFAULT_HISTORY_LEN;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub publishing: PublishingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Http,
    Local,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Collector endpoint; required when `kind = "http"`.
    #[serde(default)]
    pub url: String,
    /// Per-request timeout. Must not exceed the poll interval so requests never overlap.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    1500
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Number of samples kept in each of the CPU and RAM histories.
    #[serde(default = "default_history_len")]
    pub history_len: usize,
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_history_len() -> usize {
    DEFAULT_HISTORY_LEN
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            history_len: default_history_len(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlarmConfig {
    /// Memory usage percentage (0..=100) that raises the alarm. Absent = no alarm.
    pub memory_limit: Option<u16>,
}

impl AlarmConfig {
    pub fn memory_limit(&self) -> anyhow::Result<Option<MemoryLimit>> {
        Ok(self.memory_limit.map(MemoryLimit::new).transpose()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Alarm events buffered per subscriber before slow subscribers start lagging.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_broadcast_capacity() -> usize {
    64
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        if self.source.kind == SourceKind::Http {
            anyhow::ensure!(
                !self.source.url.trim().is_empty(),
                "source.url must be non-empty when source.kind = \"http\""
            );
        }
        anyhow::ensure!(
            self.source.timeout_ms > 0,
            "source.timeout_ms must be > 0, got {}",
            self.source.timeout_ms
        );
        anyhow::ensure!(
            self.polling.interval_ms > 0,
            "polling.interval_ms must be > 0, got {}",
            self.polling.interval_ms
        );
        anyhow::ensure!(
            self.source.timeout_ms <= self.polling.interval_ms,
            "source.timeout_ms ({}) must not exceed polling.interval_ms ({})",
            self.source.timeout_ms,
            self.polling.interval_ms
        );
        anyhow::ensure!(
            self.polling.history_len > 0,
            "polling.history_len must be > 0, got {}",
            self.polling.history_len
        );
        if let Some(limit) = self.alarm.memory_limit {
            anyhow::ensure!(
                limit <= 100,
                "alarm.memory_limit must be between 0 and 100, got {}",
                limit
            );
        }
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        Ok(())
    }
}
