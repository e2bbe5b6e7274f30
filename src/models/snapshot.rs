// One fetched sample of every monitored metric

use serde::{Deserialize, Serialize};

/// Mounted volume as reported by the collector. Sizes are in GB.
///
/// `used_gb <= total_gb` is expected but not enforced; see [`DiskInfo::is_overcommitted`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskInfo {
    #[serde(rename = "name")]
    pub mount_name: String,
    #[serde(rename = "total")]
    pub total_gb: f64,
    #[serde(rename = "used")]
    pub used_gb: f64,
}

impl DiskInfo {
    /// True when the collector reported more used space than the volume holds.
    pub fn is_overcommitted(&self) -> bool {
        self.used_gb > self.total_gb
    }

    pub fn has_negative_size(&self) -> bool {
        self.total_gb < 0.0 || self.used_gb < 0.0
    }

    pub fn usage_percent(&self) -> f64 {
        if self.total_gb > 0.0 {
            (self.used_gb / self.total_gb) * 100.0
        } else {
            0.0
        }
    }
}

/// Network configuration of the monitored host; replaced wholesale on every fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub ip: String,
    pub subnet_mask: String,
    pub gateway: String,
    pub dns_servers: Vec<String>,
}

/// Produced atomically by one fetch; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub cpu_usage_pct: f64,
    pub memory_usage_pct: f64,
    pub disks: Vec<DiskInfo>,
    pub network: NetworkInfo,
}
