// Local collector: samples the host this process runs on via sysinfo

use super::linux;
use super::{FetchError, MetricsSource, validate};
use crate::models::{DiskInfo, NetworkInfo, Snapshot};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use sysinfo::{Disks, Networks, System};
use tracing::instrument;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

pub struct LocalMetricsSource {
    sys: Arc<Mutex<System>>,
    disks: Arc<Mutex<Disks>>,
    networks: Arc<Mutex<Networks>>,
}

impl Default for LocalMetricsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalMetricsSource {
    pub fn new() -> Self {
        let mut sys = System::new();
        // Baseline for the first CPU usage delta.
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        Self {
            sys: Arc::new(Mutex::new(sys)),
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
        }
    }

    fn collect(
        sys: &Mutex<System>,
        disks: &Mutex<Disks>,
        networks: &Mutex<Networks>,
    ) -> Result<Snapshot, FetchError> {
        let (cpu_usage_pct, memory_usage_pct) = {
            let mut sys = sys
                .lock()
                .map_err(|e| FetchError::Collector(format!("sysinfo lock poisoned: {}", e)))?;
            sys.refresh_cpu_usage();
            sys.refresh_memory();
            let total = sys.total_memory();
            let used = total.saturating_sub(sys.available_memory());
            let memory = if total > 0 {
                (used as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            (f64::from(sys.global_cpu_usage()), memory)
        };

        let disks = {
            let mut guard = disks
                .lock()
                .map_err(|e| FetchError::Collector(format!("sysinfo disks lock poisoned: {}", e)))?;
            guard.refresh(false);
            guard
                .list()
                .iter()
                .map(|d| {
                    let total = d.total_space();
                    let used = total.saturating_sub(d.available_space());
                    DiskInfo {
                        mount_name: d.mount_point().to_string_lossy().into_owned(),
                        total_gb: total as f64 / BYTES_PER_GB,
                        used_gb: used as f64 / BYTES_PER_GB,
                    }
                })
                .collect()
        };

        let network = {
            let mut guard = networks.lock().map_err(|e| {
                FetchError::Collector(format!("sysinfo networks lock poisoned: {}", e))
            })?;
            guard.refresh(true);
            let mut names: Vec<&String> = guard.list().keys().collect();
            names.sort();
            let primary = names.into_iter().find_map(|name| {
                guard.list().get(name)?.ip_networks().iter().find_map(|n| match n.addr {
                    IpAddr::V4(v4) if !v4.is_loopback() => Some((v4, n.prefix)),
                    _ => None,
                })
            });
            let (ip, subnet_mask) = primary
                .map(|(ip, prefix)| {
                    (
                        ip.to_string(),
                        linux::subnet_mask_from_prefix(prefix).to_string(),
                    )
                })
                .unwrap_or_default();
            NetworkInfo {
                ip,
                subnet_mask,
                gateway: linux::read_default_gateway().unwrap_or_default(),
                dns_servers: linux::read_dns_servers(),
            }
        };

        Ok(Snapshot {
            cpu_usage_pct,
            memory_usage_pct,
            disks,
            network,
        })
    }
}

impl MetricsSource for LocalMetricsSource {
    #[instrument(skip(self), fields(source = "local", operation = "fetch"))]
    async fn fetch(&self) -> Result<Snapshot, FetchError> {
        let sys = self.sys.clone();
        let disks = self.disks.clone();
        let networks = self.networks.clone();
        let snapshot = tokio::task::spawn_blocking(move || Self::collect(&sys, &disks, &networks))
            .await
            .map_err(|e| FetchError::Collector(format!("sysinfo task join: {}", e)))??;
        validate(snapshot)
    }
}
