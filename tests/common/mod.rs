// Shared test helpers: canned snapshots and fake metrics sources

#![allow(dead_code)]

use healthwatch::models::*;
use healthwatch::source::{FetchError, MetricsSource};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Notify, watch};
use tokio::time::{Duration, Instant};

pub fn snapshot(cpu: f64, memory: f64) -> Snapshot {
    Snapshot {
        cpu_usage_pct: cpu,
        memory_usage_pct: memory,
        disks: vec![DiskInfo {
            mount_name: "/".into(),
            total_gb: 100.0,
            used_gb: 40.0,
        }],
        network: NetworkInfo {
            ip: "10.0.0.2".into(),
            subnet_mask: "255.255.255.0".into(),
            gateway: "10.0.0.1".into(),
            dns_servers: vec!["1.1.1.1".into()],
        },
    }
}

pub fn unreachable() -> FetchError {
    FetchError::Unreachable("connection refused".into())
}

/// Replays a fixed list of outcomes; once exhausted, fetches never complete.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Snapshot, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Snapshot, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MetricsSource for ScriptedSource {
    async fn fetch(&self) -> Result<Snapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}

/// Fetch that blocks until the test releases it.
pub struct GatedSource {
    pub entered: Notify,
    pub release: Notify,
    pub memory: f64,
}

impl GatedSource {
    pub fn new(memory: f64) -> Arc<Self> {
        Arc::new(Self {
            entered: Notify::new(),
            release: Notify::new(),
            memory,
        })
    }
}

impl MetricsSource for GatedSource {
    async fn fetch(&self) -> Result<Snapshot, FetchError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(snapshot(5.0, self.memory))
    }
}

/// Each fetch takes `delay` to complete; records when every fetch started.
pub struct SlowSource {
    pub delay: Duration,
    pub starts: Mutex<Vec<Instant>>,
}

impl SlowSource {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            starts: Mutex::new(Vec::new()),
        })
    }

    pub fn starts(&self) -> Vec<Instant> {
        self.starts.lock().unwrap().clone()
    }
}

impl MetricsSource for SlowSource {
    async fn fetch(&self) -> Result<Snapshot, FetchError> {
        self.starts.lock().unwrap().push(Instant::now());
        tokio::time::sleep(self.delay).await;
        Ok(snapshot(1.0, 1.0))
    }
}

/// Waits until the poller has completed at least `n` cycles.
pub async fn wait_for_cycles(
    rx: &mut watch::Receiver<Arc<MonitorState>>,
    n: u64,
) -> Arc<MonitorState> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let state = rx.borrow_and_update().clone();
            if state.cycles >= n {
                return state;
            }
            rx.changed().await.expect("poller stopped");
        }
    })
    .await
    .expect("timed out waiting for poll cycles")
}
