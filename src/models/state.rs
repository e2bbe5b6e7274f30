// Published monitor view (immutable copy handed to subscribers)

use serde::{Deserialize, Serialize};

use super::{DiskInfo, NetworkInfo};
use crate::alarm::{AlarmEvent, AlarmState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmStatus {
    pub limit: Option<f64>,
    pub state: AlarmState,
}

/// Everything presentation needs to render one frame.
///
/// Disk and network data are the last successful fetch (stale-but-available); `last_error`
/// is set when the most recent poll failed and cleared by the next success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorState {
    /// CPU usage history, oldest first, always `history_len` long.
    pub cpu_history: Vec<f64>,
    /// RAM usage history, same shape as `cpu_history`.
    pub ram_history: Vec<f64>,
    pub disks: Vec<DiskInfo>,
    /// `None` until the first successful fetch.
    pub network: Option<NetworkInfo>,
    pub last_error: Option<String>,
    pub alarm: AlarmStatus,
    /// Completed poll cycles, successful or not.
    pub cycles: u64,
    pub consecutive_failures: u32,
    /// Unix time (ms) of the last successful fetch.
    pub last_success_ms: Option<i64>,
}

/// Frame sent on the /ws/state stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum StreamFrame {
    State(MonitorState),
    Alarm(AlarmEvent),
}
