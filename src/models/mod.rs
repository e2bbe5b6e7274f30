// Domain models: fetched snapshots and the published monitor view

mod snapshot;
mod state;

pub use snapshot::{DiskInfo, NetworkInfo, Snapshot};
pub use state::{AlarmStatus, MonitorState, StreamFrame};
