// Poll loop: fetch a snapshot on a fixed period, update the rolling histories and the
// memory alarm, publish an immutable view to subscribers.
// All monitoring state is owned by the poll task; the only external mutation is the
// limit command, which is applied between fetch completion and evaluation.

use crate::alarm::{AlarmEvent, MemoryLimit, ThresholdAlarm};
use crate::models::{AlarmStatus, DiskInfo, MonitorState, NetworkInfo, Snapshot};
use crate::rolling_window::RollingWindow;
use crate::source::{FetchError, MetricsSource};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};
use tracing::Instrument;

/// Poll timing, history size and initial alarm limit.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval_ms: u64,
    pub history_len: usize,
    pub memory_limit: Option<MemoryLimit>,
    /// Capacity of the alarm event broadcast channel.
    pub event_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("poller has stopped")]
    Stopped,
}

#[derive(Debug)]
enum Command {
    SetLimit {
        limit: Option<MemoryLimit>,
        /// Signalled once the new limit is applied and published.
        ack: Option<oneshot::Sender<()>>,
    },
}

/// Cloneable handle for observers and the limit reconfiguration entry point.
#[derive(Clone)]
pub struct PollerControl {
    state_rx: watch::Receiver<Arc<MonitorState>>,
    events_tx: broadcast::Sender<AlarmEvent>,
    commands_tx: mpsc::UnboundedSender<Command>,
}

impl PollerControl {
    /// Latest published view.
    pub fn state(&self) -> Arc<MonitorState> {
        self.state_rx.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<Arc<MonitorState>> {
        self.state_rx.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AlarmEvent> {
        self.events_tx.subscribe()
    }

    /// Queues a new memory limit (`None` = unset). Takes effect before the next sample is
    /// evaluated, including one whose fetch is already in flight. The published
    /// `alarm.limit` only changes once the poll task picks the command up; use
    /// [`PollerControl::reconfigure_limit`] to wait for that.
    pub fn set_limit(&self, limit: Option<MemoryLimit>) -> Result<(), ControlError> {
        self.commands_tx
            .send(Command::SetLimit { limit, ack: None })
            .map_err(|_| ControlError::Stopped)
    }

    /// Replaces the memory limit and returns once the poll task has applied it and
    /// published the updated view.
    pub async fn reconfigure_limit(&self, limit: Option<MemoryLimit>) -> Result<(), ControlError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.commands_tx
            .send(Command::SetLimit {
                limit,
                ack: Some(ack_tx),
            })
            .map_err(|_| ControlError::Stopped)?;
        ack_rx.await.map_err(|_| ControlError::Stopped)
    }
}

/// Histories, latest disk/network data and alarm; the single writer of monitor state.
struct Monitor {
    cpu: RollingWindow<f64>,
    ram: RollingWindow<f64>,
    alarm: ThresholdAlarm,
    disks: Vec<DiskInfo>,
    network: Option<NetworkInfo>,
    last_error: Option<String>,
    cycles: u64,
    consecutive_failures: u32,
    last_success_ms: Option<i64>,
    state_tx: watch::Sender<Arc<MonitorState>>,
    events_tx: broadcast::Sender<AlarmEvent>,
}

impl Monitor {
    fn view(&self) -> MonitorState {
        MonitorState {
            cpu_history: self.cpu.to_vec(),
            ram_history: self.ram.to_vec(),
            disks: self.disks.clone(),
            network: self.network.clone(),
            last_error: self.last_error.clone(),
            alarm: AlarmStatus {
                limit: self.alarm.limit(),
                state: self.alarm.state(),
            },
            cycles: self.cycles,
            consecutive_failures: self.consecutive_failures,
            last_success_ms: self.last_success_ms,
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(Arc::new(self.view()));
    }

    fn set_limit(&mut self, limit: Option<MemoryLimit>) {
        self.alarm.set_limit(limit);
        tracing::info!(
            limit = limit.map(MemoryLimit::percent),
            operation = "set_limit",
            "memory limit reconfigured"
        );
        self.publish();
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SetLimit { limit, ack } => {
                self.set_limit(limit);
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
            }
        }
    }

    fn apply(&mut self, result: Result<Snapshot, FetchError>) -> Option<AlarmEvent> {
        self.cycles += 1;
        let event = match result {
            Ok(snapshot) => {
                if self.consecutive_failures > 0 {
                    tracing::info!(
                        failures = self.consecutive_failures,
                        "metrics source recovered"
                    );
                }
                self.cpu.push(snapshot.cpu_usage_pct);
                self.ram.push(snapshot.memory_usage_pct);
                self.disks = snapshot.disks;
                self.network = Some(snapshot.network);
                self.last_error = None;
                self.consecutive_failures = 0;
                self.last_success_ms = Some(chrono::Utc::now().timestamp_millis());
                tracing::debug!(
                    cpu = snapshot.cpu_usage_pct,
                    memory = snapshot.memory_usage_pct,
                    "sample applied"
                );
                self.alarm.evaluate(snapshot.memory_usage_pct)
            }
            Err(e) => {
                if self.consecutive_failures == 0 {
                    tracing::warn!(error = %e, operation = "fetch", "metrics fetch failed");
                } else {
                    tracing::debug!(
                        error = %e,
                        operation = "fetch",
                        failures = self.consecutive_failures + 1,
                        "metrics fetch still failing"
                    );
                }
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.last_error = Some(e.to_string());
                None
            }
        };
        self.publish();
        if let Some(event) = event
            && self.events_tx.send(event).is_err()
        {
            tracing::debug!(?event, "no alarm subscribers");
        }
        event
    }
}

/// Drives the fetch → apply → publish cycle for one metrics source.
pub struct Poller<S> {
    source: S,
    interval: Duration,
    monitor: Monitor,
    commands_rx: mpsc::UnboundedReceiver<Command>,
    commands_tx: mpsc::UnboundedSender<Command>,
}

impl<S: MetricsSource> Poller<S> {
    /// Histories start pre-filled with zeros and the initial view is published immediately.
    pub fn new(source: S, config: PollerConfig) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let (state_tx, _) = watch::channel(Arc::new(MonitorState::default()));
        let monitor = Monitor {
            cpu: RollingWindow::with_capacity(config.history_len),
            ram: RollingWindow::with_capacity(config.history_len),
            alarm: ThresholdAlarm::new(config.memory_limit),
            disks: Vec::new(),
            network: None,
            last_error: None,
            cycles: 0,
            consecutive_failures: 0,
            last_success_ms: None,
            state_tx,
            events_tx,
        };
        monitor.publish();
        Self {
            source,
            interval: Duration::from_millis(config.interval_ms),
            monitor,
            commands_rx,
            commands_tx,
        }
    }

    pub fn control(&self) -> PollerControl {
        PollerControl {
            state_rx: self.monitor.state_tx.subscribe(),
            events_tx: self.monitor.events_tx.clone(),
            commands_tx: self.commands_tx.clone(),
        }
    }

    /// Current view, computed from the owned state.
    pub fn state(&self) -> MonitorState {
        self.monitor.view()
    }

    /// Replaces the limit directly (for callers that own the poller rather than a control).
    pub fn set_limit(&mut self, limit: Option<MemoryLimit>) {
        self.monitor.set_limit(limit);
    }

    /// Applies one fetch outcome: on success updates histories, disks, network and the alarm;
    /// on failure only records the error. Returns the alarm transition, if any.
    pub fn apply(&mut self, result: Result<Snapshot, FetchError>) -> Option<AlarmEvent> {
        self.drain_commands();
        self.monitor.apply(result)
    }

    /// Runs one fetch + apply cycle without the timer.
    pub async fn poll_once(&mut self) -> Option<AlarmEvent> {
        let result = self.source.fetch().await;
        self.apply(result)
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands_rx.try_recv() {
            self.monitor.handle(command);
        }
    }

    /// Spawns the poll loop. It ticks once immediately, then every interval; ticks that fire
    /// while a fetch is outstanding are dropped. Sending on (or dropping) the shutdown sender
    /// stops the loop and discards any in-flight fetch.
    pub fn spawn(self, shutdown_rx: oneshot::Receiver<()>) -> tokio::task::JoinHandle<()> {
        let span = tracing::debug_span!("poller", interval_ms = self.interval.as_millis() as u64);
        tokio::spawn(self.run(shutdown_rx).instrument(span))
    }

    async fn run(mut self, mut shutdown_rx: oneshot::Receiver<()>) {
        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                scheduled = tick.tick() => {
                    let fetched = {
                        let fetch = self.source.fetch();
                        tokio::pin!(fetch);
                        loop {
                            tokio::select! {
                                result = &mut fetch => break Some(result),
                                Some(command) = self.commands_rx.recv() => self.monitor.handle(command),
                                _ = &mut shutdown_rx => break None,
                            }
                        }
                    };
                    match fetched {
                        Some(result) => {
                            self.drain_commands();
                            self.monitor.apply(result);
                            let now = Instant::now();
                            if now >= scheduled + self.interval {
                                tick.reset_at(next_boundary(scheduled, now, self.interval));
                            }
                        }
                        None => {
                            tracing::debug!("Poller shutting down; in-flight fetch discarded");
                            break;
                        }
                    }
                }
                Some(command) = self.commands_rx.recv() => self.monitor.handle(command),
                _ = &mut shutdown_rx => {
                    tracing::debug!("Poller shutting down");
                    break;
                }
            }
        }
    }
}

/// First period boundary (counted from `scheduled`) strictly after `now`. Ticks that fell
/// due while a fetch was outstanding are dropped rather than fired late.
fn next_boundary(scheduled: Instant, now: Instant, period: Duration) -> Instant {
    let period_nanos = period.as_nanos().max(1);
    let elapsed = now.saturating_duration_since(scheduled).as_nanos();
    let periods = u32::try_from(elapsed / period_nanos + 1).unwrap_or(u32::MAX);
    scheduled + period * periods
}
