// WebSocket /ws/state: current view on connect, then every publish and alarm event

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::alarm::AlarmEvent;
use crate::models::{MonitorState, StreamFrame};

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) async fn ws_state(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let state_rx = state.control.watch_state();
    let events_rx = state.control.subscribe_events();
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = stream_state(socket, state_rx, events_rx).await {
            tracing::info!("State stream error: {}", e);
        }
    })
}

/// Sends one frame; false when the client is gone or too slow.
async fn send_frame(socket: &mut WebSocket, frame: &StreamFrame) -> anyhow::Result<bool> {
    let json = serde_json::to_string(frame)?;
    let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
    Ok(matches!(r, Ok(Ok(()))))
}

fn current(state_rx: &mut watch::Receiver<Arc<MonitorState>>) -> StreamFrame {
    StreamFrame::State(state_rx.borrow_and_update().as_ref().clone())
}

async fn stream_state(
    mut socket: WebSocket,
    mut state_rx: watch::Receiver<Arc<MonitorState>>,
    mut events_rx: broadcast::Receiver<AlarmEvent>,
) -> anyhow::Result<()> {
    tracing::info!("Client connected to state stream");

    let frame = current(&mut state_rx);
    if !send_frame(&mut socket, &frame).await? {
        return Ok(());
    }

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = current(&mut state_rx);
                if !send_frame(&mut socket, &frame).await? {
                    break;
                }
            }
            result = events_rx.recv() => {
                match result {
                    Ok(event) => {
                        if !send_frame(&mut socket, &StreamFrame::Alarm(event)).await? {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/state client lagged, skipped {} alarm events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}
