use anyhow::Result;
use healthwatch::*;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let source = source::ConfiguredSource::from_config(&app_config.source)?;
    tracing::info!(
        source = %source.describe(),
        interval_ms = app_config.polling.interval_ms,
        history_len = app_config.polling.history_len,
        "Starting poller"
    );

    let poller = poller::Poller::new(
        source,
        poller::PollerConfig {
            interval_ms: app_config.polling.interval_ms,
            history_len: app_config.polling.history_len,
            memory_limit: app_config.alarm.memory_limit()?,
            event_capacity: app_config.publishing.broadcast_capacity,
        },
    );
    let control = poller.control();
    let notifications_delivered = Arc::new(AtomicU64::new(0));
    let notifier_handle =
        notifier::spawn(control.subscribe_events(), notifications_delivered.clone());

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let poller_handle = poller.spawn(shutdown_rx);

    let app = routes::app(control);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    let _ = poller_handle.await;
    // Exits once every event sender is gone; don't hang on a lingering router clone.
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), notifier_handle).await;
    tracing::info!(
        notifications_delivered =
            notifications_delivered.load(std::sync::atomic::Ordering::Relaxed),
        "Stopped"
    );

    Ok(())
}
