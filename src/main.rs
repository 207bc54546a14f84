use std::fs::File;
use std::fs::OpenOptions;
use std::path::Path;

use dtelemetry::CollectorBuilder;
use dtelemetry::ControlSurface;
use dtelemetry::Error;
use dtelemetry::Result;
use dtelemetry::TelemetryNodeConfig;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let settings = TelemetryNodeConfig::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(&settings.server.log_dir)?;
    info!(?settings, "telemetry collector configuration loaded");

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());

    // Build Collector
    let handle = CollectorBuilder::new(settings, graceful_rx).build()?.spawn();

    // Listen on Reload Signal
    let control = handle.control().clone();
    let mut reload_shutdown = graceful_tx.subscribe();
    tokio::spawn(async move {
        if let Err(e) = reload_on_hangup(control, &mut reload_shutdown).await {
            error!("Failed to listen for SIGHUP: {:?}", e);
        }
    });

    info!("Application started. Waiting for CTRL+C signal...");
    // Listen on Shutdown Signal
    tokio::spawn(async {
        if let Err(e) = graceful_shutdown(graceful_tx).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    match handle.join().await {
        Ok(stats) => info!(?stats, "telemetry collector stopped"),
        Err(e) => error!("collector stops: {:?}", e),
    }

    println!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(graceful_tx: watch::Sender<()>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    info!("Shutdown collector..");
    graceful_tx.send(()).map_err(|e| {
        error!("Failed to send shutdown signal: {}", e);
        Error::SignalSenderClosed(format!("Failed to send shutdown signal: {}", e))
    })?;

    info!("Shutdown completed");
    Ok(())
}

/// Re-reads the configuration on SIGHUP and publishes its telemetry
/// parameters. Server and cluster sections are not reloaded.
async fn reload_on_hangup(
    control: std::sync::Arc<ControlSurface>,
    shutdown: &mut watch::Receiver<()>,
) -> Result<()> {
    let mut sighup = signal(SignalKind::hangup())?;
    loop {
        tokio::select! {
            _ = shutdown.changed() => return Ok(()),
            received = sighup.recv() => {
                if received.is_none() {
                    return Ok(());
                }
            }
        }

        info!("SIGHUP detected, reloading telemetry parameters.");
        let next = match TelemetryNodeConfig::new().and_then(|c| c.validate()) {
            Ok(config) => config.telemetry.control_state(),
            Err(e) => {
                warn!(error = %e, "configuration reload rejected, keeping current parameters");
                continue;
            }
        };
        if let Err(e) = control.update(|state| *state = next.clone()) {
            warn!(error = %e, "telemetry parameters rejected, keeping current parameters");
        }
    }
}

pub fn init_observability(log_dir: &Path) -> Result<WorkerGuard> {
    let log_file = open_file_for_append(&log_dir.join("telemetry.log"))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();

    Ok(guard)
}

fn open_file_for_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}
