use std::path::Path;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use alertdeck_core::app_state::build_app_state;
use alertdeck_core::core::config::app_config::AppConfig;
use alertdeck_core::scheduler;

/// Console logging plus an optional daily rolling file. The returned guard
/// flushes the file writer on drop.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "alertdeck.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let _guard = init_tracing(config.log_dir.as_deref());

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown requested");
                    shutdown.cancel();
                }
                Err(e) => error!(error = ?e, "Failed to listen for ctrl-c"),
            }
        });
    }

    loop {
        let state = build_app_state(config.clone());
        let session = shutdown.child_token();
        let reload = CancellationToken::new();

        let watcher = {
            let session = session.clone();
            let reload = reload.clone();
            tokio::spawn(async move {
                reload.cancelled().await;
                session.cancel();
            })
        };

        scheduler::run(state, session, reload.clone()).await?;
        watcher.abort();

        if shutdown.is_cancelled() || !reload.is_cancelled() {
            break;
        }
        info!("Rebuilding dashboard state after crash");
    }

    Ok(())
}
