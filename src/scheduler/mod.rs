use anyhow::Result;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::app_state::AppState;

pub mod tasks;

/// Spawn every background task and wait for all of them to stop.
///
/// A task that fails or panics is reported to the crash guard, which in turn
/// cancels `reload` once its countdown runs out.
pub async fn run(state: AppState, shutdown: CancellationToken, reload: CancellationToken) -> Result<()> {
    let mut set = JoinSet::new();

    set.spawn(named("poll", tasks::poll::task::run(state.clone(), shutdown.clone())));
    set.spawn(named(
        "notifications",
        tasks::notifications::task::run(state.clone(), shutdown.clone()),
    ));
    set.spawn(named("history", tasks::history::task::run(state.clone(), shutdown.clone())));
    set.spawn(named(
        "crash",
        tasks::crash::task::run(state.clone(), shutdown.clone(), reload.clone()),
    ));
    info!(tasks = set.len(), "Scheduler started");

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((name, Err(e))) => {
                error!(task = name, error = ?e, "Background task failed");
                state.crash_guard.report(format!("{name}: {e:#}"));
            }
            Err(e) => {
                error!(error = ?e, "Background task panicked");
                state.crash_guard.report(e.to_string());
            }
        }
    }

    info!("Scheduler stopped");
    Ok(())
}

async fn named<F>(name: &'static str, task: F) -> (&'static str, Result<()>)
where
    F: std::future::Future<Output = Result<()>>,
{
    (name, task.await)
}
