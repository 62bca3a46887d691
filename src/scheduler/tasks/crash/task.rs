use std::time::Duration;

use anyhow::Result;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::domain::bootstrap::crash_guard::CrashTick;

/// Drive the crash guard countdown and request a reload when it runs out.
pub async fn run(state: AppState, shutdown: CancellationToken, reload: CancellationToken) -> Result<()> {
    run_every(state, Duration::from_secs(1), shutdown, reload).await
}

async fn run_every(
    state: AppState,
    period: Duration,
    shutdown: CancellationToken,
    reload: CancellationToken,
) -> Result<()> {
    let mut ticker = interval(period);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }
        match state.crash_guard.tick() {
            CrashTick::Idle => {}
            CrashTick::Counting(left) if left % 10 == 0 => {
                info!(seconds_left = left, "Reloading after crash");
            }
            CrashTick::Counting(_) => {}
            CrashTick::Reload => {
                warn!(
                    error = %state.crash_guard.last_error().unwrap_or_default(),
                    "Crash countdown finished, reloading"
                );
                reload.cancel();
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::time::timeout;

    use crate::app_state::tests::test_state;
    use crate::core::client::fetch_retry::tests::ScriptedTransport;

    #[tokio::test]
    async fn reported_error_ends_in_reload() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), Arc::new(ScriptedTransport::default()));
        let reload = CancellationToken::new();
        state.crash_guard.report("boom");

        timeout(
            Duration::from_secs(5),
            run_every(state, Duration::from_millis(1), CancellationToken::new(), reload.clone()),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(reload.is_cancelled());
    }

    #[tokio::test]
    async fn idle_guard_never_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), Arc::new(ScriptedTransport::default()));
        let shutdown = CancellationToken::new();
        let reload = CancellationToken::new();
        let handle = tokio::spawn(run_every(
            state,
            Duration::from_millis(1),
            shutdown.clone(),
            reload.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
        handle.await.unwrap().unwrap();
        assert!(!reload.is_cancelled());
    }
}
