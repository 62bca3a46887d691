use std::sync::Mutex;

use tracing::error;

pub const RELOAD_SECONDS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrashTick {
    Idle,
    Counting(u32),
    Reload,
}

#[derive(Debug, Default)]
struct GuardState {
    last_error: Option<String>,
    seconds_left: Option<u32>,
}

/// Turns an uncaught error into a reload after a countdown, so unattended
/// screens recover on their own.
#[derive(Debug, Default)]
pub struct CrashGuard {
    dsn: Option<String>,
    state: Mutex<GuardState>,
}

impl CrashGuard {
    pub fn new(dsn: Option<String>) -> Self {
        Self {
            dsn,
            state: Mutex::default(),
        }
    }

    /// Report an error and start the countdown unless one is running.
    pub fn report(&self, message: impl Into<String>) {
        let message = message.into();
        match &self.dsn {
            Some(dsn) => error!(dsn = %dsn, error = %message, "Uncaught error"),
            None => error!(error = %message, "Uncaught error"),
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.last_error = Some(message);
        if state.seconds_left.is_none() {
            state.seconds_left = Some(RELOAD_SECONDS);
        }
    }

    pub fn last_error(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last_error
            .clone()
    }

    pub fn seconds_left(&self) -> Option<u32> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).seconds_left
    }

    /// Advance the countdown by one second.
    pub fn tick(&self) -> CrashTick {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match state.seconds_left {
            None => CrashTick::Idle,
            Some(s) if s <= 1 => CrashTick::Reload,
            Some(s) => {
                state.seconds_left = Some(s - 1);
                CrashTick::Counting(s - 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_without_errors() {
        let guard = CrashGuard::new(None);
        assert_eq!(guard.tick(), CrashTick::Idle);
        assert!(guard.last_error().is_none());
    }

    #[test]
    fn countdown_reaches_reload() {
        let guard = CrashGuard::new(Some("https://key@sentry.example.com/1".into()));
        guard.report("boom");
        let mut ticks = 0;
        while guard.tick() != CrashTick::Reload {
            ticks += 1;
        }
        assert_eq!(ticks, RELOAD_SECONDS - 1);
    }

    #[test]
    fn repeated_errors_do_not_restart_the_countdown() {
        let guard = CrashGuard::new(None);
        guard.report("first");
        guard.tick();
        guard.tick();
        guard.report("second");
        assert_eq!(guard.seconds_left(), Some(RELOAD_SECONDS - 2));
        assert_eq!(guard.last_error().as_deref(), Some("second"));
    }
}
