use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::client::fetch_retry::{FetchEvent, FetchRetry};
use crate::core::client::http_transport::{HttpRequest, ResponseBody};
use crate::core::state::reactive::observable::Observable;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPhase {
    #[default]
    Idle,
    Loading,
    Retrying,
    Success,
    Failed,
}

/// Caller visible state of a retried GET.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchState {
    pub phase: FetchPhase,
    pub response: Option<ResponseBody>,
    pub error: Option<String>,
    pub is_loading: bool,
    pub is_retrying: bool,
    pub retry_count: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct FetchGetOptions {
    /// Run on mount and on every dependency change.
    pub autorun: bool,
}

impl Default for FetchGetOptions {
    fn default() -> Self {
        Self { autorun: true }
    }
}

/// A single URI fetched through the retry engine, with observable state.
pub struct FetchGet {
    engine: Arc<FetchRetry>,
    request: HttpRequest,
    options: FetchGetOptions,
    state: Observable<FetchState>,
    current: Mutex<CancellationToken>,
    lifecycle: CancellationToken,
}

impl FetchGet {
    pub fn new(engine: Arc<FetchRetry>, request: HttpRequest, options: FetchGetOptions) -> Arc<Self> {
        Arc::new(Self {
            engine,
            request,
            options,
            state: Observable::default(),
            current: Mutex::new(CancellationToken::new()),
            lifecycle: CancellationToken::new(),
        })
    }

    pub fn state(&self) -> Arc<FetchState> {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<FetchState>> {
        self.state.subscribe()
    }

    /// Cancel whatever is in flight and install a fresh token for the next run.
    fn renew_token(&self) -> CancellationToken {
        let mut guard = match self.current.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.cancel();
        *guard = self.lifecycle.child_token();
        guard.clone()
    }

    /// Run the request once. A newer `get` or `cancel` silences this one.
    pub async fn get(&self) {
        let token = self.renew_token();
        if token.is_cancelled() {
            return;
        }

        self.state.update(|s| {
            s.phase = FetchPhase::Loading;
            s.is_loading = true;
            s.is_retrying = false;
            s.retry_count = 0;
        });

        let state = &self.state;
        let guard = token.clone();
        let result = self
            .engine
            .fetch(self.request.clone(), &token, move |event| {
                if guard.is_cancelled() {
                    return;
                }
                match event {
                    FetchEvent::Attempt(n) if n > 1 => state.update(|s| {
                        s.phase = FetchPhase::Loading;
                        s.is_loading = true;
                    }),
                    FetchEvent::Attempt(_) => {}
                    FetchEvent::Retry(n) => state.update(|s| {
                        s.phase = FetchPhase::Retrying;
                        s.is_loading = false;
                        s.is_retrying = true;
                        s.retry_count = n;
                    }),
                }
            })
            .await;

        if token.is_cancelled() {
            debug!(uri = %self.request.uri, "Fetch cancelled, dropping result");
            return;
        }

        match result {
            Ok(resp) => self.state.update(|s| {
                s.phase = FetchPhase::Success;
                s.response = Some(resp.parsed_body());
                s.error = None;
                s.is_loading = false;
                s.is_retrying = false;
            }),
            Err(AppError::Cancelled) => {}
            Err(err) => self.state.update(|s| {
                s.phase = FetchPhase::Failed;
                s.error = Some(err.message());
                s.is_loading = false;
                s.is_retrying = false;
            }),
        }
    }

    pub fn cancel(&self) {
        let guard = match self.current.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.cancel();
    }

    /// Spawn the autorun loop. With `autorun=false` the task only waits for
    /// unmount and `get` has to be called by hand.
    pub fn mount<D>(self: &Arc<Self>, mut deps: watch::Receiver<D>) -> JoinHandle<()>
    where
        D: Send + Sync + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move {
            if !this.options.autorun {
                this.lifecycle.cancelled().await;
                return;
            }
            deps.borrow_and_update();
            loop {
                tokio::select! {
                    _ = this.lifecycle.cancelled() => break,
                    changed = deps.changed() => {
                        if changed.is_err() {
                            this.lifecycle.cancelled().await;
                            break;
                        }
                        // dependency moved mid-flight, start over
                        continue;
                    }
                    _ = this.get() => {}
                }
                tokio::select! {
                    _ = this.lifecycle.cancelled() => break,
                    changed = deps.changed() => {
                        if changed.is_err() {
                            this.lifecycle.cancelled().await;
                            break;
                        }
                    }
                }
            }
        })
    }

    pub fn unmount(&self) {
        self.lifecycle.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::fetch_retry::tests::{ok_json, ScriptedTransport};
    use crate::core::client::fetch_retry::RetryPolicy;
    use crate::core::client::http_transport::HttpResponse;

    fn fetcher(transport: Arc<ScriptedTransport>, retries: u32, autorun: bool) -> Arc<FetchGet> {
        let engine = Arc::new(FetchRetry::new(transport, RetryPolicy::immediate(retries)));
        FetchGet::new(
            engine,
            HttpRequest::get("http://localhost/alerts.json"),
            FetchGetOptions { autorun },
        )
    }

    #[tokio::test]
    async fn success_parses_json_body() {
        let transport = Arc::new(ScriptedTransport::always(ok_json(r#"{"status":"success"}"#)));
        let f = fetcher(transport, 9, false);

        f.get().await;

        let s = f.state();
        assert_eq!(s.phase, FetchPhase::Success);
        assert_eq!(
            s.response,
            Some(ResponseBody::Json(serde_json::json!({"status": "success"})))
        );
        assert!(!s.is_loading);
        assert!(!s.is_retrying);
    }

    #[tokio::test]
    async fn text_body_is_kept_as_text() {
        let transport = Arc::new(ScriptedTransport::always(Ok(HttpResponse {
            status: 200,
            content_type: Some("text/plain".into()),
            body: "ok".into(),
            opaque: false,
        })));
        let f = fetcher(transport, 0, false);
        f.get().await;
        assert_eq!(f.state().response, Some(ResponseBody::Text("ok".into())));
    }

    #[tokio::test]
    async fn exhausted_retries_settle_failed() {
        let transport = Arc::new(ScriptedTransport::always(Err(AppError::Transport(
            "Fetch error".into(),
        ))));
        let f = fetcher(transport.clone(), 3, false);

        f.get().await;

        let s = f.state();
        assert_eq!(s.phase, FetchPhase::Failed);
        assert_eq!(s.error.as_deref(), Some("Fetch error"));
        assert_eq!(s.retry_count, 4);
        assert!(!s.is_retrying);
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn cancel_before_run_leaves_state_untouched() {
        let transport = Arc::new(ScriptedTransport::always(ok_json("{}")));
        let f = fetcher(transport.clone(), 0, false);
        f.unmount();

        f.get().await;

        assert_eq!(*f.state(), FetchState::default());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn mount_autoruns_once_per_dependency_change() {
        let transport = Arc::new(ScriptedTransport::always(ok_json("{}")));
        let f = fetcher(transport.clone(), 0, true);
        let (tx, rx) = watch::channel(0u32);
        let mut states = f.subscribe();

        let handle = f.mount(rx);
        while states.borrow_and_update().phase != FetchPhase::Success {
            states.changed().await.unwrap();
        }
        assert_eq!(transport.calls(), 1);

        tx.send(1).unwrap();
        while transport.calls() < 2 {
            tokio::task::yield_now().await;
        }

        f.unmount();
        handle.await.unwrap();
        assert_eq!(transport.calls(), 2);
    }
}
