use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::client::http_transport::{HttpRequest, HttpResponse, HttpTransport, RequestMode};
use crate::errors::AppError;

/// Exponential backoff schedule for retried GETs.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt.
    pub retries: u32,
    pub min_timeout: Duration,
    pub max_timeout: Duration,
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 9,
            min_timeout: Duration::from_secs(1),
            max_timeout: Duration::from_secs(5),
            factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Same attempt count, no waiting between attempts.
    pub fn immediate(retries: u32) -> Self {
        Self {
            retries,
            min_timeout: Duration::ZERO,
            max_timeout: Duration::ZERO,
            factor: 1.0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Delay after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32) as i32;
        let scaled = self.min_timeout.as_secs_f64() * self.factor.powi(exp);
        let capped = scaled.min(self.max_timeout.as_secs_f64()).max(0.0);
        Duration::from_secs_f64(capped)
    }
}

/// Progress callbacks emitted while a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchEvent {
    /// Attempt `n` (1-based) is about to be sent.
    Attempt(u32),
    /// Attempt `n` failed; another may follow.
    Retry(u32),
}

/// Sequential retry loop around a single logical GET.
pub struct FetchRetry {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
}

impl FetchRetry {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        self.transport.clone()
    }

    /// Issue `request` until it succeeds, attempts run out or `cancel` fires.
    ///
    /// Opaque responses are returned as successes, the caller decides what an
    /// opaque body means. Non-2xx responses are turned into
    /// `AppError::HttpStatus` carrying the parsed error body.
    pub async fn fetch<F>(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> Result<HttpResponse, AppError>
    where
        F: FnMut(FetchEvent) + Send,
    {
        let attempts = self.policy.attempts();
        let mut last_error = AppError::Transport("no attempt was made".into());

        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }
            on_event(FetchEvent::Attempt(attempt));

            let mut req = request.clone();
            req.mode = if attempt <= self.policy.retries {
                RequestMode::Cors
            } else {
                RequestMode::NoCors
            };

            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(AppError::Cancelled),
                res = self.transport.send(req) => res,
            };

            match outcome {
                Ok(resp) if resp.is_success() || resp.opaque => {
                    debug!(uri = %request.uri, attempt, "Request settled");
                    return Ok(resp);
                }
                Ok(resp) => {
                    last_error = AppError::HttpStatus {
                        status: resp.status,
                        body: resp.error_text(),
                    };
                }
                Err(err) => last_error = err,
            }

            if cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }
            on_event(FetchEvent::Retry(attempt));

            if attempt < attempts {
                let delay = self.policy.delay_for(attempt);
                warn!(
                    uri = %request.uri,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %last_error,
                    "Request failed, retrying"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Err(AppError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::client::http_transport::HttpResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that replays scripted outcomes and records every request.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        pub script: Mutex<VecDeque<Result<HttpResponse, AppError>>>,
        pub fallback: Mutex<Option<Result<HttpResponse, AppError>>>,
        pub requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn always(outcome: Result<HttpResponse, AppError>) -> Self {
            let t = Self::default();
            *t.fallback.lock().unwrap() = Some(outcome);
            t
        }

        pub(crate) fn push(&self, outcome: Result<HttpResponse, AppError>) {
            self.script.lock().unwrap().push_back(outcome);
        }

        pub(crate) fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AppError> {
            self.requests.lock().unwrap().push(request);
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                return next;
            }
            self.fallback
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(AppError::Transport("script exhausted".into())))
        }
    }

    pub(crate) fn ok_json(body: &str) -> Result<HttpResponse, AppError> {
        Ok(HttpResponse {
            status: 200,
            content_type: Some("application/json".into()),
            body: body.into(),
            opaque: false,
        })
    }

    #[test]
    fn backoff_grows_and_caps() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_for(1), Duration::from_secs(1));
        assert_eq!(p.delay_for(2), Duration::from_secs(2));
        assert_eq!(p.delay_for(3), Duration::from_secs(4));
        assert_eq!(p.delay_for(4), Duration::from_secs(5));
        assert_eq!(p.delay_for(9), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn permanently_failing_endpoint_gets_retries_plus_one_attempts() {
        let transport = Arc::new(ScriptedTransport::always(Err(AppError::Transport(
            "Fetch error".into(),
        ))));
        let engine = FetchRetry::new(transport.clone(), RetryPolicy::immediate(9));
        let mut retries = Vec::new();

        let err = engine
            .fetch(HttpRequest::get("http://example.com"), &CancellationToken::new(), |e| {
                if let FetchEvent::Retry(n) = e {
                    retries.push(n);
                }
            })
            .await
            .unwrap_err();

        assert_eq!(err, AppError::Transport("Fetch error".into()));
        assert_eq!(transport.calls(), 10);
        assert_eq!(retries, (1..=10).collect::<Vec<_>>());

        let modes: Vec<RequestMode> = transport
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.mode)
            .collect();
        assert!(modes[..9].iter().all(|m| *m == RequestMode::Cors));
        assert_eq!(modes[9], RequestMode::NoCors);
    }

    #[tokio::test]
    async fn non_2xx_is_retried_and_error_body_is_parsed() {
        let transport = Arc::new(ScriptedTransport::always(Ok(HttpResponse {
            status: 500,
            content_type: Some("application/json".into()),
            body: r#"{"error":"upstream down"}"#.into(),
            opaque: false,
        })));
        let engine = FetchRetry::new(transport.clone(), RetryPolicy::immediate(2));

        let err = engine
            .fetch(HttpRequest::get("http://example.com"), &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AppError::HttpStatus {
                status: 500,
                body: "upstream down".into()
            }
        );
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn success_after_failure_stops_retrying() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Err(AppError::Transport("flaky".into())));
        transport.push(ok_json("{}"));
        let engine = FetchRetry::new(transport.clone(), RetryPolicy::immediate(9));

        let resp = engine
            .fetch(HttpRequest::get("http://example.com"), &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let transport = Arc::new(ScriptedTransport::always(ok_json("{}")));
        let engine = FetchRetry::new(transport.clone(), RetryPolicy::immediate(9));
        let token = CancellationToken::new();
        token.cancel();

        let err = engine
            .fetch(HttpRequest::get("http://example.com"), &token, |_| {})
            .await
            .unwrap_err();

        assert_eq!(err, AppError::Cancelled);
        assert_eq!(transport.calls(), 0);
    }
}
