use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::client::http_transport::{HttpRequest, HttpTransport, ResponseBody};
use crate::core::state::reactive::observable::Observable;
use crate::errors::AppError;

/// One candidate endpoint for a failover request.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub uri: String,
    pub request: HttpRequest,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchAnyState {
    pub response: Option<ResponseBody>,
    pub error: Option<String>,
    pub response_uri: Option<String>,
    pub in_progress: bool,
}

/// Tries each upstream in order and stops at the first 2xx.
pub struct FetchAny {
    transport: Arc<dyn HttpTransport>,
    state: Observable<FetchAnyState>,
}

impl FetchAny {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            state: Observable::default(),
        }
    }

    pub fn state(&self) -> Arc<FetchAnyState> {
        self.state.get()
    }

    pub async fn run(&self, upstreams: &[UpstreamRequest], cancel: &CancellationToken) -> Arc<FetchAnyState> {
        self.state.set(FetchAnyState {
            in_progress: true,
            ..Default::default()
        });

        let mut last_error: Option<String> = None;
        for upstream in upstreams {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return self.state.get(),
                res = self.transport.send(upstream.request.clone()) => res,
            };
            if cancel.is_cancelled() {
                return self.state.get();
            }

            match outcome {
                Ok(resp) if resp.is_success() => {
                    debug!(uri = %upstream.uri, "Upstream answered");
                    self.state.set(FetchAnyState {
                        response: Some(resp.parsed_body()),
                        error: None,
                        response_uri: Some(upstream.uri.clone()),
                        in_progress: false,
                    });
                    return self.state.get();
                }
                Ok(resp) => {
                    let err = AppError::HttpStatus {
                        status: resp.status,
                        body: resp.error_text(),
                    };
                    warn!(uri = %upstream.uri, error = %err, "Upstream failed, trying next");
                    last_error = Some(err.message());
                }
                Err(err) => {
                    warn!(uri = %upstream.uri, error = %err, "Upstream failed, trying next");
                    last_error = Some(err.message());
                }
            }
        }

        self.state.set(FetchAnyState {
            response: None,
            error: last_error,
            response_uri: None,
            in_progress: false,
        });
        self.state.get()
    }
}
