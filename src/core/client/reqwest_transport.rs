use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Url};
use tracing::debug;

use crate::core::client::http_transport::{
    CorsCredentials, HttpRequest, HttpResponse, HttpTransport, RequestMode,
};
use crate::errors::{transport_error, AppError};

/// `reqwest` backed transport.
///
/// Redirects are followed. A redirect that lands on another origin is what an
/// auth proxy in front of the backend looks like: in `Cors` mode it fails the
/// attempt, in `NoCors` mode it is returned as an opaque response.
pub struct ReqwestTransport {
    client: Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AppError> {
        let url = Url::parse(&request.uri).map_err(transport_error)?;

        let mut builder = self.client.request(request.method.clone(), url.clone());
        for (k, v) in &request.headers {
            if request.credentials == CorsCredentials::Omit && is_credential_header(k) {
                continue;
            }
            builder = builder.header(k.as_str(), v.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder.send().await.map_err(transport_error)?;

        if resp.url().origin() != url.origin() {
            debug!(from = %url, to = %resp.url(), "Request redirected to another origin");
            return match request.mode {
                RequestMode::Cors => Err(AppError::Transport(format!(
                    "cross-origin redirect to {} blocked",
                    resp.url()
                ))),
                RequestMode::NoCors => Ok(HttpResponse {
                    status: 0,
                    content_type: None,
                    body: String::new(),
                    opaque: true,
                }),
            };
        }

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = resp.text().await.map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            content_type,
            body,
            opaque: false,
        })
    }
}

fn is_credential_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("authorization") || name.eq_ignore_ascii_case("cookie")
}
