use std::collections::BTreeMap;

use async_trait::async_trait;
use http::Method;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Credentials policy attached to a request, mirrors the per-upstream setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorsCredentials {
    Omit,
    SameOrigin,
    #[default]
    Include,
}

/// Request mode. The last attempt of a retried GET is sent as `NoCors` so a
/// cross-origin redirect (auth proxy) comes back opaque instead of failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestMode {
    #[default]
    Cors,
    NoCors,
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub uri: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub credentials: CorsCredentials,
    pub mode: RequestMode,
}

impl HttpRequest {
    pub fn get(uri: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            uri: uri.into(),
            headers: BTreeMap::new(),
            body: None,
            credentials: CorsCredentials::Include,
            mode: RequestMode::Cors,
        }
    }

    pub fn post_json(uri: impl Into<String>, body: String) -> Self {
        let mut req = Self::get(uri);
        req.method = Method::POST;
        req.headers
            .insert("Content-Type".into(), "application/json".into());
        req.body = Some(body);
        req
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        let mut req = Self::get(uri);
        req.method = Method::DELETE;
        req
    }

    /// Merge extra headers; request level values win over defaults already set.
    pub fn with_headers(mut self, headers: &BTreeMap<String, String>) -> Self {
        for (k, v) in headers {
            self.headers.insert(k.clone(), v.clone());
        }
        self
    }

    pub fn with_credentials(mut self, credentials: CorsCredentials) -> Self {
        self.credentials = credentials;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
    /// Response crossed origins in no-cors mode, body and status are not readable.
    pub opaque: bool,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false)
    }

    /// Parse the body according to its content type.
    pub fn parsed_body(&self) -> ResponseBody {
        if self.is_json() {
            match serde_json::from_str(&self.body) {
                Ok(v) => ResponseBody::Json(v),
                Err(_) => ResponseBody::Text(self.body.clone()),
            }
        } else {
            ResponseBody::Text(self.body.clone())
        }
    }

    /// Error text for a failed response: the JSON `error` field when present,
    /// otherwise the raw body.
    pub fn error_text(&self) -> String {
        match self.parsed_body() {
            ResponseBody::Json(serde_json::Value::Object(map)) => match map.get("error") {
                Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
                _ => serde_json::Value::Object(map).to_string(),
            },
            ResponseBody::Json(other) => other.to_string(),
            ResponseBody::Text(t) => t,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

/// Seam over the network; production uses `ReqwestTransport`, tests script responses.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AppError>;
}
