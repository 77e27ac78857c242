//! HTTP client for the external dealership API.
//!
//! # Responsibilities
//! - Resolve paths against the configured base URL
//! - Forward the session bearer token and the request ID
//! - Enforce a single per-call timeout
//! - Classify failures (unreachable → 503, malformed → 502, status passthrough)

use std::time::{Duration, Instant};

use axum::http::{Method, StatusCode};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use url::Url;

use crate::config::UpstreamConfig;
use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;
use crate::upstream::error::{extract_message, UpstreamError};

/// One outbound call.
#[derive(Debug, Clone)]
pub struct Call<'a> {
    pub method: Method,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub token: Option<&'a str>,
    pub request_id: Option<&'a str>,
    pub body: Option<&'a Value>,
}

impl<'a> Call<'a> {
    pub fn new(method: Method, path: &'a str) -> Self {
        Self {
            method,
            path,
            query: None,
            token: None,
            request_id: None,
            body: None,
        }
    }

    pub fn get(path: &'a str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &'a str, body: &'a Value) -> Self {
        Self::new(Method::POST, path).json(body)
    }

    pub fn put(path: &'a str, body: &'a Value) -> Self {
        Self::new(Method::PUT, path).json(body)
    }

    pub fn delete(path: &'a str) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: &'a Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query(mut self, query: Option<&'a str>) -> Self {
        self.query = query.filter(|q| !q.is_empty());
        self
    }

    pub fn token(mut self, token: Option<&'a str>) -> Self {
        self.token = token;
        self
    }

    pub fn request_id(mut self, request_id: Option<&'a str>) -> Self {
        self.request_id = request_id;
        self
    }
}

/// Successful JSON response. Empty bodies become `Value::Null`.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Client bound to one upstream base URL.
#[derive(Clone, Debug)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base: Url,
    timeout_secs: u64,
}

impl UpstreamClient {
    /// Build a client for `base_url` using the timeouts in `config`.
    pub fn new(base_url: &str, config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| UpstreamError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("dealer-bff/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            http,
            base,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve an API path ("/sales/12") against the base URL, keeping the
    /// base path prefix.
    pub fn url(&self, path: &str, query: Option<&str>) -> Result<Url, UpstreamError> {
        let mut url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| UpstreamError::InvalidUrl(format!("{path}: {e}")))?;
        url.set_query(query);
        Ok(url)
    }

    /// Make a relative file URL returned by the upstream absolute.
    pub fn absolute(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            return location.to_string();
        }
        let origin = self.base.origin().ascii_serialization();
        if location.starts_with('/') {
            format!("{origin}{location}")
        } else {
            self.base
                .join(location)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| format!("{origin}/{location}"))
        }
    }

    fn headers(token: Option<&str>, request_id: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            if let Ok(v) = format!("Bearer {token}").parse() {
                headers.insert(AUTHORIZATION, v);
            }
        }
        if let Some(id) = request_id {
            if let Ok(v) = id.parse() {
                headers.insert(X_REQUEST_ID, v);
            }
        }
        headers
    }

    async fn dispatch(
        &self,
        call: &Call<'_>,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, UpstreamError> {
        let start = Instant::now();
        let result = builder.send().await;
        let outcome = match &result {
            Ok(r) => r.status().as_u16().to_string(),
            Err(e) if e.is_timeout() => "timeout".to_string(),
            Err(_) => "unreachable".to_string(),
        };
        metrics::record_upstream(call.method.as_str(), &outcome, start);

        result.map_err(|e| {
            let err = UpstreamError::from_reqwest(e, self.timeout_secs);
            tracing::warn!(
                request_id = call.request_id.unwrap_or("-"),
                method = %call.method,
                path = call.path,
                error = %err,
                "Upstream call failed"
            );
            err
        })
    }

    /// Turn a non-2xx response into [`UpstreamError::Status`].
    async fn reject(call: &Call<'_>, response: reqwest::Response) -> UpstreamError {
        let status = response.status();
        let body = response.bytes().await.unwrap_or_default();
        let message = extract_message(status, &body);
        tracing::debug!(
            request_id = call.request_id.unwrap_or("-"),
            method = %call.method,
            path = call.path,
            status = status.as_u16(),
            message = %message,
            "Upstream rejected call"
        );
        UpstreamError::Status { status, message }
    }

    /// Send a JSON call and parse the JSON response.
    pub async fn send_json(&self, call: Call<'_>) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.url(call.path, call.query)?;
        let mut builder = self
            .http
            .request(call.method.clone(), url)
            .headers(Self::headers(call.token, call.request_id))
            .header(ACCEPT, "application/json");
        if let Some(body) = call.body {
            builder = builder.json(body);
        }

        let response = self.dispatch(&call, builder).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::reject(&call, response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout_secs))?;
        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| {
                tracing::warn!(path = call.path, error = %e, "Upstream returned invalid JSON");
                UpstreamError::Malformed(format!("invalid JSON: {e}"))
            })?
        };
        Ok(UpstreamResponse { status, body })
    }

    /// Send a call and hand back the raw response for streaming.
    pub async fn get_bytes(&self, call: Call<'_>) -> Result<reqwest::Response, UpstreamError> {
        let url = self.url(call.path, call.query)?;
        let builder = self
            .http
            .request(call.method.clone(), url)
            .headers(Self::headers(call.token, call.request_id));
        let response = self.dispatch(&call, builder).await?;
        if !response.status().is_success() {
            return Err(Self::reject(&call, response).await);
        }
        Ok(response)
    }

    /// Post a multipart form and parse the JSON response.
    pub async fn post_multipart(
        &self,
        call: Call<'_>,
        form: reqwest::multipart::Form,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.url(call.path, call.query)?;
        let builder = self
            .http
            .post(url)
            .headers(Self::headers(call.token, call.request_id))
            .header(ACCEPT, "application/json")
            .multipart(form);
        let response = self.dispatch(&call, builder).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::reject(&call, response).await);
        }
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));
        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout_secs))?;
        // Some upload endpoints answer with the bare file URL as text.
        let body = match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(_) if !is_json => Value::String(String::from_utf8_lossy(&bytes).trim().to_string()),
            Err(e) => return Err(UpstreamError::Malformed(format!("invalid JSON: {e}"))),
        };
        Ok(UpstreamResponse { status, body })
    }
}
