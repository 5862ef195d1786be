//! HTTP request client for the MIS backend.
//!
//! Every call goes through [`ApiClient`], which resolves the target URL against
//! the session's base URL, attaches the session token verbatim as the
//! `Authorization` header and normalizes the response. The wire transport is a
//! trait so the console can run against a recording fake in tests.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::format::format_body;

/// Default origin used when the session base URL is empty (the development proxy target).
pub const DEFAULT_PROXY_ORIGIN: &str = "http://localhost:8080";

const EMPTY_RESPONSE: &str = "Empty response.";

fn scheme_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("scheme pattern is valid"))
}

/// True when `path` already carries a scheme such as `http://` or `https://`.
pub fn is_absolute_url(path: &str) -> bool {
    scheme_pattern().is_match(path)
}

/// Strip surrounding whitespace and every trailing slash from a base URL.
pub fn normalize_base_url(base_url: &str) -> &str {
    base_url.trim().trim_end_matches('/')
}

/// Join a base URL and a path with exactly one separating slash.
///
/// Absolute paths are returned unchanged, and an empty base leaves the path
/// relative so it can be resolved against the proxy origin later.
pub fn build_api_url(base_url: &str, path: &str) -> String {
    if is_absolute_url(path) {
        return path.to_string();
    }
    let base = normalize_base_url(base_url);
    if base.is_empty() {
        return path.to_string();
    }
    format!("{}/{}", base, path.trim_start_matches('/'))
}

/// Encode query parameters as `?k=v&...`, dropping empty values.
pub fn build_query<K: AsRef<str>, V: AsRef<str>>(params: &[(K, V)]) -> String {
    let pairs: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .filter(|(_, v)| !v.is_empty())
        .collect();

    if pairs.is_empty() {
        return String::new();
    }

    // Only the form-urlencoded query of this placeholder URL is kept.
    match Url::parse_with_params("http://query.invalid/", &pairs) {
        Ok(url) => url.query().map(|q| format!("?{}", q)).unwrap_or_default(),
        Err(_) => String::new(),
    }
}

/// Method, path, query parameters and body of one outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a query parameter. Empty values are dropped when the URL is built.
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a query parameter only when a value is present.
    pub fn param_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a serializable body.
    pub fn json<T: Serialize>(self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        Ok(self.body(value))
    }

    /// Path plus encoded query string, before base URL resolution.
    pub fn target(&self) -> String {
        format!("{}{}", self.path, build_query(&self.query))
    }

    fn has_header(&self, name: &HeaderName) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name.as_str()))
    }
}

/// A fully resolved request handed to the transport.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Raw transport answer: status, content type and body bytes.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one request. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> Result<TransportResponse, ApiError>;
}

/// Production transport over reqwest. No client-side timeout is configured.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<TransportResponse, ApiError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) if (200..300).contains(&status) => return Err(ApiError::Network(e.to_string())),
            Err(e) => {
                warn!(status, error = %e, "could not read error response body");
                Vec::new()
            }
        };

        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Result of a console-style call: never fails on HTTP status, only on network errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleResponse {
    pub request_line: String,
    pub status: u16,
    pub ok: bool,
    pub duration: Duration,
    /// Parsed JSON, or the raw text when the body is not JSON.
    pub body: Value,
}

impl ConsoleResponse {
    pub fn status_label(&self) -> String {
        format!("{} {}", self.status, if self.ok { "OK" } else { "ERROR" })
    }

    pub fn duration_label(&self) -> String {
        format!("{} ms", self.duration.as_millis())
    }

    pub fn formatted_body(&self) -> String {
        format_body(&self.body)
    }
}

/// An opaque binary export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    proxy_origin: String,
}

impl ApiClient {
    pub fn new(proxy_origin: &str) -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()), proxy_origin)
    }

    pub fn with_transport(transport: Arc<dyn Transport>, proxy_origin: &str) -> Self {
        Self {
            transport,
            proxy_origin: proxy_origin.to_string(),
        }
    }

    pub fn proxy_origin(&self) -> &str {
        &self.proxy_origin
    }

    /// Resolve a target against the session base URL, falling back to the proxy origin.
    pub fn resolve_url(&self, base_url: &str, target: &str) -> String {
        let url = build_api_url(base_url, target);
        if is_absolute_url(&url) {
            url
        } else {
            build_api_url(&self.proxy_origin, &url)
        }
    }

    fn prepare(
        &self,
        base_url: &str,
        token: Option<&str>,
        request: &RequestDescriptor,
        accept: Option<&str>,
    ) -> Result<OutgoingRequest, ApiError> {
        let url = self.resolve_url(base_url, &request.target());

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::InvalidRequest(format!("header {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::InvalidRequest(format!("header {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        if let Some(accept) = accept {
            if !request.has_header(&ACCEPT) {
                headers.insert(ACCEPT, HeaderValue::from_str(accept).map_err(|e| ApiError::InvalidRequest(e.to_string()))?);
            }
        }

        if let Some(token) = token {
            let value = HeaderValue::from_str(token)
                .map_err(|_| ApiError::InvalidRequest("token is not a valid header value".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let body = match &request.body {
            Some(body) => {
                if !request.has_header(&CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                Some(serde_json::to_vec(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?)
            }
            None => None,
        };

        Ok(OutgoingRequest {
            method: request.method.clone(),
            url,
            headers,
            body,
        })
    }

    async fn send(&self, outgoing: OutgoingRequest) -> Result<(TransportResponse, Duration), ApiError> {
        let line = format!("{} {}", outgoing.method, outgoing.url);
        let started = Instant::now();
        match self.transport.send(outgoing).await {
            Ok(response) => {
                let elapsed = started.elapsed();
                debug!(request = %line, status = response.status, elapsed_ms = elapsed.as_millis() as u64, "backend call finished");
                Ok((response, elapsed))
            }
            Err(e) => {
                warn!(request = %line, error = %e, "backend call failed");
                Err(e)
            }
        }
    }

    /// Perform one call and return the parsed JSON body, `None` for 204 or an empty body.
    pub async fn request(
        &self,
        base_url: &str,
        token: Option<&str>,
        request: &RequestDescriptor,
    ) -> Result<Option<Value>, ApiError> {
        let outgoing = self.prepare(base_url, token, request, None)?;
        let (response, _) = self.send(outgoing).await?;

        if !response.is_success() {
            return Err(http_error(&response));
        }
        if response.status == 204 || response.body.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice(&response.body)
            .map(Some)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Like [`ApiClient::request`], deserializing into `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        base_url: &str,
        token: Option<&str>,
        request: &RequestDescriptor,
    ) -> Result<Option<T>, ApiError> {
        match self.request(base_url, token, request).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ApiError::Decode(e.to_string())),
            None => Ok(None),
        }
    }

    /// Console call: reports any HTTP status and falls back to raw text for non-JSON bodies.
    pub async fn execute(
        &self,
        base_url: &str,
        token: Option<&str>,
        request: &RequestDescriptor,
    ) -> Result<ConsoleResponse, ApiError> {
        let outgoing = self.prepare(base_url, token, request, Some("application/json"))?;
        let request_line = format!("{} {}", outgoing.method, outgoing.url);
        let (response, duration) = self.send(outgoing).await?;

        let text = response.text();
        let body = serde_json::from_str(&text).unwrap_or_else(|_| {
            Value::String(if text.is_empty() { EMPTY_RESPONSE.to_string() } else { text })
        });

        Ok(ConsoleResponse {
            request_line,
            status: response.status,
            ok: response.is_success(),
            duration,
            body,
        })
    }

    /// Fetch a binary export as-is.
    pub async fn download(
        &self,
        base_url: &str,
        token: Option<&str>,
        request: &RequestDescriptor,
    ) -> Result<Download, ApiError> {
        let outgoing = self.prepare(base_url, token, request, Some("*/*"))?;
        let (response, _) = self.send(outgoing).await?;

        if !response.is_success() {
            return Err(http_error(&response));
        }
        Ok(Download {
            content_type: response
                .content_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            bytes: response.body,
        })
    }
}

fn http_error(response: &TransportResponse) -> ApiError {
    let text = response.text();
    let message = if text.is_empty() {
        format!("HTTP {}", response.status)
    } else {
        text
    };
    ApiError::Http {
        status: response.status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingTransport;
    use serde_json::json;

    fn client_with(transport: &Arc<RecordingTransport>) -> ApiClient {
        ApiClient::with_transport(transport.clone(), DEFAULT_PROXY_ORIGIN)
    }

    #[test]
    fn test_build_api_url_single_separator() {
        assert_eq!(build_api_url("http://x/", "/a"), "http://x/a");
        assert_eq!(build_api_url("http://x///", "/a"), "http://x/a");
        assert_eq!(build_api_url("http://x", "a"), "http://x/a");
        assert_eq!(build_api_url("  http://x/api/ ", "/incidents"), "http://x/api/incidents");
    }

    #[test]
    fn test_build_api_url_absolute_path_ignores_base() {
        assert_eq!(build_api_url("http://x/", "https://other/a"), "https://other/a");
        assert_eq!(build_api_url("", "http://other/a?b=1"), "http://other/a?b=1");
    }

    #[test]
    fn test_build_api_url_empty_base_keeps_path() {
        assert_eq!(build_api_url("", "/api/staff/employees"), "/api/staff/employees");
        assert_eq!(build_api_url("   ", "/a"), "/a");
    }

    #[test]
    fn test_no_duplicate_slashes_for_any_trailing_count() {
        for slashes in 1..6 {
            let base = format!("http://casino.local{}", "/".repeat(slashes));
            let url = build_api_url(&base, "/api/security/monitoring/status");
            assert_eq!(url, "http://casino.local/api/security/monitoring/status");
            assert!(!url["http://".len()..].contains("//"));
        }
    }

    #[test]
    fn test_build_query_drops_empty_values() {
        let params = [("start", ""), ("type", "THEFT"), ("q", "a b&c")];
        assert_eq!(build_query(&params), "?type=THEFT&q=a+b%26c");
        let none: [(&str, &str); 1] = [("start", "")];
        assert_eq!(build_query(&none), "");
    }

    #[test]
    fn test_descriptor_target_includes_query() {
        let request = RequestDescriptor::get("/api/incident/incidents")
            .param("type", "FIGHT")
            .param_opt::<String>("start", None);
        assert_eq!(request.target(), "/api/incident/incidents?type=FIGHT");
    }

    #[test]
    fn test_resolve_url_falls_back_to_proxy_origin() {
        let client = ApiClient::with_transport(Arc::new(RecordingTransport::new()), "http://proxy:8080/");
        assert_eq!(client.resolve_url("", "/api/x"), "http://proxy:8080/api/x");
        assert_eq!(client.resolve_url("http://backend", "/api/x"), "http://backend/api/x");
    }

    #[tokio::test]
    async fn test_body_defaults_to_json_content_type() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(200, r#"{"id":"1"}"#));
        let client = client_with(&transport);

        let request = RequestDescriptor::post("/api/incident/incidents").body(json!({"type": "THEFT"}));
        let result = client.request("", Some("Basic abc"), &request).await.unwrap();
        assert_eq!(result, Some(json!({"id": "1"})));

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(sent.headers.get(AUTHORIZATION).unwrap(), "Basic abc");
        let body: Value = serde_json::from_slice(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"type": "THEFT"}));
    }

    #[tokio::test]
    async fn test_explicit_content_type_is_kept() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(204, ""));
        let client = client_with(&transport);

        let request = RequestDescriptor::post("/x")
            .header("Content-Type", "text/plain")
            .body(json!("raw"));
        client.request("http://b", None, &request).await.unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert!(sent.headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_no_content_yields_none_regardless_of_body() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(204, "ignored"));
        transport.push(TransportResponse::new(200, ""));
        let client = client_with(&transport);

        let request = RequestDescriptor::post("/api/staff/work-time/check-missing-clock-outs");
        assert_eq!(client.request("", None, &request).await.unwrap(), None);
        assert_eq!(client.request("", None, &request).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_error_status_carries_body_text() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(500, "Internal error"));
        let client = client_with(&transport);

        let err = client
            .request("", None, &RequestDescriptor::get("/api/finance/operations"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Http {
                status: 500,
                message: "Internal error".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_error_status_without_body_uses_fallback_message() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(403, ""));
        let client = client_with(&transport);

        let err = client
            .request("", None, &RequestDescriptor::get("/x"))
            .await
            .unwrap_err();
        match err {
            ApiError::Http { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "HTTP 403");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_success_is_decode_error() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(200, "plain text"));
        let client = client_with(&transport);

        let err = client
            .request("", None, &RequestDescriptor::get("/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_network_failure_is_not_retried() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push_error(ApiError::Network("connection refused".to_string()));
        let client = client_with(&transport);

        let err = client
            .request("", None, &RequestDescriptor::get("/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_falls_back_to_raw_text() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(404, "Not Found"));
        transport.push(TransportResponse::new(200, ""));
        let client = client_with(&transport);

        let response = client
            .execute("http://b/", Some("Basic t"), &RequestDescriptor::get("/api/incident/incidents/42"))
            .await
            .unwrap();
        assert_eq!(response.request_line, "GET http://b/api/incident/incidents/42");
        assert_eq!(response.status_label(), "404 ERROR");
        assert_eq!(response.body, Value::String("Not Found".to_string()));
        assert_eq!(transport.last_request().unwrap().headers.get(ACCEPT).unwrap(), "application/json");

        let empty = client
            .execute("http://b", None, &RequestDescriptor::get("/x"))
            .await
            .unwrap();
        assert!(empty.ok);
        assert_eq!(empty.formatted_body(), "Empty response.");
    }

    #[tokio::test]
    async fn test_download_reads_content_type() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(200, vec![0x25, 0x50, 0x44, 0x46]).with_content_type("application/pdf"));
        transport.push(TransportResponse::new(200, vec![1, 2]));
        let client = client_with(&transport);

        let request = RequestDescriptor::get("/api/incident/reports/r1/export/pdf");
        let download = client.download("", None, &request).await.unwrap();
        assert_eq!(download.content_type, "application/pdf");
        assert_eq!(download.bytes, b"%PDF".to_vec());
        assert_eq!(transport.last_request().unwrap().headers.get(ACCEPT).unwrap(), "*/*");

        let untyped = client.download("", None, &request).await.unwrap();
        assert_eq!(untyped.content_type, "unknown");
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected_before_sending() {
        let transport = Arc::new(RecordingTransport::new());
        let client = client_with(&transport);

        let err = client
            .request("", Some("Basic a\nb"), &RequestDescriptor::get("/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert!(transport.requests().is_empty());
    }
}
