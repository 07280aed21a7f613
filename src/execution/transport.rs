//! HTTP transport abstraction.
//!
//! The client core never touches `reqwest` directly: it talks to an injectable
//! [`HttpTransport`] exposing the four call shapes DashScope needs (JSON POST,
//! JSON GET, SSE POST returning raw lines, binary GET). [`ReqwestTransport`] is
//! the production implementation; tests and embedders may supply their own.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

use super::headers::HttpHeaderBuilder;
use super::interceptor::{HttpInterceptor, HttpRequestContext};
use crate::error::LlmError;
use crate::streaming::{LineStream, into_lines};

/// Per-request options: bearer token and extra headers.
#[derive(Clone, Default)]
pub struct RequestOptions {
    pub token: Option<SecretString>,
    pub headers: HashMap<String, String>,
}

impl std::fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestOptions")
            .field("has_token", &self.token.is_some())
            .field("headers", &self.headers)
            .finish()
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bearer(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    fn header_builder(&self) -> Result<HttpHeaderBuilder, LlmError> {
        let mut builder = HttpHeaderBuilder::new();
        if let Some(token) = &self.token {
            builder = builder.with_bearer_auth(token.expose_secret())?;
        }
        builder.with_custom_headers(&self.headers)
    }
}

/// Raw bytes of a binary download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryResponse {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Transport used by every DashScope call.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
        options: &RequestOptions,
    ) -> Result<serde_json::Value, LlmError>;

    async fn get_json(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<serde_json::Value, LlmError>;

    /// POST and return the response body as a stream of text lines.
    async fn post_sse(
        &self,
        url: &str,
        body: serde_json::Value,
        options: &RequestOptions,
    ) -> Result<LineStream, LlmError>;

    async fn fetch_binary(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<BinaryResponse, LlmError>;
}

/// POST a serializable body and decode the JSON answer into `T`.
pub(crate) async fn post_typed<B, T>(
    transport: &dyn HttpTransport,
    operation: &str,
    url: &str,
    body: &B,
    options: &RequestOptions,
) -> Result<T, LlmError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let body = serde_json::to_value(body).map_err(|e| {
        LlmError::ParseError(format!("Failed to serialize {operation} request: {e}"))
    })?;
    let json = transport.post_json(url, body, options).await?;
    serde_json::from_value(json)
        .map_err(|e| LlmError::ParseError(format!("Failed to parse {operation} response: {e}")))
}

/// GET and decode the JSON answer into `T`.
pub(crate) async fn get_typed<T>(
    transport: &dyn HttpTransport,
    operation: &str,
    url: &str,
    options: &RequestOptions,
) -> Result<T, LlmError>
where
    T: DeserializeOwned,
{
    let json = transport.get_json(url, options).await?;
    serde_json::from_value(json)
        .map_err(|e| LlmError::ParseError(format!("Failed to parse {operation} response: {e}")))
}

/// Map a non-2xx answer onto `ApiError`, keeping DashScope's `{code, message}` body.
pub fn classify_http_error(status: u16, body_text: &str) -> LlmError {
    match serde_json::from_str::<serde_json::Value>(body_text) {
        Ok(json) if json.is_object() => {
            let code = json.get("code").and_then(|v| v.as_str()).unwrap_or("");
            let message = json.get("message").and_then(|v| v.as_str()).unwrap_or("");
            let text = match (code.is_empty(), message.is_empty()) {
                (false, false) => format!("{code}: {message}"),
                (false, true) => code.to_string(),
                (true, false) => message.to_string(),
                (true, true) => fallback_reason(status),
            };
            LlmError::api_error_with_details(status, text, json)
        }
        _ if body_text.trim().is_empty() => LlmError::api_error(status, fallback_reason(status)),
        _ => LlmError::api_error(status, body_text.trim()),
    }
}

fn fallback_reason(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("HTTP error")
        .to_string()
}

/// `reqwest`-backed transport.
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    interceptors: Vec<Arc<dyn HttpInterceptor>>,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

impl ReqwestTransport {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            interceptors: Vec::new(),
        }
    }

    pub fn with_interceptors(mut self, interceptors: Vec<Arc<dyn HttpInterceptor>>) -> Self {
        self.interceptors = interceptors;
        self
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    async fn send(
        &self,
        ctx: &HttpRequestContext,
        builder: reqwest::RequestBuilder,
        headers: HeaderMap,
    ) -> Result<reqwest::Response, LlmError> {
        let mut rb = builder.headers(headers.clone());
        for it in &self.interceptors {
            rb = it.on_before_send(ctx, rb, &headers)?;
        }

        let response = match rb.send().await {
            Ok(r) => r,
            Err(e) => {
                let error = LlmError::from(e);
                self.notify_error(ctx, &error);
                return Err(error);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let error = classify_http_error(status.as_u16(), &text);
            self.notify_error(ctx, &error);
            return Err(error);
        }

        for it in &self.interceptors {
            it.on_response(ctx, &response)?;
        }
        Ok(response)
    }

    async fn read_json(
        &self,
        ctx: &HttpRequestContext,
        response: reqwest::Response,
    ) -> Result<serde_json::Value, LlmError> {
        let bytes = response.bytes().await.map_err(LlmError::from)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            let error = LlmError::ParseError(format!("Failed to parse response body: {e}"));
            self.notify_error(ctx, &error);
            error
        })
    }

    fn notify_error(&self, ctx: &HttpRequestContext, error: &LlmError) {
        for it in &self.interceptors {
            it.on_error(ctx, error);
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
        options: &RequestOptions,
    ) -> Result<serde_json::Value, LlmError> {
        let ctx = HttpRequestContext::new("POST", url, false);
        let headers = options.header_builder()?.with_json_content_type().build();
        let response = self
            .send(&ctx, self.http_client.post(url).json(&body), headers)
            .await?;
        self.read_json(&ctx, response).await
    }

    async fn get_json(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<serde_json::Value, LlmError> {
        let ctx = HttpRequestContext::new("GET", url, false);
        let headers = options.header_builder()?.build();
        let response = self.send(&ctx, self.http_client.get(url), headers).await?;
        self.read_json(&ctx, response).await
    }

    async fn post_sse(
        &self,
        url: &str,
        body: serde_json::Value,
        options: &RequestOptions,
    ) -> Result<LineStream, LlmError> {
        let ctx = HttpRequestContext::new("POST", url, true);
        let headers = options
            .header_builder()?
            .with_json_content_type()
            .with_event_stream_accept()
            .build();
        let response = self
            .send(&ctx, self.http_client.post(url).json(&body), headers)
            .await?;

        let byte_stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| LlmError::HttpError(format!("Stream error: {e}"))));
        let interceptors = self.interceptors.clone();
        let lines = into_lines(byte_stream).map(move |line| {
            let line = line?;
            for it in &interceptors {
                it.on_sse_line(&ctx, &line)?;
            }
            Ok(line)
        });
        Ok(Box::pin(lines))
    }

    async fn fetch_binary(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<BinaryResponse, LlmError> {
        let ctx = HttpRequestContext::new("GET", url, false);
        let headers = options.header_builder()?.build();
        let response = self.send(&ctx, self.http_client.get(url), headers).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = response.bytes().await.map_err(LlmError::from)?;
        Ok(BinaryResponse {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
