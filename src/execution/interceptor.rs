//! HTTP Interceptor interfaces
//!
//! Interceptors can observe and tweak request builders before send, observe
//! responses, be notified of errors, and see every raw SSE line. The hooks are
//! best-effort and should avoid expensive work.

use crate::error::LlmError;
use reqwest::header::HeaderMap;

/// Context passed to interceptors describing the request.
#[derive(Clone, Debug)]
pub struct HttpRequestContext {
    pub request_id: String,
    pub method: &'static str,
    pub url: String,
    pub stream: bool,
}

impl HttpRequestContext {
    pub(crate) fn new(method: &'static str, url: &str, stream: bool) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            method,
            url: url.to_string(),
            stream,
        }
    }
}

/// HTTP interceptor trait
pub trait HttpInterceptor: Send + Sync {
    /// Called before sending a request. Return the (possibly modified) builder
    /// or an error to short-circuit the request.
    fn on_before_send(
        &self,
        _ctx: &HttpRequestContext,
        builder: reqwest::RequestBuilder,
        _headers: &HeaderMap,
    ) -> Result<reqwest::RequestBuilder, LlmError> {
        Ok(builder)
    }

    /// Called after a successful (2xx) response is received.
    fn on_response(
        &self,
        _ctx: &HttpRequestContext,
        _response: &reqwest::Response,
    ) -> Result<(), LlmError> {
        Ok(())
    }

    /// Called when an error occurs during sending or classification.
    fn on_error(&self, _ctx: &HttpRequestContext, _error: &LlmError) {}

    /// Called for every raw line of an SSE body.
    fn on_sse_line(&self, _ctx: &HttpRequestContext, _line: &str) -> Result<(), LlmError> {
        Ok(())
    }
}

/// A simple logging interceptor backed by `tracing` (no sensitive data).
#[derive(Clone, Default)]
pub struct LoggingInterceptor;

impl HttpInterceptor for LoggingInterceptor {
    fn on_before_send(
        &self,
        ctx: &HttpRequestContext,
        builder: reqwest::RequestBuilder,
        _headers: &HeaderMap,
    ) -> Result<reqwest::RequestBuilder, LlmError> {
        tracing::debug!(target: "siumai::dashscope::http", request_id=%ctx.request_id, method=ctx.method, url=%ctx.url, stream=%ctx.stream, "sending request");
        Ok(builder)
    }

    fn on_response(
        &self,
        ctx: &HttpRequestContext,
        response: &reqwest::Response,
    ) -> Result<(), LlmError> {
        tracing::debug!(target: "siumai::dashscope::http", request_id=%ctx.request_id, url=%ctx.url, status=%response.status().as_u16(), "response received");
        Ok(())
    }

    fn on_error(&self, ctx: &HttpRequestContext, error: &LlmError) {
        tracing::debug!(target: "siumai::dashscope::http", request_id=%ctx.request_id, url=%ctx.url, stream=%ctx.stream, err=%error, "request error");
    }

    fn on_sse_line(&self, ctx: &HttpRequestContext, line: &str) -> Result<(), LlmError> {
        tracing::trace!(target: "siumai::dashscope::http", request_id=%ctx.request_id, line=%line, "sse line");
        Ok(())
    }
}
