//! In-memory transport for unit tests.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::LlmError;
use crate::execution::transport::{BinaryResponse, HttpTransport, RequestOptions};
use crate::streaming::{LineStream, lines_from_text};

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub body: Option<Value>,
    pub headers: HashMap<String, String>,
    pub token: Option<String>,
}

/// Replays queued answers in order and records every call.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    posts: Mutex<VecDeque<Result<Value, LlmError>>>,
    gets: Mutex<VecDeque<Result<Value, LlmError>>>,
    sse: Mutex<VecDeque<Result<LineStream, LlmError>>>,
    binaries: Mutex<HashMap<String, Result<BinaryResponse, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_post(&self, answer: Result<Value, LlmError>) -> &Self {
        self.posts.lock().unwrap().push_back(answer);
        self
    }

    pub fn push_get(&self, answer: Result<Value, LlmError>) -> &Self {
        self.gets.lock().unwrap().push_back(answer);
        self
    }

    pub fn push_sse(&self, body: Result<String, LlmError>) -> &Self {
        self.sse
            .lock()
            .unwrap()
            .push_back(body.map(|text| lines_from_text(&text)));
        self
    }

    /// Queue an arbitrary line stream, e.g. one that never ends.
    pub fn push_sse_stream(&self, lines: LineStream) -> &Self {
        self.sse.lock().unwrap().push_back(Ok(lines));
        self
    }

    pub fn set_binary(&self, url: &str, bytes: &[u8], content_type: Option<&str>) -> &Self {
        self.binaries.lock().unwrap().insert(
            url.to_string(),
            Ok(BinaryResponse {
                bytes: bytes.to_vec(),
                content_type: content_type.map(str::to_string),
            }),
        );
        self
    }

    pub fn fail_binary(&self, url: &str, error: LlmError) -> &Self {
        self.binaries
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    fn record(&self, method: &'static str, url: &str, body: Option<Value>, options: &RequestOptions) {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            url: url.to_string(),
            body,
            headers: options.headers.clone(),
            token: options.token.as_ref().map(|t| t.expose_secret().to_string()),
        });
    }
}

fn exhausted(method: &str) -> LlmError {
    LlmError::HttpError(format!("no scripted answer for {method}"))
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(
        &self,
        url: &str,
        body: Value,
        options: &RequestOptions,
    ) -> Result<Value, LlmError> {
        self.record("POST", url, Some(body), options);
        let next = self.posts.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(exhausted("POST")))
    }

    async fn get_json(&self, url: &str, options: &RequestOptions) -> Result<Value, LlmError> {
        self.record("GET", url, None, options);
        let next = self.gets.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(exhausted("GET")))
    }

    async fn post_sse(
        &self,
        url: &str,
        body: Value,
        options: &RequestOptions,
    ) -> Result<LineStream, LlmError> {
        self.record("SSE", url, Some(body), options);
        let next = self.sse.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(exhausted("SSE")))
    }

    async fn fetch_binary(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<BinaryResponse, LlmError> {
        self.record("BINARY", url, None, options);
        let answer = self.binaries.lock().unwrap().get(url).cloned();
        answer.unwrap_or_else(|| Err(exhausted("BINARY")))
    }
}
