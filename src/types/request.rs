//! Chat request types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::content::ContentKind;
use super::message::Message;
use crate::defaults::models;

/// Error type a streaming callback may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Callback invoked once per streamed chunk with that chunk's text bytes.
///
/// A slow callback throttles the whole stream; an error aborts the call.
pub type StreamingCallback = Arc<dyn Fn(&[u8]) -> Result<(), BoxError> + Send + Sync>;

/// Generation parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_search: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incremental_output: Option<bool>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults for text-only requests: `message` result format, temperature 1.0.
    pub fn text_defaults() -> Self {
        Self::new()
            .with_result_format(models::DEFAULT_RESULT_FORMAT)
            .with_temperature(models::DEFAULT_TEMPERATURE)
    }

    /// Defaults for a content shape. Multi-part requests start empty.
    pub fn defaults_for(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Text => Self::text_defaults(),
            ContentKind::MultiPart => Self::new(),
        }
    }

    pub fn with_result_format(mut self, value: impl Into<String>) -> Self {
        self.result_format = Some(value.into());
        self
    }

    pub const fn with_seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    pub const fn with_max_tokens(mut self, value: u32) -> Self {
        self.max_tokens = Some(value);
        self
    }

    pub const fn with_top_p(mut self, value: f64) -> Self {
        self.top_p = Some(value);
        self
    }

    pub const fn with_top_k(mut self, value: u32) -> Self {
        self.top_k = Some(value);
        self
    }

    pub const fn with_temperature(mut self, value: f64) -> Self {
        self.temperature = Some(value);
        self
    }

    pub const fn with_enable_search(mut self, value: bool) -> Self {
        self.enable_search = Some(value);
        self
    }

    pub const fn with_incremental_output(mut self, value: bool) -> Self {
        self.incremental_output = Some(value);
        self
    }
}

/// Request input envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub messages: Vec<Message>,
}

/// Chat request.
#[derive(Clone, Default, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub input: Input,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    #[serde(skip)]
    pub streaming_callback: Option<StreamingCallback>,
}

impl std::fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRequest")
            .field("model", &self.model)
            .field("input", &self.input)
            .field("parameters", &self.parameters)
            .field("streaming", &self.streaming_callback.is_some())
            .finish()
    }
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            input: Input { messages },
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn with_streaming_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[u8]) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.streaming_callback = Some(Arc::new(callback));
        self
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming_callback.is_some()
    }

    /// Content shape of the conversation, taken from the first message.
    pub fn content_kind(&self) -> ContentKind {
        self.input
            .messages
            .first()
            .map(|m| m.content.kind())
            .unwrap_or(ContentKind::Text)
    }

    /// Endpoint URL for this request under `base_url`.
    pub fn target_url(&self, base_url: &str) -> String {
        format!(
            "{}{}",
            base_url.trim_end_matches('/'),
            self.content_kind().endpoint()
        )
    }

    /// Fill in parameters and force `incremental_output` when streaming.
    ///
    /// DashScope only emits per-token deltas when `incremental_output` is true,
    /// which the aggregator's append-merge depends on.
    pub(crate) fn prepare(&mut self) {
        let kind = self.content_kind();
        let params = self
            .parameters
            .get_or_insert_with(|| Parameters::defaults_for(kind));
        if self.streaming_callback.is_some() {
            params.incremental_output = Some(true);
        }
    }
}
