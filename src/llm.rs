//! Chat-framework adapter.
//!
//! [`TongyiLlm`] accepts framework-level [`ChatMessage`]s and [`CallOptions`],
//! routes them to the text or vision-language endpoint, and returns
//! [`ContentChoice`]s with token usage attached.

use crate::client::DashScopeClient;
use crate::convert::{ContentChoice, to_content_choices};
use crate::defaults::models;
use crate::error::LlmError;
use crate::types::{
    BoxError, ChatMessage, ChatRequest, ContentKind, EmbeddingRequest, Parameters,
    StreamingCallback, build_messages,
};
use crate::utils::cancel::CancelHandle;
use std::sync::Arc;

/// Per-call options supplied by the caller framework.
#[derive(Clone, Default)]
pub struct CallOptions {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub max_tokens: Option<u32>,
    pub seed: Option<u64>,
    pub streaming_callback: Option<StreamingCallback>,
}

impl std::fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallOptions")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .field("max_tokens", &self.max_tokens)
            .field("seed", &self.seed)
            .field("streaming", &self.streaming_callback.is_some())
            .finish()
    }
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub const fn with_temperature(mut self, value: f64) -> Self {
        self.temperature = Some(value);
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

    pub const fn with_max_tokens(mut self, value: u32) -> Self {
        self.max_tokens = Some(value);
        self
    }

    pub const fn with_seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    pub fn with_streaming_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[u8]) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.streaming_callback = Some(Arc::new(callback));
        self
    }

    fn parameters(&self, kind: ContentKind) -> Parameters {
        let mut params = Parameters::defaults_for(kind);
        if let Some(v) = self.temperature {
            params.temperature = Some(v);
        }
        params.top_p = self.top_p.or(params.top_p);
        params.top_k = self.top_k.or(params.top_k);
        params.max_tokens = self.max_tokens.or(params.max_tokens);
        params.seed = self.seed.or(params.seed);
        params
    }
}

/// Generated choices for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentResponse {
    pub choices: Vec<ContentChoice>,
}

/// Pick the content shape: vision-language models and any image part need multi-part content.
pub fn select_content_kind(model: &str, messages: &[ChatMessage]) -> ContentKind {
    if model.starts_with(models::VL_PREFIX) || messages.iter().any(ChatMessage::has_image) {
        ContentKind::MultiPart
    } else {
        ContentKind::Text
    }
}

/// Tongyi (Qwen) model for a generic chat framework.
#[derive(Debug, Clone)]
pub struct TongyiLlm {
    client: DashScopeClient,
}

impl TongyiLlm {
    pub fn new(client: DashScopeClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &DashScopeClient {
        &self.client
    }

    pub async fn generate_content(
        &self,
        messages: &[ChatMessage],
        options: CallOptions,
    ) -> Result<ContentResponse, LlmError> {
        self.generate_content_with_cancel(messages, options, &CancelHandle::new())
            .await
    }

    pub async fn generate_content_with_cancel(
        &self,
        messages: &[ChatMessage],
        options: CallOptions,
        cancel: &CancelHandle,
    ) -> Result<ContentResponse, LlmError> {
        let model = options
            .model
            .clone()
            .or_else(|| self.client.model().map(str::to_string))
            .ok_or(LlmError::ModelNotSet)?;
        let kind = select_content_kind(&model, messages);
        let wire = build_messages(messages, kind)?;

        let mut request = ChatRequest::new(wire)
            .with_model(model)
            .with_parameters(options.parameters(kind));
        request.streaming_callback = options.streaming_callback;

        let response = self
            .client
            .create_completion_with_cancel(request, cancel)
            .await?;
        if response.choices().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(ContentResponse {
            choices: to_content_choices(&response),
        })
    }

    /// Single-prompt convenience: one human message in, first choice's text out.
    pub async fn call(&self, prompt: &str, options: CallOptions) -> Result<String, LlmError> {
        let response = self
            .generate_content(&[ChatMessage::human(prompt)], options)
            .await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.content)
            .ok_or(LlmError::EmptyResponse)
    }

    /// Embed `texts`. Every input must come back with a vector.
    pub async fn create_embedding(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        let expected = texts.len();
        let vectors = self
            .client
            .create_embedding(EmbeddingRequest::new(texts))
            .await?;
        if vectors.len() != expected {
            return Err(LlmError::IncompleteEmbedding {
                expected,
                actual: vectors.len(),
            });
        }
        Ok(vectors)
    }
}
