//! DashScope client
//!
//! One entry point for chat (Qwen / Qwen-VL), image generation (Wanx) and
//! embeddings. Every operation has a `_with_cancel` twin that observes a
//! [`CancelHandle`].

use std::sync::Arc;

use crate::builder::DashScopeBuilder;
use crate::config::{DashScopeConfig, build_http_client_from_config};
use crate::defaults::models;
use crate::error::LlmError;
use crate::execution::transport::{HttpTransport, ReqwestTransport, RequestOptions};
use crate::types::{ChatRequest, ChatResponse, EmbeddingRequest, ImageBlob, ImageSynthesisRequest};
use crate::utils::cancel::CancelHandle;
use crate::wanx::TaskPoller;
use crate::{embedding, qwen};

#[derive(Clone)]
pub struct DashScopeClient {
    config: DashScopeConfig,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for DashScopeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashScopeClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DashScopeClient {
    pub fn builder() -> DashScopeBuilder {
        DashScopeBuilder::new()
    }

    /// Client over a caller-supplied transport.
    pub fn new(config: DashScopeConfig, transport: Arc<dyn HttpTransport>) -> Result<Self, LlmError> {
        config.validate()?;
        Ok(Self { config, transport })
    }

    /// Client over a `reqwest` transport built from `config.http_config`.
    pub fn from_config(config: DashScopeConfig) -> Result<Self, LlmError> {
        let http_client = build_http_client_from_config(&config.http_config)?;
        Self::new(config, Arc::new(ReqwestTransport::new(http_client)))
    }

    pub fn config(&self) -> &DashScopeConfig {
        &self.config
    }

    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        self.transport.clone()
    }

    /// Default chat model, if configured.
    pub fn model(&self) -> Option<&str> {
        self.config.default_model()
    }

    fn request_options(&self) -> RequestOptions {
        let mut options = RequestOptions::new().with_bearer(self.config.api_key.clone());
        for (k, v) in &self.config.http_config.headers {
            options = options.with_header(k.clone(), v.clone());
        }
        options
    }

    /// Chat completion. Streams when the request carries a callback.
    pub async fn create_completion(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        self.create_completion_with_cancel(request, &CancelHandle::new())
            .await
    }

    pub async fn create_completion_with_cancel(
        &self,
        mut request: ChatRequest,
        cancel: &CancelHandle,
    ) -> Result<ChatResponse, LlmError> {
        if request.model.is_empty()
            && let Some(model) = self.model()
        {
            request.model = model.to_string();
        }
        qwen::create_completion(
            self.transport.as_ref(),
            &self.config.base_url,
            &self.request_options(),
            request,
            cancel,
        )
        .await
    }

    /// Poller configured with this client's transport, credentials and poll settings.
    pub fn task_poller(&self) -> TaskPoller {
        TaskPoller::new(
            self.transport.clone(),
            self.config.base_url.clone(),
            self.request_options(),
        )
        .with_interval(self.config.poll_interval)
        .with_timeout(self.config.poll_timeout)
    }

    /// Generate images with Wanx and download them.
    pub async fn create_image_generation(
        &self,
        request: ImageSynthesisRequest,
    ) -> Result<Vec<ImageBlob>, LlmError> {
        self.create_image_generation_with_cancel(request, &CancelHandle::new())
            .await
    }

    pub async fn create_image_generation_with_cancel(
        &self,
        mut request: ImageSynthesisRequest,
        cancel: &CancelHandle,
    ) -> Result<Vec<ImageBlob>, LlmError> {
        if request.model.is_empty() {
            request.model = models::WANX_V1.to_string();
        }
        self.task_poller().generate(&request, cancel).await
    }

    /// Embed texts; one vector per input, in input order.
    pub async fn create_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<Vec<Vec<f32>>, LlmError> {
        self.create_embedding_with_cancel(request, &CancelHandle::new())
            .await
    }

    pub async fn create_embedding_with_cancel(
        &self,
        request: EmbeddingRequest,
        cancel: &CancelHandle,
    ) -> Result<Vec<Vec<f32>>, LlmError> {
        embedding::create_embedding(
            self.transport.as_ref(),
            &self.config.base_url,
            &self.request_options(),
            request,
            cancel,
        )
        .await
    }
}
