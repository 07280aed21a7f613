//! Agent tool wrapping Wanx text-to-image generation.

use crate::client::DashScopeClient;
use crate::error::LlmError;
use crate::types::ImageSynthesisRequest;
use crate::utils::cancel::CancelHandle;

pub const WANX_TOOL_NAME: &str = "TongyiWanx-Image-Generator";

pub const WANX_TOOL_DESCRIPTION: &str = "A wrapper around Dashscope Wanx API. Useful for when you need to generate images from a text description. Input should be the textual description.";

/// Text in, newline-separated image URLs out.
#[derive(Debug, Clone)]
pub struct WanxImageTool {
    client: DashScopeClient,
    description: String,
    separator: String,
}

impl WanxImageTool {
    pub fn new(client: DashScopeClient) -> Self {
        Self {
            client,
            description: WANX_TOOL_DESCRIPTION.to_string(),
            separator: "\n".to_string(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Separator placed between URLs when a task yields several images.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn name(&self) -> &str {
        WANX_TOOL_NAME
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub async fn call(&self, input: &str) -> Result<String, LlmError> {
        self.call_with_cancel(input, &CancelHandle::new()).await
    }

    pub async fn call_with_cancel(
        &self,
        input: &str,
        cancel: &CancelHandle,
    ) -> Result<String, LlmError> {
        tracing::info!(target: "siumai::dashscope", tool = WANX_TOOL_NAME, input, "tool start");
        let request = ImageSynthesisRequest::wanx_v1(input).with_n(1);
        match self
            .client
            .create_image_generation_with_cancel(request, cancel)
            .await
        {
            Ok(blobs) => {
                let output = blobs
                    .iter()
                    .map(|b| b.url.as_str())
                    .collect::<Vec<_>>()
                    .join(&self.separator);
                tracing::info!(target: "siumai::dashscope", tool = WANX_TOOL_NAME, output = %output, "tool end");
                Ok(output)
            }
            Err(e) => {
                tracing::error!(target: "siumai::dashscope", tool = WANX_TOOL_NAME, error = %e, "tool error");
                Err(e)
            }
        }
    }
}
