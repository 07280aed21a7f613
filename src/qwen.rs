//! Qwen chat calls.
//!
//! A request goes down exactly one of two paths: the synchronous path when no
//! streaming callback is set, or the SSE path (decoder task + aggregator) when
//! one is.

use crate::error::LlmError;
use crate::execution::transport::{HttpTransport, RequestOptions, post_typed};
use crate::streaming::{StreamAggregator, spawn_decoder};
use crate::types::{ChatRequest, ChatResponse};
use crate::utils::cancel::{CancelHandle, run_cancellable};

/// Send a chat request, streaming or not, and return one merged response.
pub async fn create_completion(
    transport: &dyn HttpTransport,
    base_url: &str,
    options: &RequestOptions,
    mut request: ChatRequest,
    cancel: &CancelHandle,
) -> Result<ChatResponse, LlmError> {
    if request.model.is_empty() {
        return Err(LlmError::ModelNotSet);
    }
    request.prepare();
    let url = request.target_url(base_url);
    tracing::debug!(
        target: "siumai::dashscope",
        model = %request.model,
        url = %url,
        streaming = request.is_streaming(),
        messages = request.input.messages.len(),
        "qwen request"
    );

    if request.is_streaming() {
        stream_call(transport, &url, options, &request, cancel).await
    } else {
        sync_call(transport, &url, options, &request, cancel).await
    }
}

/// One request, one response. Zero choices is a protocol violation.
pub async fn sync_call(
    transport: &dyn HttpTransport,
    url: &str,
    options: &RequestOptions,
    request: &ChatRequest,
    cancel: &CancelHandle,
) -> Result<ChatResponse, LlmError> {
    let response: ChatResponse = run_cancellable(
        cancel,
        "qwen call",
        post_typed(transport, "qwen call", url, request, options),
    )
    .await?;
    if response.output.choices.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(response)
}

/// Open the SSE body, decode it on a separate task, and fold the events.
///
/// The decoder runs under a child handle that is cancelled when this returns,
/// so an aborted fold never leaves the body being read in the background.
pub async fn stream_call(
    transport: &dyn HttpTransport,
    url: &str,
    options: &RequestOptions,
    request: &ChatRequest,
    cancel: &CancelHandle,
) -> Result<ChatResponse, LlmError> {
    let body = serde_json::to_value(request)
        .map_err(|e| LlmError::ParseError(format!("Failed to serialize qwen stream request: {e}")))?;
    let lines = run_cancellable(
        cancel,
        "qwen stream",
        transport.post_sse(url, body, options),
    )
    .await?;
    let reader = cancel.child();
    let _stop_reader = reader.clone().drop_guard();
    let events = spawn_decoder(lines, reader);
    StreamAggregator::new(request.streaming_callback.clone())
        .run(events, cancel)
        .await
}
