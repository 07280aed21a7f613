//! Text embeddings.

use crate::defaults::endpoints;
use crate::error::LlmError;
use crate::execution::transport::{HttpTransport, RequestOptions, post_typed};
use crate::types::{EmbeddingRequest, EmbeddingResponse};
use crate::utils::cancel::{CancelHandle, run_cancellable};

/// Embed `request.input.texts`; vectors are returned ordered by `text_index`.
pub async fn create_embedding(
    transport: &dyn HttpTransport,
    base_url: &str,
    options: &RequestOptions,
    mut request: EmbeddingRequest,
    cancel: &CancelHandle,
) -> Result<Vec<Vec<f32>>, LlmError> {
    request.apply_defaults();
    let url = format!(
        "{}{}",
        base_url.trim_end_matches('/'),
        endpoints::TEXT_EMBEDDING
    );
    let response: EmbeddingResponse = run_cancellable(
        cancel,
        "embedding",
        post_typed(transport, "embedding", &url, &request, options),
    )
    .await?;

    let mut embeddings = response.output.embeddings;
    if embeddings.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    embeddings.sort_by_key(|e| e.text_index);
    tracing::debug!(
        target: "siumai::dashscope",
        model = %request.model,
        count = embeddings.len(),
        tokens = response.usage.total_tokens,
        "embeddings created"
    );
    Ok(embeddings.into_iter().map(|e| e.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    #[tokio::test]
    async fn applies_defaults_and_orders_by_index() {
        let transport = ScriptedTransport::new();
        transport.push_post(Ok(json!({
            "output": {"embeddings": [
                {"text_index": 1, "embedding": [0.5, 0.25]},
                {"text_index": 0, "embedding": [1.0, 2.0]}
            ]},
            "usage": {"total_tokens": 4},
            "request_id": "emb-1"
        })));
        let vectors = create_embedding(
            &transport,
            "https://dashscope.test",
            &RequestOptions::new(),
            EmbeddingRequest::new(vec!["a".into(), "b".into()]),
            &CancelHandle::new(),
        )
        .await
        .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 2.0], vec![0.5, 0.25]]);

        let call = &transport.calls()[0];
        assert!(call.url.ends_with("/api/v1/services/embeddings/text-embedding/text-embedding"));
        let body = call.body.as_ref().unwrap();
        assert_eq!(body["model"], "text-embedding-v1");
        assert_eq!(body["parameters"]["text_type"], "document");
        assert_eq!(body["input"]["texts"][1], "b");
    }

    #[tokio::test]
    async fn no_embeddings_is_empty_response() {
        let transport = ScriptedTransport::new();
        transport.push_post(Ok(json!({"output": {"embeddings": []}})));
        let err = create_embedding(
            &transport,
            "https://dashscope.test",
            &RequestOptions::new(),
            EmbeddingRequest::new(vec!["a".into()]).with_text_type("query"),
            &CancelHandle::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }
}
