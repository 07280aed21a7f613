//! Streaming chat against a mock DashScope server replaying recorded SSE bodies.

use siumai_dashscope::types::{ChatMessage, ChatRequest, Message};
use siumai_dashscope::{CallOptions, CancelHandle, DashScopeClient, LlmError, TongyiLlm};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("qwen")
}

fn read_text(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).expect("read fixture text")
}

async fn mount_sse(server: &MockServer, endpoint: &str, fixture: &str) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .and(header("accept", "text/event-stream"))
        .and(body_partial_json(
            serde_json::json!({"parameters": {"incremental_output": true}}),
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_raw(read_text(fixtures_dir().join(fixture)), "text/event-stream"),
        )
        .mount(server)
        .await;
}

fn client(server: &MockServer, model: &str) -> DashScopeClient {
    DashScopeClient::builder()
        .api_key("KEY")
        .base_url(server.uri())
        .model(model)
        .build()
        .unwrap()
}

fn collecting_sink() -> (Arc<Mutex<Vec<String>>>, CallOptions) {
    let chunks = Arc::new(Mutex::new(Vec::new()));
    let sink = chunks.clone();
    let options = CallOptions::new().with_streaming_callback(move |bytes: &[u8]| {
        sink.lock()
            .unwrap()
            .push(String::from_utf8_lossy(bytes).into_owned());
        Ok(())
    });
    (chunks, options)
}

#[tokio::test]
async fn qwen_text_stream_matches_fixture() {
    let server = MockServer::start().await;
    mount_sse(
        &server,
        "/api/v1/services/aigc/text-generation/generation",
        "chat_stream.sse",
    )
    .await;

    let chunks = Arc::new(Mutex::new(Vec::new()));
    let sink = chunks.clone();
    let request = ChatRequest::new(vec![Message::user("Hello!")]).with_streaming_callback(
        move |bytes: &[u8]| -> Result<(), siumai_dashscope::types::BoxError> {
            sink.lock().unwrap().push(bytes.to_vec());
            Ok(())
        },
    );

    let resp = client(&server, "qwen-turbo")
        .create_completion(request)
        .await
        .unwrap();

    assert_eq!(resp.text(), "Hello! How can I assist you today?");
    assert_eq!(resp.finish_reason(), Some("stop"));
    assert_eq!(resp.usage.total_tokens, 15);
    assert_eq!(resp.request_id, "95bea986-ac55-9fd3-8326-8415cbdf5683");
    assert_eq!(
        *chunks.lock().unwrap(),
        vec![b"Hello! How".to_vec(), b" can I assist you today?".to_vec()]
    );
}

#[tokio::test]
async fn qwen_vl_stream_goes_to_multimodal_endpoint() {
    let server = MockServer::start().await;
    mount_sse(
        &server,
        "/api/v1/services/aigc/multimodal-generation/generation",
        "vl_stream.sse",
    )
    .await;

    let (chunks, options) = collecting_sink();
    let llm = TongyiLlm::new(client(&server, "qwen-vl-plus"));
    let resp = llm
        .generate_content(
            &[ChatMessage::human("What is in the picture?")
                .with_image("https://dashscope.oss-cn-beijing.aliyuncs.com/images/dog_and_girl.jpeg")],
            options,
        )
        .await
        .unwrap();

    assert_eq!(resp.choices.len(), 1);
    assert_eq!(resp.choices[0].content, "The image shows a dog on a beach.");
    assert_eq!(resp.choices[0].stop_reason, "stop");
    assert_eq!(resp.choices[0].completion_tokens(), Some(9));
    assert_eq!(
        *chunks.lock().unwrap(),
        vec!["The image shows".to_string(), " a dog on a beach.".to_string()]
    );
}

#[tokio::test]
async fn error_event_aborts_after_partial_output() {
    let server = MockServer::start().await;
    mount_sse(
        &server,
        "/api/v1/services/aigc/text-generation/generation",
        "error_stream.sse",
    )
    .await;

    let (chunks, options) = collecting_sink();
    let llm = TongyiLlm::new(client(&server, "qwen-turbo"));
    let err = llm.call("tell me something", options).await.unwrap_err();

    match err {
        LlmError::StreamError(msg) => assert!(msg.contains("DataInspectionFailed")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(*chunks.lock().unwrap(), vec!["Partial".to_string()]);
}

#[tokio::test]
async fn failing_callback_aborts_the_stream() {
    let server = MockServer::start().await;
    mount_sse(
        &server,
        "/api/v1/services/aigc/text-generation/generation",
        "chat_stream.sse",
    )
    .await;

    let options = CallOptions::new().with_streaming_callback(|_: &[u8]| Err("sink closed".into()));
    let err = TongyiLlm::new(client(&server, "qwen-turbo"))
        .call("Hello!", options)
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::CallbackError(ref m) if m.contains("sink closed")));
}

#[tokio::test]
async fn cancelled_before_start_sends_nothing() {
    let server = MockServer::start().await;
    let cancel = CancelHandle::new();
    cancel.cancel();

    let (_chunks, options) = collecting_sink();
    let err = TongyiLlm::new(client(&server, "qwen-turbo"))
        .generate_content_with_cancel(&[ChatMessage::human("Hello!")], options, &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(server.received_requests().await.unwrap().is_empty());
}
