//! End-to-end calls through the reqwest transport against a mock DashScope server.

use serde_json::json;
use siumai_dashscope::types::{ChatRequest, EmbeddingRequest, ImageSynthesisRequest, Message};
use siumai_dashscope::{CallOptions, DashScopeClient, LlmError, TongyiLlm, WanxImageTool};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

fn client(server: &MockServer) -> DashScopeClient {
    DashScopeClient::builder()
        .api_key("KEY")
        .base_url(server.uri())
        .model("qwen-turbo")
        .poll_interval(Duration::from_millis(10))
        .build()
        .unwrap()
}

fn task(id: &str, status: &str, urls: &[String]) -> serde_json::Value {
    let results: Vec<_> = urls.iter().map(|u| json!({"url": u})).collect();
    json!({
        "request_id": "req-wanx",
        "output": {"task_id": id, "task_status": status, "results": results},
        "usage": {"image_count": results.len()}
    })
}

#[tokio::test]
async fn qwen_sync_chat_roundtrip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/services/aigc/text-generation/generation"))
        .and(header("authorization", "Bearer KEY"))
        .and(body_partial_json(json!({
            "model": "qwen-turbo",
            "parameters": {"result_format": "message"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": {"choices": [{
                "message": {"role": "assistant", "content": "Hello! This is a mock message."},
                "finish_reason": "stop"
            }]},
            "usage": {"total_tokens": 15, "input_tokens": 6, "output_tokens": 9},
            "request_id": "mock-ac55-9fd3-8326-8415cbdf5683"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client(&server)
        .create_completion(ChatRequest::new(vec![Message::user("Hello!")]))
        .await
        .unwrap();
    assert_eq!(resp.text(), "Hello! This is a mock message.");
    assert_eq!(resp.usage.output_tokens, 9);
}

#[tokio::test]
async fn api_error_body_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/services/aigc/text-generation/generation"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "InvalidApiKey",
            "message": "Invalid API-key provided.",
            "request_id": "e1f2"
        })))
        .mount(&server)
        .await;

    let err = TongyiLlm::new(client(&server))
        .call("Hello!", CallOptions::new())
        .await
        .unwrap_err();
    match &err {
        LlmError::ApiError { code, message, .. } => {
            assert_eq!(*code, 401);
            assert!(message.contains("InvalidApiKey"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.status_code(), Some(401));
}

#[tokio::test]
async fn embeddings_come_back_in_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/services/embeddings/text-embedding/text-embedding"))
        .and(body_partial_json(json!({
            "model": "text-embedding-v1",
            "input": {"texts": ["first", "second"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": {"embeddings": [
                {"text_index": 1, "embedding": [0.0, 1.0]},
                {"text_index": 0, "embedding": [1.0, 0.0]}
            ]},
            "usage": {"total_tokens": 3},
            "request_id": "emb"
        })))
        .mount(&server)
        .await;

    let vectors = client(&server)
        .create_embedding(EmbeddingRequest::new(vec!["first".into(), "second".into()]))
        .await
        .unwrap();
    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[tokio::test]
async fn wanx_task_lifecycle() {
    let server = MockServer::start().await;
    let image_url = format!("{}/results/cat.png", server.uri());

    Mock::given(method("POST"))
        .and(path("/api/v1/services/aigc/text2image/image-synthesis"))
        .and(header("x-dashscope-async", "enable"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task("task-42", "PENDING", &[])))
        .expect(1)
        .mount(&server)
        .await;
    // Earlier mounts win while they still have budget.
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/task-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task("task-42", "RUNNING", &[])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/task-42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(task(
                "task-42",
                "SUCCEEDED",
                std::slice::from_ref(&image_url),
            )),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/cat.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PNG.to_vec(), "image/png"))
        .mount(&server)
        .await;

    let blobs = client(&server)
        .create_image_generation(ImageSynthesisRequest::wanx_v1("a cat").with_n(1))
        .await
        .unwrap();
    assert_eq!(blobs.len(), 1);
    assert_eq!(blobs[0].url, image_url);
    assert_eq!(blobs[0].mime_type, "image/png");
    assert_eq!(blobs[0].data, PNG);

    let requests = server.received_requests().await.unwrap();
    let polls = requests
        .iter()
        .filter(|r| r.url.path() == "/api/v1/tasks/task-42")
        .count();
    assert_eq!(polls, 2);
    let download = requests
        .iter()
        .find(|r| r.url.path() == "/results/cat.png")
        .unwrap();
    assert!(!download.headers.contains_key("authorization"));
}

#[tokio::test]
async fn wanx_failed_task_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/services/aigc/text2image/image-synthesis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task("task-7", "PENDING", &[])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/task-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task("task-7", "FAILED", &[])))
        .mount(&server)
        .await;

    let err = WanxImageTool::new(client(&server))
        .call("a cat")
        .await
        .unwrap_err();
    match err {
        LlmError::TaskUnsuccessful { task_id, status } => {
            assert_eq!(task_id, "task-7");
            assert_eq!(status, "FAILED");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
