//! Backend wire tests
//!
//! Each backend is pointed at a wiremock server and driven through
//! `ModelAdapter::generate`, checking payload shape, auth header and how
//! failures come back.

use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use quorum_engine::llm::adapter::EMPTY_REPLY_NOTE;
use quorum_engine::llm::{AdapterParams, BackendKind, ModelAdapter};
use sdk::types::{Generation, Message, MessageRole};

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn openai_adapter(server: &MockServer) -> ModelAdapter {
    ModelAdapter::new(
        "Router",
        "You are a routing agent.",
        AdapterParams::new()
            .with_model("gpt-4")
            .with_api_key("sk-test-key")
            .with_base_url(format!("{}/v1", server.uri())),
        BackendKind::OpenAI.create(),
        10,
    )
    .unwrap()
}

#[tokio::test]
async fn test_openai_payload_and_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4",
            "temperature": 0.7,
            "max_tokens": 150,
            "messages": [
                {"role": "system", "content": "You are a routing agent."},
                {"role": "user", "content": "write a sorter"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("coding")))
        .expect(1)
        .mount(&server)
        .await;

    let mut adapter = openai_adapter(&server);
    let generation = adapter.generate("write a sorter").await;

    assert_eq!(generation, Generation::Reply("coding".to_string()));
    assert_eq!(adapter.memory().last(), Some(&Message::assistant("coding")));
}

#[tokio::test]
async fn test_openai_auth_failure_is_a_failed_generation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let mut adapter = openai_adapter(&server);
    let generation = adapter.generate("hello").await;

    assert!(generation.is_failure());
    assert!(generation.text().starts_with("Error:"));
    assert!(generation.text().contains("Authentication failed"));
    assert!(!generation.text().contains("sk-test-key"));

    // Failed turns keep the user message but record no reply
    assert_eq!(adapter.memory().last(), Some(&Message::user("hello")));
}

#[tokio::test]
async fn test_server_error_is_a_failed_generation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut adapter = openai_adapter(&server);
    let generation = adapter.generate("hello").await;

    assert!(generation.is_failure());
    assert!(generation.text().contains("Provider unavailable"));
}

#[tokio::test]
async fn test_malformed_body_is_a_failed_generation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let mut adapter = openai_adapter(&server);
    let generation = adapter.generate("hello").await;

    assert!(generation.is_failure());
    assert!(generation.text().contains("Unexpected response format"));
}

#[tokio::test]
async fn test_null_content_is_an_empty_generation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        })))
        .mount(&server)
        .await;

    let mut adapter = openai_adapter(&server);
    let generation = adapter.generate("hello").await;

    assert_eq!(generation, Generation::Empty(EMPTY_REPLY_NOTE.to_string()));
    assert_eq!(
        adapter.memory().last(),
        Some(&Message::assistant(EMPTY_REPLY_NOTE))
    );
}

#[tokio::test]
async fn test_deepseek_posts_to_endpoint_verbatim_and_trims() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer my-deepseek-key"))
        .and(body_partial_json(json!({
            "model": "deepseek-coder",
            "temperature": 0.3
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_reply("\n```python\nprint(1)\n```\n")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut adapter = ModelAdapter::new(
        "DeepCoder",
        "You are a developer.",
        AdapterParams::new()
            .with_api_key("my-deepseek-key")
            .with_base_url(format!("{}/v1/chat/completions", server.uri())),
        BackendKind::DeepSeek.create(),
        10,
    )
    .unwrap();

    let generation = adapter.generate("print one").await;
    assert_eq!(
        generation,
        Generation::Reply("```python\nprint(1)\n```".to_string())
    );

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("max_tokens").is_none());
}

#[tokio::test]
async fn test_ollama_native_chat() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.1:8b",
            "stream": false,
            "options": {"temperature": 0.3}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.1:8b",
            "message": {"role": "assistant", "content": "verification"},
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut adapter = ModelAdapter::new(
        "Router",
        "Route things.",
        AdapterParams::new()
            .with_api_key("ollama")
            .with_base_url(server.uri()),
        BackendKind::Ollama.create(),
        10,
    )
    .unwrap();

    let generation = adapter.generate("check this").await;
    assert_eq!(generation, Generation::Reply("verification".to_string()));
}

#[tokio::test]
async fn test_ollama_null_content_is_an_empty_generation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.1:8b",
            "message": {"role": "assistant", "content": null},
            "done": true
        })))
        .mount(&server)
        .await;

    let mut adapter = ModelAdapter::new(
        "Router",
        "Route things.",
        AdapterParams::new()
            .with_api_key("ollama")
            .with_base_url(server.uri()),
        BackendKind::Ollama.create(),
        10,
    )
    .unwrap();

    let generation = adapter.generate("check this").await;
    assert_eq!(generation, Generation::Empty(EMPTY_REPLY_NOTE.to_string()));
}

#[tokio::test]
async fn test_memory_carries_across_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("ok")))
        .mount(&server)
        .await;

    let mut adapter = openai_adapter(&server);
    adapter.generate("create a jwt encoder").await;
    adapter.generate("do not use a jwt library").await;

    let requests = server.received_requests().await.unwrap();
    let second: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    let roles: Vec<&str> = second["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();

    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    assert_eq!(
        adapter.memory().messages().filter(|m| m.role == MessageRole::User).count(),
        2
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_a_failed_generation() {
    let mut adapter = ModelAdapter::new(
        "Router",
        "Route things.",
        AdapterParams::new()
            .with_api_key("ollama")
            .with_base_url("http://127.0.0.1:9"),
        BackendKind::Ollama.create(),
        10,
    )
    .unwrap();

    let generation = adapter.generate("hello").await;
    assert!(generation.is_failure());
}
