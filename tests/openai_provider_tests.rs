#![cfg(feature = "openai")]

use std::sync::Arc;
use std::time::Duration;

use parlor::agent::build_agent;
use parlor::error::ChatError;
use parlor::provider::openai::OpenAiProvider;
use parlor::provider::{ModelProvider, ProviderRequest};
use parlor::runtime::{AgentRuntime, ModelRuntime};
use parlor::session::{SessionId, SessionRegistry};
use parlor::tools::builtin::current_time_tool;
use parlor::types::{FinishReason, ModelMessage};
use parlor::util::retry::RetryPolicy;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_retry_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(1),
        multiplier: 1.0,
    }
}

fn provider(server: &MockServer, max_attempts: u32) -> OpenAiProvider {
    OpenAiProvider::new("test-key".to_string(), Some(format!("{}/", server.uri())))
        .with_retry_policy(test_retry_policy(max_attempts))
}

fn text_completion(text: &str) -> serde_json::Value {
    json!({
        "choices": [{
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
    })
}

fn request(prompt: &str) -> ProviderRequest {
    ProviderRequest {
        model: "gpt-5-nano".into(),
        messages: vec![ModelMessage::user(prompt)],
        tools: None,
    }
}

#[tokio::test]
async fn chat_completion_happy_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_string_contains("gpt-5-nano"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_completion("Hello!")))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server, 1)
        .generate_text(&request("Hi"))
        .await
        .expect("completion should succeed");

    assert_eq!(response.text, "Hello!");
    assert_eq!(response.usage.total_tokens, 15);
    assert_eq!(response.finish_reason, Some(FinishReason::Stop));
    assert!(response.tool_calls.is_empty());
}

#[tokio::test]
async fn server_error_is_mapped_to_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(json!({"error": {"message": "model unavailable"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server, 1)
        .generate_text(&request("Hi"))
        .await
        .unwrap_err();

    match err {
        ChatError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "model unavailable");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_completion("recovered")))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server, 2).generate_text(&request("Hi")).await.unwrap();
    assert_eq!(response.text, "recovered");
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "bad key"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server, 3)
        .generate_text(&request("Hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Authentication(ref m) if m == "bad key"));
}

#[tokio::test]
async fn runtime_executes_time_tool_against_the_api() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("get_current_time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "get_current_time", "arguments": "{}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains(r#""role":"tool""#))
        .and(body_string_contains(r#""tool_call_id":"call_1""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_completion("It is noon UTC.")))
        .expect(1)
        .mount(&server)
        .await;

    let runtime = ModelRuntime::new(Arc::new(provider(&server, 1)));
    let agent = build_agent("Assistant", "Be brief.", "gpt-5-nano", vec![current_time_tool()]).unwrap();
    let session = SessionRegistry::in_memory()
        .get_or_create(&SessionId::generate())
        .unwrap();

    let result = runtime.run(&agent, "What time is it?", &session).await.unwrap();

    assert_eq!(result.final_output, "It is noon UTC.");
    assert_eq!(result.steps.len(), 2);
    assert_eq!(result.steps[0].tool_calls[0].name, "get_current_time");
    assert_eq!(session.store().len(), 2);
}
