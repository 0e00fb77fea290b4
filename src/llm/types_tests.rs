//! Unit tests for chat-completion types.

use super::types::ChatCompletionBody;
use super::*;
use serde_json::json;

#[test]
fn test_message_constructors() {
    let msg = Message::system("You are a red team");
    assert_eq!(msg.role, MessageRole::System);
    assert_eq!(msg.content, "You are a red team");

    assert_eq!(Message::user("hi").role, MessageRole::User);
    assert_eq!(Message::assistant("hello").role, MessageRole::Assistant);
}

#[test]
fn test_message_role_serializes_lowercase() {
    let value = serde_json::to_value(Message::user("q")).unwrap();
    assert_eq!(value, json!({"role": "user", "content": "q"}));
}

#[test]
fn test_chat_request_builders() {
    let req = ChatRequest::new(vec![Message::user("q")])
        .with_model("gpt-4o")
        .with_temperature(5.0)
        .with_max_tokens(1200)
        .json_output();

    assert_eq!(req.model.as_deref(), Some("gpt-4o"));
    assert_eq!(req.temperature, Some(2.0));
    assert_eq!(req.max_tokens, Some(1200));
    assert_eq!(req.response_format, Some(ResponseFormat::JsonObject));
}

#[test]
fn test_chat_request_defaults_are_unset() {
    let req = ChatRequest::new(vec![]);
    assert!(req.model.is_none());
    assert!(req.temperature.is_none());
    assert!(req.response_format.is_none());
}

#[test]
fn test_body_serializes_response_format() {
    let messages = vec![Message::user("q")];
    let body = ChatCompletionBody {
        model: "gpt-4o-mini",
        messages: &messages,
        temperature: 0.3,
        max_tokens: 100,
        response_format: Some(ResponseFormat::JsonObject),
    };
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value["response_format"], json!({"type": "json_object"}));
    assert_eq!(value["model"], "gpt-4o-mini");
}

#[test]
fn test_body_omits_missing_response_format() {
    let body = ChatCompletionBody {
        model: "m",
        messages: &[],
        temperature: 0.0,
        max_tokens: 1,
        response_format: None,
    };
    let value = serde_json::to_value(&body).unwrap();
    assert!(value.get("response_format").is_none());
}

#[test]
fn test_completion_response_deserializes_without_usage() {
    let response: ChatCompletionResponse = serde_json::from_value(json!({
        "choices": [{"message": {"content": "{}"}}]
    }))
    .unwrap();
    assert!(response.usage.is_none());
    assert_eq!(response.choices[0].message.content.as_deref(), Some("{}"));
}

#[test]
fn test_token_usage_defaults_missing_fields() {
    let usage: TokenUsage = serde_json::from_value(json!({"prompt_tokens": 12})).unwrap();
    assert_eq!(usage.prompt_tokens, 12);
    assert_eq!(usage.completion_tokens, 0);
    assert_eq!(usage.total_tokens, 0);
}
