//! Shared fixtures for integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::PathBuf;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use idea_war_room::config::{
    AuthConfig, AuthMode, Config, DatabaseConfig, LlmConfig, LogFormat, LoggingConfig,
    RequestConfig, SearchConfig, ServerConfig,
};
use idea_war_room::idea::StructuredIdea;
use idea_war_room::llm::LlmClient;
use idea_war_room::search::SearchClient;
use idea_war_room::storage::SqliteStorage;
use idea_war_room::AppState;

/// Marker phrases from each system prompt, used to route mocked LLM calls.
pub const QUERY_MARKER: &str = "search query strategist";
pub const COMPETITOR_MARKER: &str = "competitive intelligence analyst";
pub const COMMUNITY_MARKER: &str = "community signal analyst";
pub const REGULATORY_MARKER: &str = "regulatory analyst";
pub const MVTA_MARKER: &str = "Multi-Vector Threat Analysis";

pub const JWT_SECRET: &str = "integration-test-secret";

pub fn sample_idea_json() -> Value {
    json!({
        "language": "en",
        "high_concept": "Uber for dog walking in dense cities",
        "value_proposition": "Busy owners get vetted walkers on demand within 15 minutes",
        "success_metric": "500 weekly paid walks within six months",
        "assumptions": {
            "market": ["Urban owners pay for convenience"],
            "technical": ["GPS tracking is reliable indoors"],
            "business_model": ["20% take rate is sustainable"]
        },
        "assets": {
            "key_assets": ["Network of 40 walkers"],
            "brand_narrative": ["Your dog's favorite neighbor"]
        },
        "environment": {
            "user_persona": "Professionals aged 25-40 working long office hours",
            "competitive_landscape": "Rover and Wag dominate"
        }
    })
}

pub fn sample_idea() -> StructuredIdea {
    serde_json::from_value(sample_idea_json()).expect("sample idea deserializes")
}

/// Fast retries so failure paths finish quickly
pub fn request_config(max_attempts: u32) -> RequestConfig {
    RequestConfig {
        timeout_ms: 5000,
        max_attempts,
        retry_delay_ms: 10,
    }
}

pub fn llm_config(base_url: &str) -> LlmConfig {
    LlmConfig {
        api_key: "test-llm-key".to_string(),
        base_url: base_url.to_string(),
        model: "gpt-4o-mini".to_string(),
        temperature: 0.2,
        max_tokens: 2000,
    }
}

pub fn search_config(base_url: &str) -> SearchConfig {
    SearchConfig {
        api_key: "test-search-key".to_string(),
        base_url: base_url.to_string(),
        max_results: 5,
    }
}

pub fn llm_client(base_url: &str, max_attempts: u32) -> LlmClient {
    LlmClient::new(&llm_config(base_url), request_config(max_attempts))
        .expect("Failed to create LLM client")
}

pub fn search_client(base_url: &str, max_attempts: u32) -> SearchClient {
    SearchClient::new(&search_config(base_url), request_config(max_attempts))
        .expect("Failed to create search client")
}

pub fn test_config(base_url: &str, mode: AuthMode) -> Config {
    Config {
        llm: llm_config(base_url),
        search: search_config(base_url),
        database: DatabaseConfig {
            path: PathBuf::from(":memory:"),
            max_connections: 1,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        },
        request: request_config(1),
        auth: AuthConfig {
            mode,
            jwt_secret: JWT_SECRET.to_string(),
            cookie_name: "war_room_session".to_string(),
            token_ttl_secs: 3600,
        },
        server: ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
        },
    }
}

/// App state backed by in-memory SQLite; both providers point at `base_url`
pub async fn test_state(base_url: &str, mode: AuthMode) -> AppState {
    let config = test_config(base_url, mode);
    let storage = SqliteStorage::new_in_memory()
        .await
        .expect("Failed to create in-memory storage");
    let llm = LlmClient::new(&config.llm, config.request.clone()).expect("LLM client");
    let search = SearchClient::new(&config.search, config.request.clone()).expect("search client");
    AppState::new(config, storage, llm, search)
}

/// OpenAI-style chat completion wrapping `content`
pub fn chat_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 80, "total_tokens": 200}
    })
}

/// Answer chat calls whose body contains `marker` with `content`
pub async fn mount_llm(server: &MockServer, marker: &str, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains(marker))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(content)))
        .mount(server)
        .await;
}

pub fn queries_json() -> Value {
    json!({
        "competitor": ["dog walking app", "on-demand pet care", "rover alternatives"],
        "community": ["dog walker reddit", "pet owners forum", "wag reviews"],
        "regulatory": ["pet care business license"]
    })
}

pub fn two_result_search() -> Value {
    json!({
        "results": [
            {
                "query": "dog walking app",
                "results": [
                    {"title": "Rover", "url": "https://rover.com", "content": "Pet sitting marketplace", "score": 0.91},
                    {"title": "Wag", "url": "https://wagwalking.com", "content": "On-demand dog walking", "score": 0.88}
                ]
            },
            {
                "query": "rover alternatives",
                "results": [
                    {"title": "Rover again", "url": "https://rover.com", "content": "Duplicate hit", "score": 0.5}
                ]
            }
        ],
        "answer": "Rover and Wag lead the market.",
        "errors": []
    })
}

pub async fn mount_search(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub fn competitors_json() -> Value {
    json!({
        "competitors": [
            {
                "name": "Rover",
                "description": "Largest pet care marketplace",
                "url": "https://rover.com",
                "strengths": ["Brand recognition"],
                "weaknesses": ["Slow booking"]
            },
            {
                "name": "Wag",
                "description": "On-demand dog walking",
                "url": "https://wagwalking.com",
                "strengths": ["Fast matching"],
                "weaknesses": ["Walker churn"],
                "pricing": "$20 per walk"
            }
        ]
    })
}

pub fn mvta_report_json() -> Value {
    let vectors = ["technical", "market", "social", "legal", "narrative"];
    let vulnerabilities: Vec<Value> = (0..10)
        .map(|i| {
            json!({
                "vector": vectors[i % 5],
                "title": format!("Weakness {}", i),
                "description": "The idea breaks here",
                "score": (i % 5) + 1
            })
        })
        .collect();
    let synthesis: Vec<Value> = vectors
        .iter()
        .map(|v| json!({"vector": v, "score": 3, "summary": "Mixed outlook"}))
        .collect();
    let recommendations: Vec<Value> = (0..5)
        .map(|i| {
            json!({
                "priority": "high",
                "title": format!("Action {}", i),
                "description": "Do this next",
                "addresses": ["market"]
            })
        })
        .collect();

    json!({
        "executive_summary": "Fragile on market and legal fronts.",
        "vulnerabilities": vulnerabilities,
        "cascading_failures": [],
        "vector_synthesis": synthesis,
        "recommendations": recommendations
    })
}
