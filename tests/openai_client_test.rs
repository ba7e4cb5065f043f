//! OpenAI client against a fake `/chat/completions` endpoint
//!
//! The fake upstream is a warp server on an ephemeral port. The live test at
//! the bottom needs a real key:
//! 1. Put `OPENAI_API_KEY=...` in `.env`
//! 2. Run: `cargo test --test openai_client_test -- --ignored`

use futures::StreamExt;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use warp::http::{Response, StatusCode};
use warp::Filter;

use mentorbot::llm::{
    FinishReason, GenerateRequest, GenerationConfig, LlmError, LlmProvider, Message,
    OpenAiClient, OpenAiConfig, StreamEvent,
};

type Recorded = Arc<Mutex<Vec<(Option<String>, Value)>>>;

const SSE_BODY: &str = concat!(
    ": keep-alive\n\n",
    "data: {\"id\":\"c1\",\"choices\":[{\"delta\":{\"role\":\"assistant\"},\"finish_reason\":null}]}\n\n",
    "data: {\"id\":\"c1\",\"choices\":[{\"delta\":{\"content\":\"Hello\"},\"finish_reason\":null}]}\n\n",
    "data: {\"id\":\"c1\",\"choices\":[{\"delta\":{\"content\":\", student\"},\"finish_reason\":null}]}\n\n",
    "data: {\"id\":\"c1\",\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
    "data: {\"id\":\"c1\",\"choices\":[],\"usage\":{\"prompt_tokens\":12,\"completion_tokens\":3,\"total_tokens\":15}}\n\n",
    "data: [DONE]\n\n",
);

/// Serve canned completions and record every request body with its auth header
async fn fake_upstream() -> (SocketAddr, Recorded) {
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    let log = recorded.clone();

    let route = warp::path!("v1" / "chat" / "completions")
        .and(warp::post())
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::body::json())
        .map(move |auth: Option<String>, body: Value| {
            log.lock().unwrap().push((auth, body.clone()));

            if body["stream"] == json!(true) {
                Response::builder()
                    .header("content-type", "text/event-stream")
                    .body(SSE_BODY.to_string())
                    .unwrap()
            } else {
                let reply = json!({
                    "id": "c0",
                    "choices": [{
                        "message": { "role": "assistant", "content": "Gravity pulls masses together." },
                        "finish_reason": "stop"
                    }],
                    "usage": { "prompt_tokens": 20, "completion_tokens": 6, "total_tokens": 26 }
                });
                Response::builder()
                    .header("content-type", "application/json")
                    .body(reply.to_string())
                    .unwrap()
            }
        });

    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (addr, recorded)
}

/// Always answer with the given status, headers and body
async fn failing_upstream(status: StatusCode, retry_after: Option<&'static str>) -> SocketAddr {
    let route = warp::any().map(move || {
        let mut builder = Response::builder()
            .status(status)
            .header("content-type", "application/json");
        if let Some(secs) = retry_after {
            builder = builder.header("retry-after", secs);
        }
        let body = json!({ "error": { "message": "upstream says no", "type": "test_error", "code": null } });
        builder.body(body.to_string()).unwrap()
    });

    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

fn client_for(addr: SocketAddr) -> OpenAiClient {
    let config = OpenAiConfig::new(SecretString::new("sk-test".to_string()))
        .with_base_url(format!("http://{}/v1/", addr))
        .with_model("gpt-test")
        .with_timeout(Duration::from_secs(5));
    OpenAiClient::new(config).unwrap()
}

fn request() -> GenerateRequest {
    GenerateRequest {
        messages: vec![
            Message::system("You are a mentor."),
            Message::user("What is gravity?"),
        ],
        config: GenerationConfig::new().with_max_tokens(64),
    }
}

#[tokio::test]
async fn test_generate_round_trip() {
    let (addr, recorded) = fake_upstream().await;
    let client = client_for(addr);

    let completion = client.generate(request()).await.unwrap();

    assert_eq!(completion.id, "c0");
    assert_eq!(completion.text, "Gravity pulls masses together.");
    assert_eq!(completion.finish_reason, FinishReason::Stop);
    let usage = completion.usage.unwrap();
    assert_eq!(usage.input_tokens, 20);
    assert_eq!(usage.output_tokens, 6);

    let recorded = recorded.lock().unwrap();
    let (auth, body) = &recorded[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "gpt-test");
    assert_eq!(body["stream"], false);
    assert_eq!(body["max_tokens"], 64);
    assert!(body.get("stream_options").is_none());
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "What is gravity?");
}

#[tokio::test]
async fn test_stream_generate_yields_fragments_then_end() {
    let (addr, recorded) = fake_upstream().await;
    let client = client_for(addr);

    let events: Vec<StreamEvent> = client
        .stream_generate(request())
        .await
        .unwrap()
        .map(|e| e.unwrap())
        .collect()
        .await;

    assert!(matches!(&events[0], StreamEvent::MessageStart { id } if id == "c1"));

    let text: String = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::TextDelta { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "Hello, student");

    match events.last().unwrap() {
        StreamEvent::MessageEnd {
            finish_reason,
            usage,
        } => {
            assert_eq!(*finish_reason, FinishReason::Stop);
            assert_eq!(usage.unwrap().output_tokens, 3);
        }
        other => panic!("expected MessageEnd, got {:?}", other),
    }

    let recorded = recorded.lock().unwrap();
    let (_, body) = &recorded[0];
    assert_eq!(body["stream"], true);
    assert_eq!(body["stream_options"]["include_usage"], true);
}

#[tokio::test]
async fn test_rate_limit_maps_retry_after() {
    let addr = failing_upstream(StatusCode::TOO_MANY_REQUESTS, Some("7")).await;
    let client = client_for(addr);

    let err = client.generate(request()).await.unwrap_err();
    match err {
        LlmError::RateLimitExceeded { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(7)));
        }
        other => panic!("expected RateLimitExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_auth_failure_carries_upstream_message() {
    let addr = failing_upstream(StatusCode::UNAUTHORIZED, None).await;
    let client = client_for(addr);

    let err = client.generate(request()).await.unwrap_err();
    match err {
        LlmError::AuthenticationError(message) => assert_eq!(message, "upstream says no"),
        other => panic!("expected AuthenticationError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_stream_open_failure_is_returned_before_streaming() {
    let addr = failing_upstream(StatusCode::BAD_GATEWAY, None).await;
    let client = client_for(addr);

    let result = client.stream_generate(request()).await;
    assert!(matches!(
        result,
        Err(LlmError::HttpError { status: 502, .. })
    ));
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_live_openai_stream() {
    dotenvy::dotenv().ok();

    let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY required in .env");
    let client = OpenAiClient::new(OpenAiConfig::new(SecretString::new(api_key))).unwrap();

    let request = GenerateRequest {
        messages: vec![Message::user("What is 2+2? Answer with just the number.")],
        config: GenerationConfig::new().with_max_tokens(16),
    };

    let mut stream = client.stream_generate(request).await.expect("Failed to start stream");
    let mut text = String::new();
    let mut ended = false;

    while let Some(event) = stream.next().await {
        match event.expect("Stream error") {
            StreamEvent::TextDelta { text: t } => text.push_str(&t),
            StreamEvent::MessageEnd { .. } => ended = true,
            _ => {}
        }
    }

    assert!(ended);
    assert!(text.contains('4'), "unexpected reply: {}", text);
}
