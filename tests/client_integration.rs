use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use hf_qa_http::{ClientOptions, EndpointConfig, QaClient, QaError, QueryRequest};
use serde_json::{json, Value as JsonValue};

const MODEL: &str = "deepset/roberta-base-squad2";

#[derive(Clone)]
struct MockResponse {
    status: StatusCode,
    body: String,
    delay: Duration,
}

impl MockResponse {
    fn json(status: StatusCode, body: JsonValue) -> Self {
        Self::text(status, body.to_string())
    }

    fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::from_millis(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone, Debug)]
struct SeenRequest {
    authorization: Option<String>,
    content_type: Option<String>,
    body: JsonValue,
}

#[derive(Clone)]
struct MockState {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    hits: Arc<AtomicUsize>,
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

async fn model_handler(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state
        .seen
        .lock()
        .expect("seen mutex must not be poisoned")
        .push(SeenRequest {
            authorization: header_value(&headers, header::AUTHORIZATION),
            content_type: header_value(&headers, header::CONTENT_TYPE),
            body: serde_json::from_str(&body).unwrap_or(JsonValue::Null),
        });

    let response = {
        let mut queue = state
            .responses
            .lock()
            .expect("response queue mutex must not be poisoned");
        queue.pop_front().unwrap_or_else(|| {
            MockResponse::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "no mock response available"}),
            )
        })
    };

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    (
        response.status,
        [(header::CONTENT_TYPE, "application/json")],
        response.body,
    )
}

struct TestServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl TestServer {
    fn api_base(&self) -> String {
        format!("{}/models", self.base_url)
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn seen(&self) -> Vec<SeenRequest> {
        self.seen
            .lock()
            .expect("seen mutex must not be poisoned")
            .clone()
    }

    fn client(&self) -> QaClient {
        QaClient::new(
            EndpointConfig::new(MODEL)
                .with_api_base(self.api_base())
                .with_token("hf_test"),
        )
        .with_options(fast_options())
    }
}

fn fast_options() -> ClientOptions {
    ClientOptions {
        timeout_ms: 1_000,
        max_retries: 3,
        retry_backoff_ms: 1,
    }
}

async fn spawn_server(responses: Vec<MockResponse>) -> TestServer {
    let state = MockState {
        responses: Arc::new(Mutex::new(responses.into())),
        seen: Arc::new(Mutex::new(Vec::new())),
        hits: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new()
        .route(&format!("/models/{MODEL}"), post(model_handler))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("mock server must run");
    });

    TestServer {
        base_url: format!("http://{address}"),
        hits: state.hits,
        seen: state.seen,
        task,
    }
}

fn paris_body() -> JsonValue {
    json!({ "score": 0.9, "start": 0, "end": 5, "answer": "Paris" })
}

#[tokio::test]
async fn answer_returns_success_record() {
    let server = spawn_server(vec![MockResponse::json(StatusCode::OK, paris_body())]).await;
    let qa = server.client();

    let result = qa
        .answer("What is the capital?", "Paris is the capital of France.")
        .await
        .expect("credential is configured");

    assert!(result.ok);
    assert_eq!(result.answer, "Paris");
    assert_eq!(result.score, 0.9);
    assert_eq!(result.status_code, Some(200));
    assert_eq!(result.error, None);
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn request_carries_bearer_and_json_payload() {
    let server = spawn_server(vec![MockResponse::json(StatusCode::OK, paris_body())]).await;
    let qa = server.client();

    qa.ask(&QueryRequest::new("Which city?", "Paris is lovely."))
        .await
        .expect("ask must succeed");

    let seen = server.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer hf_test"));
    assert_eq!(seen[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(
        seen[0].body,
        json!({ "question": "Which city?", "context": "Paris is lovely." })
    );
}

#[tokio::test]
async fn retries_on_rate_limit_then_succeeds() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::TOO_MANY_REQUESTS, json!({"error": "Rate limit reached"})),
        MockResponse::json(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"error": "Model is currently loading", "estimated_time": 20.0}),
        ),
        MockResponse::json(StatusCode::OK, paris_body()),
    ])
    .await;
    let qa = server.client();

    let answer = qa
        .ask(&QueryRequest::new("What is the capital?", "Paris is the capital of France."))
        .await
        .expect("request must succeed after retries");

    assert_eq!(answer.answer, "Paris");
    assert_eq!(answer.start, Some(0));
    assert_eq!(answer.end, Some(5));
    assert_eq!(server.hits(), 3);
}

#[tokio::test]
async fn service_unavailable_exhausts_retries() {
    let unavailable = MockResponse::json(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({"error": "Model is currently loading"}),
    );
    let server = spawn_server(vec![unavailable.clone(), unavailable.clone(), unavailable]).await;
    let qa = server.client();

    let result = qa
        .answer("What is the capital?", "Paris is the capital of France.")
        .await
        .expect("credential is configured");

    assert!(!result.ok);
    assert_eq!(result.error.as_deref(), Some("Max retries exceeded"));
    assert_eq!(result.status_code, None);
    assert_eq!(server.hits(), 3);
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::BAD_REQUEST, json!({"error": "bad request"})),
        MockResponse::json(StatusCode::OK, paris_body()),
    ])
    .await;
    let qa = server.client();

    let result = qa
        .answer("What is the capital?", "Paris is the capital of France.")
        .await
        .expect("credential is configured");

    assert!(!result.ok);
    assert_eq!(result.error.as_deref(), Some("bad request"));
    assert_eq!(result.status_code, Some(400));
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn server_error_without_json_falls_back_to_status() {
    let server = spawn_server(vec![MockResponse::text(
        StatusCode::INTERNAL_SERVER_ERROR,
        "upstream exploded",
    )])
    .await;
    let qa = server.client();

    let err = qa
        .ask(&QueryRequest::new("q", "c"))
        .await
        .expect_err("request must fail");

    assert_eq!(err.to_string(), "HTTP 500");
    assert_eq!(err.status_code(), Some(500));
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn unparsable_success_body_is_terminal_parse_error() {
    let server = spawn_server(vec![
        MockResponse::text(StatusCode::OK, "<html>not json</html>"),
        MockResponse::json(StatusCode::OK, paris_body()),
    ])
    .await;
    let qa = server.client();

    let result = qa
        .answer("What is the capital?", "Paris is the capital of France.")
        .await
        .expect("credential is configured");

    assert!(!result.ok);
    assert_eq!(result.status_code, Some(200));
    let error = result.error.expect("failure must carry an error");
    assert!(error.starts_with("Parse error: "), "unexpected error: {error}");
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn request_timeout_surfaces_transport_error() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::OK, paris_body()).with_delay(Duration::from_millis(150)),
        MockResponse::json(StatusCode::OK, paris_body()),
    ])
    .await;
    let qa = server.client().with_options(ClientOptions {
        timeout_ms: 20,
        ..fast_options()
    });

    let err = qa
        .ask(&QueryRequest::new("q", "c"))
        .await
        .expect_err("request must timeout");

    assert!(matches!(err, QaError::Transport(_)));
    assert!(err.is_timeout());
    assert_eq!(err.status_code(), None);
    assert!(err.to_string().starts_with("Request failed: "));
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn missing_credential_fails_before_any_request() {
    let server = spawn_server(vec![MockResponse::json(StatusCode::OK, paris_body())]).await;
    let qa = QaClient::new(EndpointConfig::new(MODEL).with_api_base(server.api_base()));

    let err = qa
        .answer("What is the capital?", "Paris is the capital of France.")
        .await
        .expect_err("missing credential must be a configuration error");

    assert_eq!(err, hf_qa_http::ConfigError::MissingCredential);
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn array_success_body_is_parse_error() {
    let server = spawn_server(vec![MockResponse::json(
        StatusCode::OK,
        json!(["Paris", 0.9]),
    )])
    .await;
    let qa = server.client();

    let result = qa
        .answer("What is the capital?", "Paris is the capital of France.")
        .await
        .expect("credential is configured");

    assert!(!result.ok);
    assert_eq!(result.status_code, Some(200));
    assert_eq!(result.answer, "");
    let error = result.error.expect("failure must carry an error");
    assert!(error.starts_with("Parse error: "), "unexpected error: {error}");
    assert_eq!(server.hits(), 1);
}
