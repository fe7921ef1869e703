//! Mock WebDriver server binary for integration testing
//!
//! This binary implements just enough of the W3C WebDriver HTTP protocol to
//! stand in for chromedriver without a real browser.
//!
//! Behavior is controlled through the environment:
//! - `MOCK_WEBDRIVER_RESULT`: JSON returned by script execution
//! - `MOCK_WEBDRIVER_FAIL`: `session`, `navigate` or `execute` to make that command fail
//! - `MOCK_WEBDRIVER_JOURNAL`: file each handled command is appended to
//! - `MOCK_WEBDRIVER_PIDFILE`: file the server writes its pid to on startup

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};

const SESSION_ID: &str = "mock-session-1";

type Shared = Arc<Mutex<MockState>>;
type Reply = (StatusCode, Json<Value>);

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let port = parse_port(std::env::args().skip(1)).unwrap_or(9515);

    if let Ok(path) = std::env::var("MOCK_WEBDRIVER_PIDFILE") {
        std::fs::write(path, std::process::id().to_string()).expect("Failed to write pidfile");
    }

    let state: Shared = Arc::new(Mutex::new(MockState::from_env()));

    let app = Router::new()
        .route("/status", get(status))
        .route("/session", post(new_session))
        .route("/session/:id", delete(delete_session))
        .route("/session/:id/url", post(navigate))
        .route("/session/:id/execute/sync", post(execute))
        .fallback(unknown_command)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .expect("Failed to bind mock port");
    axum::serve(listener, app).await.expect("Mock server failed");
}

fn parse_port(mut args: impl Iterator<Item = String>) -> Option<u16> {
    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--port=") {
            return value.parse().ok();
        }
        if arg == "--port" {
            return args.next()?.parse().ok();
        }
    }
    None
}

struct MockState {
    result: Value,
    fail: Option<String>,
    journal: Option<String>,
    session_open: bool,
}

impl MockState {
    fn from_env() -> Self {
        let result = std::env::var("MOCK_WEBDRIVER_RESULT")
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_else(|| {
                json!({"log": "OK", "numTests": 10, "failed": 0, "skipped": 0, "success": true})
            });

        Self {
            result,
            fail: std::env::var("MOCK_WEBDRIVER_FAIL").ok(),
            journal: std::env::var("MOCK_WEBDRIVER_JOURNAL").ok(),
            session_open: false,
        }
    }

    fn record(&self, entry: &str) {
        let Some(path) = &self.journal else { return };
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            writeln!(file, "{}", entry).ok();
        }
    }

    fn fails(&self, command: &str) -> bool {
        self.fail.as_deref() == Some(command)
    }

    /// Whether `id` names the open session
    fn owns(&self, id: &str) -> bool {
        self.session_open && id == SESSION_ID
    }
}

async fn status() -> Reply {
    ok(json!({"ready": true, "message": "mock ready"}))
}

async fn new_session(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut state = state.lock().unwrap();
    state.record(&format!("session {}", body["capabilities"]));
    if state.fails("session") {
        return error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "session not created",
            "Chrome failed to start: exited abnormally",
        );
    }
    state.session_open = true;
    ok(json!({"sessionId": SESSION_ID, "capabilities": {"browserName": "chrome"}}))
}

async fn navigate(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let state = state.lock().unwrap();
    if !state.owns(&id) {
        return invalid_session();
    }
    state.record(&format!("navigate {}", body["url"].as_str().unwrap_or("")));
    if state.fails("navigate") {
        return error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "unknown error",
            "net::ERR_FILE_NOT_FOUND",
        );
    }
    ok(Value::Null)
}

async fn execute(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let state = state.lock().unwrap();
    if !state.owns(&id) {
        return invalid_session();
    }
    state.record(&format!("execute {}", body["script"].as_str().unwrap_or("")));
    if state.fails("execute") {
        return error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "javascript error",
            "com is not defined",
        );
    }
    ok(state.result.clone())
}

async fn delete_session(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    let mut state = state.lock().unwrap();
    if !state.owns(&id) {
        return invalid_session();
    }
    state.record("delete");
    state.session_open = false;
    ok(Value::Null)
}

async fn unknown_command() -> Reply {
    error(StatusCode::NOT_FOUND, "unknown command", "unknown command")
}

fn ok(value: Value) -> Reply {
    (StatusCode::OK, Json(json!({ "value": value })))
}

fn invalid_session() -> Reply {
    error(
        StatusCode::NOT_FOUND,
        "invalid session id",
        "session deleted or not found",
    )
}

fn error(status: StatusCode, code: &str, message: &str) -> Reply {
    (
        status,
        Json(json!({"value": {"error": code, "message": message, "stacktrace": ""}})),
    )
}
