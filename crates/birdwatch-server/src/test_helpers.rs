use std::sync::Arc;

use axum::{body::Bytes, http::header, response::Response, Router};
use birdwatch_pipeline::{
    backend::MockChat, search::MockSearch, MockConnector, ModelSelection, ReportPipeline,
};
use tokio::net::TcpListener;

use crate::routes::{build_router, AppState, InnerAppState};
use crate::session::{SessionStore, SESSION_COOKIE};

pub const MULTIPART_BOUNDARY: &str = "birdwatch-test-boundary";

/// Build a router over the given mock connector, returning the state too so
/// tests can inspect sessions directly.
pub fn test_state_with(connector: Arc<MockConnector>) -> (Router, AppState) {
    let state: AppState = Arc::new(InnerAppState {
        pipeline: ReportPipeline::new(connector, ModelSelection::default(), 4),
        sessions: Arc::new(SessionStore::new()),
        max_upload_bytes: 1024 * 1024,
    });
    (build_router(state.clone()), state)
}

/// Build a router whose backends have nothing scripted.
pub fn test_state() -> (Router, AppState) {
    test_state_with(Arc::new(MockConnector::new(
        MockChat::new(),
        MockSearch::with_links(&[]),
    )))
}

pub fn test_router() -> Router {
    test_state().0
}

pub async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
}

/// The `name=value` pair from the response's session cookie.
pub fn session_cookie_from(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    let pair = set_cookie.split(';').next().unwrap().trim().to_string();
    assert!(pair.starts_with(SESSION_COOKIE));
    pair
}

/// Encode the report form as `multipart/form-data` with [`MULTIPART_BOUNDARY`].
/// `image` is `(filename, content type, bytes)`; `None` sends an empty file part
/// the way a browser does when nothing was chosen.
pub fn multipart_body(region: &str, behavior: &str, image: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    let (filename, content_type, bytes) = image.unwrap_or(("", "application/octet-stream", &[]));
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
    for (name, value) in [("region", region), ("behavior", behavior)] {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"{name}\"\r\n\r\n\
                 {value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn a test server on a random port over the given mock connector.
pub async fn spawn_test_server_with(connector: Arc<MockConnector>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let (app, state) = test_state_with(connector);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        state,
        _handle: handle,
    }
}

/// Spawn a test server with nothing scripted. Returns the TestServer
/// with the `base_url` (e.g. "http://127.0.0.1:12345").
pub async fn spawn_test_server() -> TestServer {
    spawn_test_server_with(Arc::new(MockConnector::new(
        MockChat::new(),
        MockSearch::with_links(&[]),
    )))
    .await
}
