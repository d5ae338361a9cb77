//! API Handlers
//!
//! HTTP request handlers for the worker's endpoints and the intercepting
//! proxy route.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::CachedResponse;
use crate::control::ControlHandle;
use crate::error::{Result, WorkerError};
use crate::models::{ControlMessage, HealthResponse};
use crate::network::{FetchRequest, RequestMode};
use crate::worker::Worker;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The worker generation serving requests
    pub worker: Arc<Worker>,
    /// Sending side of the worker's control channel
    pub control: ControlHandle,
}

impl AppState {
    /// Creates a new AppState from a worker and its control channel.
    pub fn new(worker: Arc<Worker>, control: ControlHandle) -> Self {
        Self { worker, control }
    }
}

/// Handler for POST /__worker/message
///
/// Forwards a control message and returns its reply, or `202 Accepted` for
/// messages that have none.
pub async fn message_handler(
    State(state): State<AppState>,
    Json(message): Json<ControlMessage>,
) -> Result<Response> {
    match state.control.send(message).await? {
        Some(reply) => Ok(Json(reply).into_response()),
        None => Ok(StatusCode::ACCEPTED.into_response()),
    }
}

/// Handler for GET /__worker/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.worker.storage().read().await.stats();
    let worker_state = state.worker.state().await;

    Json(HealthResponse::new(
        state.worker.version().as_str(),
        worker_state.as_str(),
        stats,
        state.worker.revalidator().in_flight(),
    ))
}

/// Fallback handler: every other request is intercepted.
///
/// The request is rewritten onto the upstream origin and handed to the
/// worker.
pub async fn fetch_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match build_request(&state, method, &uri, headers, body) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    match state.worker.handle_fetch(request).await {
        Ok(response) => response.into_response(),
        Err(e) => e.into_response(),
    }
}

fn build_request(
    state: &AppState,
    method: Method,
    uri: &Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<FetchRequest> {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let upstream = &state.worker.config().upstream_url;
    let url = upstream
        .join(target)
        .map_err(|e| WorkerError::InvalidRequest(format!("bad request target {}: {}", target, e)))?;

    // A scheme-relative target would otherwise escape the upstream origin
    if url.origin() != upstream.origin() {
        return Err(WorkerError::InvalidRequest(format!(
            "request target {} leaves the upstream origin",
            target
        )));
    }

    let mode = if is_navigation(&method, &headers) {
        RequestMode::Navigate
    } else {
        RequestMode::Other
    };

    Ok(FetchRequest {
        method,
        url,
        headers,
        body,
        mode,
    })
}

/// Navigation is signalled by `Sec-Fetch-Mode: navigate`; older clients are
/// recognised by a GET that accepts HTML.
fn is_navigation(method: &Method, headers: &HeaderMap) -> bool {
    if let Some(mode) = headers.get("sec-fetch-mode").and_then(|v| v.to_str().ok()) {
        return mode.eq_ignore_ascii_case("navigate");
    }

    *method == Method::GET
        && headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(|accept| accept.to_ascii_lowercase().contains("text/html"))
            .unwrap_or(false)
}

// == IntoResponse Implementation ==
impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut headers = self.headers;
        for name in [
            header::CONNECTION,
            header::TRANSFER_ENCODING,
            header::CONTENT_LENGTH,
        ] {
            headers.remove(name);
        }

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStorage;
    use crate::config::Config;
    use crate::control::spawn_control_task;
    use crate::models::ControlReply;
    use crate::network::StubFetcher;

    fn state() -> AppState {
        let config = Config {
            cache_version: "v1".to_string(),
            precache_manifest: Vec::new(),
            ..Config::default()
        };
        let worker = Arc::new(Worker::new(
            config,
            CacheStorage::new(None).shared(),
            Arc::new(StubFetcher::new()),
        ));
        let (control, _task) = spawn_control_task(worker.clone(), 8);
        AppState::new(worker, control)
    }

    #[test]
    fn test_navigation_detection() {
        let mut headers = HeaderMap::new();
        headers.insert("sec-fetch-mode", "navigate".parse().unwrap());
        assert!(is_navigation(&Method::GET, &headers));

        let mut headers = HeaderMap::new();
        headers.insert("sec-fetch-mode", "cors".parse().unwrap());
        headers.insert(header::ACCEPT, "text/html".parse().unwrap());
        assert!(!is_navigation(&Method::GET, &headers));

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, "text/html,application/xhtml+xml".parse().unwrap());
        assert!(is_navigation(&Method::GET, &headers));
        assert!(!is_navigation(&Method::POST, &headers));

        assert!(!is_navigation(&Method::GET, &HeaderMap::new()));
    }

    #[test]
    fn test_cached_response_into_response() {
        let cached = CachedResponse::with_body(StatusCode::CREATED, "text/plain", "made")
            .with_header(header::TRANSFER_ENCODING, "chunked");

        let response = cached.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/plain");
        assert!(response.headers().get(header::TRANSFER_ENCODING).is_none());
    }

    #[tokio::test]
    async fn test_build_request_targets_upstream() {
        let state = state();
        let uri: Uri = "/css/styles.css?v=3".parse().unwrap();

        let request =
            build_request(&state, Method::GET, &uri, HeaderMap::new(), Bytes::new()).unwrap();
        assert_eq!(
            request.url.as_str(),
            "http://127.0.0.1:8080/css/styles.css?v=3"
        );
        assert!(!request.is_navigation());
    }

    #[tokio::test]
    async fn test_build_request_rejects_foreign_origin() {
        let state = state();
        let uri: Uri = "//evil.example.com/steal".parse().unwrap();

        let result = build_request(&state, Method::GET, &uri, HeaderMap::new(), Bytes::new());
        assert!(matches!(result, Err(WorkerError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_message_handler_replies() {
        let state = state();

        let response = message_handler(State(state), Json(ControlMessage::GetVersion))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let reply: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            reply,
            serde_json::to_value(ControlReply::version("v1")).unwrap()
        );
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler(State(state())).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.version, "v1");
        assert_eq!(response.state, "installing");
    }
}
