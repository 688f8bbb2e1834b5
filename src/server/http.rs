// Holler — HTTP protocol layer
//
// axum router exposing the request store on the loopback interface. Every
// handler funnels through the store's critical section; all HTTP I/O stays
// outside it. Cross-origin calls are only annotated as allowed when the
// caller's declared origin is itself a loopback host, so a remote page
// cannot complete requests against the broker while the bundled UI (whose
// port varies) still can.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, HeaderValue, Method};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::notify::Notify;
use crate::store::{NewRequest, Request, RequestStore};

use super::protocol::{AnswerPayload, ApiError, AskPayload};
use super::{watchdog, ServeConfig};

/// Cap on POST bodies. Anything larger is a validation error.
pub const MAX_REQUEST_BODY: usize = 64 * 1024;

const UI_HTML: &str = include_str!("ui.html");

/// Shared handler state. The store and notifier are injected instances,
/// never globals, so tests run against isolated brokers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<RequestStore>,
    notifier: Arc<dyn Notify>,
    shutdown: mpsc::Sender<()>,
    public_url: String,
}

impl AppState {
    pub fn new(
        store: Arc<RequestStore>,
        notifier: Arc<dyn Notify>,
        shutdown: mpsc::Sender<()>,
        public_url: String,
    ) -> Self {
        Self {
            store,
            notifier,
            shutdown,
            public_url,
        }
    }
}

/// Build the broker router with its origin policy and body cap.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            |origin: &HeaderValue, _parts: &axum::http::request::Parts| is_loopback_origin(origin),
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(ui))
        .route("/api/ask", post(ask))
        .route("/api/answer", post(answer))
        .route("/api/status/{id}", get(status))
        .route("/api/pending", get(pending))
        .route("/api/health", get(health))
        .route("/api/shutdown", post(shutdown))
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY))
        .layer(cors)
}

/// Bind the loopback socket and serve until the watchdog fires, a shutdown
/// request arrives, or the process is interrupted. A bind failure is the
/// only fatal startup error.
pub async fn run(
    config: ServeConfig,
    store: Arc<RequestStore>,
    notifier: Arc<dyn Notify>,
) -> std::io::Result<()> {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    let public_url = format!("http://127.0.0.1:{}", config.port);

    let state = AppState::new(
        Arc::clone(&store),
        notifier,
        shutdown_tx.clone(),
        public_url.clone(),
    );
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(url = %public_url, "broker listening");

    tokio::spawn(watchdog::run(store, config.idle_timeout(), shutdown_tx));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown_rx.recv() => tracing::info!("shutdown signal received"),
                _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
            }
        })
        .await
}

// ─── Handlers ────────────────────────────────────────────────────────────────

async fn ui() -> Html<&'static str> {
    Html(UI_HTML)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn pending(State(state): State<AppState>) -> Json<Vec<Request>> {
    Json(state.store.pending())
}

async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Request>, ApiError> {
    state
        .store
        .get(&id)
        .map(Json)
        .ok_or(ApiError::NotFound("not found"))
}

async fn ask(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    let payload: AskPayload = parse_body(body)?;
    let question = payload
        .question
        .ok_or_else(|| ApiError::Validation("missing question".to_string()))?;

    let request = state.store.create(NewRequest {
        question,
        context: payload.context,
        agent: payload.agent,
        task: payload.task,
        request_type: payload.request_type,
        command: payload.command,
    })?;

    tracing::info!(
        id = %request.id,
        agent = request.agent.as_deref().unwrap_or("anonymous"),
        "request created"
    );

    // Best-effort notification; the subprocess call must not block the
    // runtime or the response.
    let notifier = Arc::clone(&state.notifier);
    let url = state.public_url.clone();
    let question = request.question.clone();
    let agent = request.agent.clone();
    tokio::task::spawn_blocking(move || notifier.notify(&question, agent.as_deref(), &url));

    Ok(Json(json!({ "id": request.id })))
}

async fn answer(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    let payload: AnswerPayload = parse_body(body)?;
    let (Some(id), Some(text)) = (payload.id, payload.answer) else {
        return Err(ApiError::Validation("missing id or answer".to_string()));
    };

    if state.store.answer(&id, &text) {
        tracing::info!(id = %id, "request answered");
        Ok(Json(json!({ "status": "ok" })))
    } else {
        Err(ApiError::NotFound("request not found or already answered"))
    }
}

async fn shutdown(State(state): State<AppState>) -> Json<Value> {
    tracing::info!("shutdown requested over the API");
    // Fire and forget: the response may race with the listener closing.
    let _ = state.shutdown.try_send(());
    Json(json!({ "status": "shutting down" }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("not found")
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Decode a JSON body. Oversized, unreadable, and unparseable bodies all
/// collapse to the same validation error; nothing is partially processed.
fn parse_body<T: serde::de::DeserializeOwned>(
    body: Result<Bytes, BytesRejection>,
) -> Result<T, ApiError> {
    let invalid = || ApiError::Validation("invalid request body".to_string());
    let bytes = body.map_err(|_| invalid())?;
    serde_json::from_slice(&bytes).map_err(|_| invalid())
}

/// True iff the declared origin is a loopback host at any port.
fn is_loopback_origin(origin: &HeaderValue) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    ["http://127.0.0.1", "http://localhost"].iter().any(|host| {
        origin == *host
            || origin
                .strip_prefix(host)
                .and_then(|rest| rest.strip_prefix(':'))
                .is_some_and(|port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
