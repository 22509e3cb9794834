//! HTTP API server: axum router and request handlers.
//!
//! The server runs on the tokio async runtime while the render thread
//! runs on a plain `std::thread`. Communication is via `std::sync::mpsc`.
//!
//! ## Rust concepts
//! - `async fn` and `.await` for non-blocking I/O
//! - axum extractors: `State`, `Json`
//! - `Arc` for sharing state across async tasks
//! - Serde `Deserialize` for parsing JSON request bodies
//! - `tower-http` middleware for CORS and request tracing

use crate::PanelConfig;
use crate::config::MAX_BRIGHTNESS;
use crate::program::ProgramKind;
use crate::render::{DisplayState, DisplayStatus, RenderCommand};
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// How often the stream endpoint pushes the latest frame.
const STREAM_INTERVAL: Duration = Duration::from_millis(50);

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, passed to every handler via axum's `State` extractor.
///
/// Rust concept: CLONE for Arc
/// `Arc` is cheap to clone, it just bumps a counter. axum clones the state for
/// each request, so everything inside must be cheaply cloneable.
#[derive(Clone)]
pub struct AppState {
    /// Channel to send commands to the render thread
    pub command_tx: Sender<RenderCommand>,
    /// Shared display status (render thread writes, handlers read)
    pub status: Arc<Mutex<DisplayStatus>>,
    /// Last frame shown on the panel, row-major RGB24
    pub latest_frame: Arc<Mutex<Vec<u8>>>,
    /// Panel dimensions
    pub panel: PanelConfig,
}

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(
        get_status,
        get_programs,
        post_program,
        post_brightness,
        post_display_stop,
        ws_display_stream,
    ),
    components(schemas(
        DisplayStatus,
        DisplayState,
        ProgramKind,
        ProgramInfo,
        ProgramRequest,
        BrightnessRequest,
    )),
    tags(
        (name = "display", description = "Display control endpoints"),
        (name = "programs", description = "Animation program endpoints"),
        (name = "system", description = "System status endpoints"),
    ),
    info(
        title = "LED Matrix FX API",
        version = env!("CARGO_PKG_VERSION"),
        description = "HTTP API for choosing and tuning LED matrix animations"
    )
)]
pub struct ApiDoc;

// ── Request/Response types ───────────────────────────────────────────

/// One entry of the program catalogue.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct ProgramInfo {
    /// Identifier accepted by POST /api/v1/program
    pub id: ProgramKind,
    pub name: String,
    pub description: String,
}

impl From<ProgramKind> for ProgramInfo {
    fn from(kind: ProgramKind) -> Self {
        Self {
            id: kind,
            name: kind.name().to_string(),
            description: kind.description().to_string(),
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ProgramRequest {
    /// Program to run. Use GET /api/v1/programs to list them.
    #[schema(example = "lava-lamp")]
    program: ProgramKind,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct BrightnessRequest {
    /// Brightness level (0-100)
    #[schema(example = 75, minimum = 0, maximum = 100)]
    value: u8,
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none")),
        )
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/programs", get(get_programs))
        .route("/api/v1/program", post(post_program))
        .route("/api/v1/brightness", post(post_brightness))
        .route("/api/v1/display/stop", post(post_display_stop))
        .route("/api/v1/display/stream", get(ws_display_stream))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn send_command(state: &AppState, cmd: RenderCommand) -> Result<StatusCode, (StatusCode, String)> {
    state.command_tx.send(cmd).map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Render thread gone".to_string(),
        )
    })?;
    Ok(StatusCode::OK)
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /api/v1/status: return current display state
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "system",
    responses(
        (status = 200, description = "Current display status", body = DisplayStatus)
    )
)]
async fn get_status(State(state): State<AppState>) -> Json<DisplayStatus> {
    let status = state.status.lock().unwrap().clone();
    Json(status)
}

/// GET /api/v1/programs: list every selectable program
#[utoipa::path(
    get,
    path = "/api/v1/programs",
    tag = "programs",
    responses(
        (status = 200, description = "Available programs", body = Vec<ProgramInfo>)
    )
)]
async fn get_programs() -> Json<Vec<ProgramInfo>> {
    Json(ProgramKind::ALL.into_iter().map(ProgramInfo::from).collect())
}

/// POST /api/v1/program: switch to another program
#[utoipa::path(
    post,
    path = "/api/v1/program",
    tag = "programs",
    request_body = ProgramRequest,
    responses(
        (status = 200, description = "Program selected"),
        (status = 422, description = "Unknown program"),
    )
)]
async fn post_program(
    State(state): State<AppState>,
    Json(req): Json<ProgramRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    send_command(&state, RenderCommand::SelectProgram(req.program))
}

/// POST /api/v1/brightness: set display brightness (0-100)
#[utoipa::path(
    post,
    path = "/api/v1/brightness",
    tag = "display",
    request_body = BrightnessRequest,
    responses(
        (status = 200, description = "Brightness updated"),
        (status = 400, description = "Brightness out of range"),
    )
)]
async fn post_brightness(
    State(state): State<AppState>,
    Json(req): Json<BrightnessRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if req.value > MAX_BRIGHTNESS {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Brightness must be 0-{}, got {}", MAX_BRIGHTNESS, req.value),
        ));
    }
    send_command(&state, RenderCommand::SetBrightness(req.value))
}

/// POST /api/v1/display/stop: blank the panel until another program is selected
#[utoipa::path(
    post,
    path = "/api/v1/display/stop",
    tag = "display",
    responses(
        (status = 200, description = "Display stopped"),
    )
)]
async fn post_display_stop(
    State(state): State<AppState>,
) -> Result<StatusCode, (StatusCode, String)> {
    send_command(&state, RenderCommand::Stop)
}

// ── WebSocket streaming ─────────────────────────────────────────────

/// GET /api/v1/display/stream: WebSocket endpoint that mirrors the panel.
///
/// Every 50 ms the server sends the latest frame as one binary message of
/// rows*cols*3 bytes (RGB24, row-major). Messages from the client are ignored
/// apart from Close.
#[utoipa::path(
    get,
    path = "/api/v1/display/stream",
    tag = "display",
    responses(
        (status = 101, description = "Switching to a WebSocket that streams RGB24 frames"),
    )
)]
async fn ws_display_stream(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_stream_socket(socket, state))
}

async fn handle_stream_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("WebSocket stream client connected");

    let mut ticker = tokio::time::interval(STREAM_INTERVAL);
    let mut frame_count: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let frame = state.latest_frame.lock().unwrap().clone();
                if frame.len() != state.panel.frame_byte_count() {
                    continue;
                }
                if let Err(e) = socket.send(Message::Binary(frame.into())).await {
                    tracing::debug!("WebSocket send failed: {}", e);
                    break;
                }
                frame_count += 1;
            }
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::warn!("WebSocket receive error: {}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!(
        "WebSocket stream client disconnected ({} frames sent)",
        frame_count
    );
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use pretty_assertions::assert_eq;
    use std::sync::mpsc::{self, Receiver};

    fn test_state() -> (AppState, Receiver<RenderCommand>) {
        let (tx, rx) = mpsc::channel();
        let panel = PanelConfig::default();
        let state = AppState {
            command_tx: tx,
            status: Arc::new(Mutex::new(DisplayStatus::new(AppConfig::default()))),
            latest_frame: Arc::new(Mutex::new(vec![0; panel.frame_byte_count()])),
            panel,
        };
        (state, rx)
    }

    #[tokio::test]
    async fn status_reports_shared_state() {
        let (state, _rx) = test_state();
        state.status.lock().unwrap().brightness = 30;
        let Json(status) = get_status(State(state)).await;
        assert_eq!(status.brightness, 30);
        assert_eq!(status.program, ProgramKind::Fire);
        assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn programs_lists_every_kind() {
        let Json(programs) = get_programs().await;
        assert_eq!(programs.len(), ProgramKind::ALL.len());
        assert_eq!(programs[0].id, ProgramKind::Static);
        assert!(programs.iter().all(|p| !p.description.is_empty()));
    }

    #[tokio::test]
    async fn program_request_reaches_render_thread() {
        let (state, rx) = test_state();
        let req: ProgramRequest = serde_json::from_str(r#"{ "program": "matrix-rain" }"#).unwrap();
        let code = post_program(State(state), Json(req)).await.unwrap();
        assert_eq!(code, StatusCode::OK);
        assert_eq!(
            rx.try_recv().unwrap(),
            RenderCommand::SelectProgram(ProgramKind::MatrixRain)
        );
    }

    #[test]
    fn unknown_program_is_rejected() {
        let parsed = serde_json::from_str::<ProgramRequest>(r#"{ "program": "disco" }"#);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn brightness_out_of_range_is_rejected() {
        let (state, rx) = test_state();
        let err = post_brightness(State(state), Json(BrightnessRequest { value: 101 }))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn brightness_is_forwarded() {
        let (state, rx) = test_state();
        post_brightness(State(state), Json(BrightnessRequest { value: 40 }))
            .await
            .unwrap();
        assert_eq!(rx.try_recv().unwrap(), RenderCommand::SetBrightness(40));
    }

    #[tokio::test]
    async fn commands_fail_when_render_thread_is_gone() {
        let (state, rx) = test_state();
        drop(rx);
        let err = post_display_stop(State(state)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/status",
            "/api/v1/programs",
            "/api/v1/program",
            "/api/v1/brightness",
            "/api/v1/display/stop",
            "/api/v1/display/stream",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
