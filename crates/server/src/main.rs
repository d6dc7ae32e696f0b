use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use frame_api::{complete_generation, handle_frame, FrameContext, LinkConfig};
use generation::{GenerationQueue, HttpImageGenerator, ImageGenerator, LoggingImageGenerator};
use serde::Deserialize;
use shared::{
    domain::CastId,
    error::{ApiError, ErrorCode},
    protocol::FrameActionPayload,
};
use storage::{AssetStore, Storage};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod render;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

#[derive(Debug, Deserialize)]
struct ErrorImageQuery {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct CompleteImageRequest {
    image_path: String,
}

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let endpoints = settings.endpoints()?;
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let generator: Arc<dyn ImageGenerator> = match endpoints.generation_url.clone() {
        Some(endpoint) => {
            info!(%endpoint, "image generation enabled");
            Arc::new(HttpImageGenerator::new(endpoint))
        }
        None => {
            warn!("no generation_url configured; generation jobs will only be logged");
            Arc::new(LoggingImageGenerator)
        }
    };

    let frames = FrameContext {
        storage,
        assets: AssetStore::new(endpoints.asset_base_url, settings.asset_bucket.clone()),
        generation: GenerationQueue::spawn(generator),
        links: LinkConfig::new(endpoints.share_base_url, endpoints.profile_base_url)?,
        derivative_owner: settings.derivative_owner.clone(),
    };
    let state = AppState {
        frames,
        public_url: endpoints.public_url,
    };
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/cast/:cast_id", get(first_frame).post(frame_action))
        .route(render::GENERATING_IMAGE_PATH, get(generating_image))
        .route(render::ERROR_IMAGE_PATH, get(error_image))
        .route("/casts/:cast_id/image", post(http_complete_image))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.frames.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn first_frame(
    State(state): State<Arc<AppState>>,
    Path(cast_id): Path<i64>,
) -> Result<Html<String>, HttpError> {
    let page = handle_frame(&state.frames, CastId(cast_id), None, None)
        .await
        .map_err(http_error)?;
    render_page(&state, &page)
}

async fn frame_action(
    State(state): State<Arc<AppState>>,
    Path(cast_id): Path<i64>,
    Json(payload): Json<FrameActionPayload>,
) -> Result<Html<String>, HttpError> {
    let previous = match payload.previous_state() {
        Some(Ok(previous)) => Some(previous),
        Some(Err(error)) => {
            warn!(cast_id, %error, "discarding unreadable frame state");
            None
        }
        None => None,
    };
    let action = payload.action();
    info!(
        cast_id,
        button_index = action.button_index,
        fid = ?payload.untrusted_data.fid,
        "frame action"
    );

    let page = handle_frame(&state.frames, CastId(cast_id), previous, Some(&action))
        .await
        .map_err(http_error)?;
    render_page(&state, &page)
}

fn render_page(state: &AppState, page: &frame_api::FramePage) -> Result<Html<String>, HttpError> {
    render::frame_document(page, &state.public_url)
        .map(Html)
        .map_err(|e| {
            http_error(ApiError::new(
                ErrorCode::Internal,
                format!("failed to encode frame state: {e}"),
            ))
        })
}

async fn generating_image() -> impl IntoResponse {
    svg_response(render::generating_svg())
}

async fn error_image(Query(q): Query<ErrorImageQuery>) -> impl IntoResponse {
    svg_response(render::error_svg(&q.message))
}

fn svg_response(svg: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "public, max-age=300"),
        ],
        svg,
    )
}

async fn http_complete_image(
    State(state): State<Arc<AppState>>,
    Path(cast_id): Path<i64>,
    Json(req): Json<CompleteImageRequest>,
) -> Result<StatusCode, HttpError> {
    complete_generation(&state.frames, CastId(cast_id), &req.image_path)
        .await
        .map_err(http_error)?;
    Ok(StatusCode::NO_CONTENT)
}

fn http_error(e: ApiError) -> HttpError {
    let status = match e.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => {
            error!(message = %e.message, "frame request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(e))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
