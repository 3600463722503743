//! HTTP surface: the job-oriented multi-route API the dubbing service
//! exposes over a single `AppState` — submit, poll, cancel, download,
//! and a system status probe.

use crate::rate_limit::RateLimiter;
use crate::upload;
use anyhow::{Context, Result as AnyResult};
use axum::body::Body;
use axum::extract::{ConnectInfo, Multipart, Path as AxumPath, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dub_core::{Config, JobManager};
use dub_protocol::{EngineChoice, JobId, JobSettings, JobStatus, SyncMode};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const CREDENTIAL_NAMES: &[&str] = &["translate_primary", "translate_secondary", "tts_remote", "stt_remote", "evaluator"];

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub job_manager: JobManager,
    pub job_tx: tokio::sync::mpsc::UnboundedSender<JobId>,
    pub rate_limiter: Arc<RateLimiter>,
}

pub async fn serve(state: AppState) -> AnyResult<()> {
    let cors = if state.config.cors_allowed_origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        let origins: Vec<_> = state
            .config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
    };

    let bind_addr = format!("{}:{}", state.config.host, state.config.port);

    let jobs_routes = Router::new()
        .route("/api/jobs", post(create_job))
        .route("/api/jobs/{id}", get(get_job))
        .route("/api/jobs/{id}/cancel", post(cancel_job))
        .route("/api/jobs/{id}/download", get(download_job))
        .layer(middleware::from_fn_with_state(state.clone(), auth_gate));

    let app = Router::new()
        .merge(jobs_routes)
        .route("/api/system/status", get(system_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_gate))
        .with_state(state);

    let addr: SocketAddr = bind_addr.parse().context("invalid bind address")?;
    let listener = TcpListener::bind(addr).await.context("failed to bind")?;
    info!("dub-server listening on {bind_addr}");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")?;
    Ok(())
}

async fn rate_limit_gate(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: Next,
) -> Response {
    if !state.rate_limiter.check(addr.ip()) {
        return (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response();
    }
    next.run(request).await
}

/// Header-supplied key gate on every `/api/jobs*` route, active only
/// when configured with at least one allowed key. `/api/system/status`
/// sits outside this layer.
async fn auth_gate(State(state): State<AppState>, headers: HeaderMap, request: axum::extract::Request, next: Next) -> Response {
    if !state.config.auth_enabled {
        return next.run(request).await;
    }
    let supplied = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    let authorized = supplied
        .map(|key| state.config.allowed_api_keys.iter().any(|allowed| allowed == key))
        .unwrap_or(false);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }
    next.run(request).await
}

#[derive(Serialize)]
struct CreateJobResponse {
    job_id: JobId,
    status: JobStatus,
}

async fn create_job(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut original_filename: Option<String> = None;
    let mut source_lang = None;
    let mut target_lang = None;
    let mut clone_voice = false;
    let mut verify_translation = false;
    let mut sync_mode = SyncMode::default();
    let mut translation_engine = EngineChoice::Auto;
    let mut tts_engine = EngineChoice::Auto;
    let mut stt_engine = EngineChoice::Auto;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => return bad_request(format!("malformed multipart body: {e}")),
        };
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                original_filename = field.file_name().map(|s| s.to_string());
                match read_capped(field, state.config.upload_cap_bytes).await {
                    Ok(bytes) => file_bytes = Some(bytes),
                    Err(msg) => return bad_request(msg),
                }
            }
            "source_lang" => source_lang = field.text().await.ok(),
            "target_lang" => target_lang = field.text().await.ok(),
            "clone_voice" => clone_voice = field.text().await.map(|v| v == "true").unwrap_or(false),
            "verify_translation" => verify_translation = field.text().await.map(|v| v == "true").unwrap_or(false),
            "sync_mode" => {
                sync_mode = match field.text().await.as_deref() {
                    Ok("natural") => SyncMode::Natural,
                    Ok("video_stretch") => SyncMode::VideoStretch,
                    _ => SyncMode::SpeedSync,
                }
            }
            "translation_engine" => translation_engine = parse_engine_choice(field.text().await.ok()),
            "tts_engine" => tts_engine = parse_engine_choice(field.text().await.ok()),
            "stt_engine" => stt_engine = parse_engine_choice(field.text().await.ok()),
            _ => {}
        }
    }

    let (Some(bytes), Some(filename), Some(source_lang), Some(target_lang)) =
        (file_bytes, original_filename, source_lang, target_lang)
    else {
        return bad_request("missing file, source_lang, or target_lang".into());
    };

    if !upload::extension_allowed(&filename) {
        return bad_request("file extension not allowed".into());
    }

    let sanitized = upload::sanitize_filename(&filename);
    let upload_dir = PathBuf::from(&state.config.upload_dir);
    let resolved = match upload::resolve_upload_path(&upload_dir, &sanitized) {
        Ok(path) => path,
        Err(e) => return bad_request(e.to_string()),
    };

    if let Err(e) = tokio::fs::create_dir_all(&upload_dir).await {
        return internal_error(format!("failed to prepare upload directory: {e}"));
    }
    if let Err(e) = write_upload(&resolved, &bytes).await {
        return internal_error(format!("failed to persist upload: {e}"));
    }

    let settings = JobSettings {
        source_lang,
        target_lang,
        clone_voice,
        verify_translation,
        sync_mode,
        stt_engine,
        translation_engine,
        tts_engine,
    };

    let id = state.job_manager.create(settings, resolved.to_string_lossy().into_owned()).await;
    if state.job_tx.send(id).is_err() {
        warn!("worker pool channel closed, job {id} queued but unclaimed");
    }

    Json(CreateJobResponse {
        job_id: id,
        status: JobStatus::Queued,
    })
    .into_response()
}

async fn read_capped(mut field: axum::extract::multipart::Field<'_>, cap: u64) -> std::result::Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| e.to_string())? {
        buf.extend_from_slice(&chunk);
        if buf.len() as u64 > cap {
            return Err(format!("upload exceeds cap of {cap} bytes"));
        }
    }
    Ok(buf)
}

async fn write_upload(path: &std::path::Path, bytes: &[u8]) -> std::io::Result<()> {
    const CHUNK: usize = 1024 * 1024;
    let mut file = tokio::fs::File::create(path).await?;
    for chunk in bytes.chunks(CHUNK) {
        file.write_all(chunk).await?;
    }
    file.flush().await
}

fn parse_engine_choice(raw: Option<String>) -> EngineChoice {
    match raw.as_deref() {
        None | Some("") | Some("auto") => EngineChoice::Auto,
        Some(id) => EngineChoice::Specific(id.to_string()),
    }
}

async fn get_job(State(state): State<AppState>, AxumPath(id): AxumPath<String>) -> Response {
    let Some(id) = JobId::parse(&id) else {
        return bad_request("job id must be a UUID-v4".into());
    };
    match state.job_manager.get(id).await {
        Ok(view) => Json(view).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "job not found").into_response(),
    }
}

#[derive(Serialize)]
struct CancelResponse {
    acknowledged: bool,
}

async fn cancel_job(State(state): State<AppState>, AxumPath(id): AxumPath<String>) -> Response {
    let Some(id) = JobId::parse(&id) else {
        return bad_request("job id must be a UUID-v4".into());
    };
    match state.job_manager.cancel(id).await {
        Ok(acknowledged) => Json(CancelResponse { acknowledged }).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "job not found").into_response(),
    }
}

async fn download_job(State(state): State<AppState>, AxumPath(id): AxumPath<String>) -> Response {
    let Some(id) = JobId::parse(&id) else {
        return bad_request("job id must be a UUID-v4".into());
    };
    let view = match state.job_manager.get(id).await {
        Ok(view) => view,
        Err(_) => return (StatusCode::NOT_FOUND, "job not found").into_response(),
    };
    let Some(output_path) = view.output_path else {
        return (StatusCode::NOT_FOUND, "job has no output yet").into_response();
    };

    let file = match tokio::fs::File::open(&output_path).await {
        Ok(f) => f,
        Err(e) => return internal_error(format!("failed to open output: {e}")),
    };
    let stream = tokio_util::io::ReaderStream::new(file);
    let body = Body::from_stream(stream);
    let filename = std::path::Path::new(&output_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output.mp4");

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "video/mp4")
        .header("content-disposition", format!("attachment; filename=\"{filename}\""))
        .body(body)
        .unwrap_or_else(|_| internal_error("failed to build response".into()))
}

#[derive(Serialize, Deserialize)]
struct SystemStatus {
    gpu_available: bool,
    vram_bytes: Option<u64>,
    active_jobs: usize,
    credentials: Vec<(String, bool)>,
}

async fn system_status(State(state): State<AppState>) -> Response {
    let gpu_available = cfg!(feature = "stt_local_cuda");
    let active_jobs = state.job_manager.active_count().await;
    let credentials = state.config.credential_presence(CREDENTIAL_NAMES);
    Json(SystemStatus {
        gpu_available,
        vram_bytes: None,
        active_jobs,
        credentials,
    })
    .into_response()
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, message).into_response()
}

fn internal_error(message: String) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}
