use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use mediagrab_core::core::download::download_content;
use mediagrab_core::core::filename::attachment_disposition;
use mediagrab_core::core::metadata::extract_metadata;
use mediagrab_core::core::url_parser;
use mediagrab_core::models::media::{
    AudioCodec, AudioQuality, ContentType, DownloadRequest, MediaReference, VideoContainer, VideoQuality,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::messages::{self, UserMessage};
use crate::session::{session_cookie, Action, AnalyzedMedia, PreparedFile, Session};
use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/options", get(options_handler))
        .route("/api/session", get(session_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/prepare", post(prepare_handler))
        .route("/api/file", get(file_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid url")]
    InvalidUrl,

    #[error("{0} is already running for this session")]
    Busy(&'static str),

    #[error("analyze a link first")]
    NotAnalyzed,

    #[error("no file has been prepared")]
    NoFile,

    #[error("a new link was analyzed while this download ran; prepare it again")]
    Superseded,

    #[error("{}", .0.message)]
    Failed(UserMessage),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let text = self.to_string();
        let (status, kind, message) = match self {
            ApiError::InvalidUrl => {
                let msg = messages::invalid_url();
                (StatusCode::BAD_REQUEST, msg.kind.as_str(), msg.message)
            }
            ApiError::Busy(_) => (StatusCode::CONFLICT, "busy", text),
            ApiError::NotAnalyzed => (StatusCode::CONFLICT, "not_analyzed", text),
            ApiError::NoFile => (StatusCode::NOT_FOUND, "no_file", text),
            ApiError::Superseded => (StatusCode::CONFLICT, "superseded", text),
            ApiError::Failed(msg) => (StatusCode::BAD_GATEWAY, msg.kind.as_str(), msg.message),
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    String::from("internal server error"),
                )
            }
        };

        (status, Json(ErrorBody { kind, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct PrepareRequest {
    pub content_type: ContentType,
    pub extension: String,
    pub quality: String,
}

#[derive(Debug, Serialize)]
pub struct MetadataView {
    pub title: String,
    pub platform: &'static str,
    pub platform_glyph: &'static str,
    pub duration_seconds: Option<u64>,
    pub duration_label: String,
    pub thumbnail_url: Option<String>,
    pub uploader: String,
    pub view_count: u64,
    pub format_count: usize,
    pub source_url: String,
    pub analyzed_at: DateTime<Utc>,
}

impl From<&AnalyzedMedia> for MetadataView {
    fn from(analyzed: &AnalyzedMedia) -> Self {
        let m = &analyzed.metadata;
        Self {
            title: m.title.clone(),
            platform: m.platform.label(),
            platform_glyph: m.platform.glyph(),
            duration_seconds: m.duration_seconds,
            duration_label: m.duration_label(),
            thumbnail_url: m.thumbnail_url.clone(),
            uploader: m.uploader.clone(),
            view_count: m.view_count,
            format_count: m.available_formats.len(),
            source_url: m.source_url.clone(),
            analyzed_at: analyzed.analyzed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileView {
    pub file_name: String,
    pub mime_type: &'static str,
    pub size_bytes: usize,
    pub prepared_at: DateTime<Utc>,
}

impl From<&PreparedFile> for FileView {
    fn from(prepared: &PreparedFile) -> Self {
        Self {
            file_name: prepared.result.file_name.clone(),
            mime_type: prepared.result.mime_type,
            size_bytes: prepared.result.size_bytes(),
            prepared_at: prepared.prepared_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionView {
    metadata: Option<MetadataView>,
    file: Option<FileView>,
}

#[derive(Debug, Serialize)]
struct TypeOptions {
    extensions: Vec<&'static str>,
    qualities: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct OptionsView {
    video: TypeOptions,
    audio: TypeOptions,
}

/// Adds the session cookie to responses for sessions created by this request.
fn with_session_cookie(mut response: Response, session: &Session, created: bool) -> Response {
    if created {
        if let Ok(value) = HeaderValue::from_str(&session_cookie(session.id())) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

async fn index_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (session, created) = state.sessions.resolve(&headers);
    let page = Html(include_str!("../static/index.html")).into_response();
    with_session_cookie(page, &session, created)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.len(),
    }))
}

async fn options_handler() -> impl IntoResponse {
    Json(OptionsView {
        video: TypeOptions {
            extensions: VideoContainer::ALL.iter().map(|c| c.extension()).collect(),
            qualities: VideoQuality::ALL.iter().map(|q| q.label()).collect(),
        },
        audio: TypeOptions {
            extensions: AudioCodec::ALL.iter().map(|c| c.extension()).collect(),
            qualities: AudioQuality::ALL.iter().map(|q| q.label()).collect(),
        },
    })
}

async fn session_handler(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionView> {
    let Some(session) = state.sessions.lookup(&headers) else {
        return Json(SessionView {
            metadata: None,
            file: None,
        });
    };

    let current = session.state().await;
    Json(SessionView {
        metadata: current.analyzed.as_ref().map(MetadataView::from),
        file: current.file.as_ref().map(FileView::from),
    })
}

async fn analyze_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AnalyzeRequest>,
) -> Response {
    // Rejected links never create a session.
    let Some(reference) = url_parser::parse_reference(&req.url) else {
        return ApiError::InvalidUrl.into_response();
    };

    let (session, created) = state.sessions.resolve(&headers);
    let response = analyze(&state, &session, reference).await.into_response();
    with_session_cookie(response, &session, created)
}

async fn analyze(
    state: &AppState,
    session: &Arc<Session>,
    reference: MediaReference,
) -> Result<Json<MetadataView>, ApiError> {
    let gate = session
        .try_begin(Action::Analyze)
        .ok_or(ApiError::Busy("an analysis"))?;

    tracing::info!("Analyzing {} link for session {}", reference.platform, session.id());

    let tool = state.tool.clone();
    let settings = state.settings.clone();
    let session = session.clone();

    // Runs detached so a dropped connection cannot cancel the tool mid-call.
    let task = tokio::spawn(async move {
        let _gate = gate;
        let metadata = extract_metadata(tool.as_ref(), &reference.url, &settings.extraction).await?;
        Ok::<_, anyhow::Error>(session.store_metadata(metadata).await)
    });

    match task.await.map_err(anyhow::Error::from)? {
        Ok(analyzed) => Ok(Json(MetadataView::from(&analyzed))),
        Err(e) => {
            let msg = messages::analyze_failure(&e);
            tracing::warn!("Analyze failed ({}): {:#}", msg.kind.as_str(), e);
            Err(ApiError::Failed(msg))
        }
    }
}

async fn prepare_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PrepareRequest>,
) -> Result<Json<FileView>, ApiError> {
    let session = state.sessions.lookup(&headers).ok_or(ApiError::NotAnalyzed)?;
    prepare(&state, &session, req).await
}

async fn prepare(
    state: &AppState,
    session: &Arc<Session>,
    req: PrepareRequest,
) -> Result<Json<FileView>, ApiError> {
    let (url, generation) = session
        .state()
        .await
        .analyzed
        .as_ref()
        .map(|a| (a.metadata.source_url.clone(), a.generation))
        .ok_or(ApiError::NotAnalyzed)?;

    let gate = session
        .try_begin(Action::Download)
        .ok_or(ApiError::Busy("a download"))?;

    let request = DownloadRequest {
        url,
        content_type: req.content_type,
        extension: req.extension,
        quality: req.quality,
    };

    let tool = state.tool.clone();
    let settings = state.settings.clone();
    let session = session.clone();

    let task = tokio::spawn(async move {
        let _gate = gate;
        let result = download_content(tool.as_ref(), &request, &settings.extraction).await?;
        Ok::<_, anyhow::Error>(session.store_file(result, generation).await)
    });

    match task.await.map_err(anyhow::Error::from)? {
        Ok(Some(prepared)) => Ok(Json(FileView::from(&prepared))),
        Ok(None) => Err(ApiError::Superseded),
        Err(e) => {
            let msg = messages::download_failure(&e);
            tracing::warn!("Download failed ({}): {:#}", msg.kind.as_str(), e);
            Err(ApiError::Failed(msg))
        }
    }
}

async fn file_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let session = state.sessions.lookup(&headers).ok_or(ApiError::NoFile)?;
    let prepared = session.state().await.file.clone().ok_or(ApiError::NoFile)?;
    let result = prepared.result;

    let disposition = HeaderValue::from_str(&attachment_disposition(&result.file_name))
        .map_err(|e| anyhow::anyhow!("Invalid Content-Disposition for {}: {}", result.file_name, e))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(result.mime_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        result.bytes,
    )
        .into_response())
}
