//! HTTP routes.
//!
//! Every session route is keyed by the id returned from `POST /sessions`.
//! Handlers take the session lock only for synchronous work; rendering and
//! remote calls run on a cloned snapshot.

use crate::analysis::{AnalysisError, AnalysisOutcome, AnalysisRequest, run_analysis};
use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sketchlens_core::raster::{PNG_FILE_NAME, PNG_MIME, encode_png_base64};
use sketchlens_core::report::{REPORT_FILE_NAME, REPORT_MIME};
use sketchlens_core::vector::{JSON_FILE_NAME, JSON_MIME};
use sketchlens_core::{
    AnnotationDocument, CanvasConfig, ImportOutcome, Point, Session, VectorObject, encode_png,
};
use sketchlens_render::{decode_reference_image, render_session};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Upload limit for annotation files and reference images.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Most pointer samples accepted in one freehand stroke.
pub const MAX_FREEHAND_POINTS: usize = 10_000;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/config", put(update_config))
        .route("/sessions/{id}/strokes", post(draw_stroke))
        .route("/sessions/{id}/freehand", post(draw_freehand))
        .route("/sessions/{id}/grid", post(set_grid))
        .route("/sessions/{id}/resize", post(resize_canvas))
        .route("/sessions/{id}/clear", post(clear))
        .route(
            "/sessions/{id}/import",
            post(import_document).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/sessions/{id}/reference",
            post(upload_reference).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/sessions/{id}/reference.png", get(reference_png))
        .route("/sessions/{id}/export.png", get(export_png))
        .route("/sessions/{id}/export.json", get(export_json))
        .route("/sessions/{id}/report.md", get(report_markdown))
        .route("/sessions/{id}/analyze", post(analyze))
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
    pub analysis: bool,
    pub speech: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub config: CanvasConfig,
    pub document: AnnotationDocument,
    pub has_report: bool,
    pub has_reference: bool,
}

/// Object counts after a mutation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub objects: usize,
    pub guides: usize,
}

impl DocumentSummary {
    fn of(session: &Session) -> Self {
        let doc = session.document();
        Self {
            objects: doc.len(),
            guides: doc.guides().count(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreehandRequest {
    /// Pointer samples as `[x, y]` pairs.
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreehandResponse {
    pub drawn: bool,
    #[serde(flatten)]
    pub summary: DocumentSummary,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRequest {
    pub show: bool,
    /// Cell size; keeps the current one when omitted.
    #[serde(default)]
    pub size: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeRequest {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    /// The drawing was discarded.
    pub reset: bool,
    #[serde(flatten)]
    pub summary: DocumentSummary,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub imported: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(flatten)]
    pub summary: DocumentSummary,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceResponse {
    pub width: u32,
    pub height: u32,
}

fn attachment(name: &str) -> String {
    format!("attachment; filename=\"{name}\"")
}

/// Run CPU-bound rendering and encoding on the blocking pool.
async fn off_executor<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Worker(e.to_string()))?
}

/// Health check
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: state.session_count(),
        analysis: state.analyzer.is_some(),
        speech: state.speech.is_some(),
    })
}

/// Start a session. The body is an optional (partial) canvas config.
async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let config = if body.iter().all(u8::is_ascii_whitespace) {
        CanvasConfig::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };
    let id = state.create_session(config)?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    state.with_session(id, |entry| {
        Json(SessionView {
            id,
            config: entry.session.config().clone(),
            document: entry.session.document().clone(),
            has_report: entry.session.last_report().is_some(),
            has_reference: entry.reference.is_some(),
        })
    })
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.remove_session(id) {
        info!("session {id} closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

async fn update_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(config): Json<CanvasConfig>,
) -> Result<Json<ResetResponse>, ApiError> {
    state.with_session(id, |entry| {
        let reset = entry.session.update_config(config)?;
        Ok::<_, ApiError>(Json(ResetResponse {
            reset,
            summary: DocumentSummary::of(&entry.session),
        }))
    })?
}

async fn draw_stroke(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(object): Json<VectorObject>,
) -> Result<Json<DocumentSummary>, ApiError> {
    state.with_session(id, |entry| {
        entry.session.draw_stroke(object);
        Json(DocumentSummary::of(&entry.session))
    })
}

async fn draw_freehand(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<FreehandRequest>,
) -> Result<Json<FreehandResponse>, ApiError> {
    if req.points.len() > MAX_FREEHAND_POINTS {
        return Err(ApiError::BadRequest(format!(
            "a stroke takes at most {MAX_FREEHAND_POINTS} points, got {}",
            req.points.len()
        )));
    }
    let points: Vec<Point> = req.points.iter().map(|&[x, y]| Point::new(x, y)).collect();
    state.with_session(id, |entry| {
        let drawn = entry.session.draw_freehand(&points);
        Json(FreehandResponse {
            drawn,
            summary: DocumentSummary::of(&entry.session),
        })
    })
}

async fn set_grid(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<GridRequest>,
) -> Result<Json<DocumentSummary>, ApiError> {
    state.with_session(id, |entry| {
        let size = req.size.unwrap_or(entry.session.config().grid_size);
        entry.session.set_grid(req.show, size)?;
        Ok::<_, ApiError>(Json(DocumentSummary::of(&entry.session)))
    })?
}

async fn resize_canvas(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ResizeRequest>,
) -> Result<Json<ResetResponse>, ApiError> {
    state.with_session(id, |entry| {
        let reset = entry.session.resize_canvas(req.width, req.height)?;
        Ok::<_, ApiError>(Json(ResetResponse {
            reset,
            summary: DocumentSummary::of(&entry.session),
        }))
    })?
}

async fn clear(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentSummary>, ApiError> {
    state.with_session(id, |entry| {
        entry.session.clear();
        Json(DocumentSummary::of(&entry.session))
    })
}

/// Merge an uploaded annotation file. Malformed files are reported as a
/// warning and leave the drawing as it was.
async fn import_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<ImportResponse>, ApiError> {
    state.with_session(id, |entry| {
        let (imported, warning) = match entry.session.import_document(&body) {
            ImportOutcome::Merged { added } => (added, None),
            ImportOutcome::Rejected { warning } => (0, Some(warning)),
        };
        Json(ImportResponse {
            imported,
            warning,
            summary: DocumentSummary::of(&entry.session),
        })
    })
}

async fn upload_reference(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<ReferenceResponse>, ApiError> {
    // Fail fast on unknown sessions before decoding.
    state.with_session(id, |_| ())?;
    let frame = off_executor(move || Ok(decode_reference_image(&body)?)).await?;
    let response = ReferenceResponse {
        width: frame.width(),
        height: frame.height(),
    };
    state.with_session(id, |entry| entry.reference = Some(frame))?;
    Ok(Json(response))
}

async fn reference_png(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let frame = state
        .with_session(id, |entry| entry.reference.clone())?
        .ok_or(ApiError::NoReference)?;
    let png = off_executor(move || Ok(encode_png(&frame)?)).await?;
    Ok(([(header::CONTENT_TYPE, PNG_MIME.to_string())], png))
}

/// Raster export of what the canvas shows, grid included.
async fn export_png(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.with_session(id, |entry| entry.session.clone())?;
    let png = off_executor(move || Ok(encode_png(&render_session(&session)?)?)).await?;
    Ok((
        [
            (header::CONTENT_TYPE, PNG_MIME.to_string()),
            (header::CONTENT_DISPOSITION, attachment(PNG_FILE_NAME)),
        ],
        png,
    ))
}

async fn export_json(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let json = state.with_session(id, |entry| entry.session.export_json())??;
    Ok((
        [
            (header::CONTENT_TYPE, format!("{JSON_MIME}; charset=utf-8")),
            (header::CONTENT_DISPOSITION, attachment(JSON_FILE_NAME)),
        ],
        json,
    ))
}

async fn report_markdown(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let markdown = state
        .with_session(id, |entry| entry.session.last_report().map(|r| r.to_markdown()))?
        .ok_or(ApiError::NoReport)?;
    Ok((
        [
            (header::CONTENT_TYPE, format!("{REPORT_MIME}; charset=utf-8")),
            (header::CONTENT_DISPOSITION, attachment(REPORT_FILE_NAME)),
        ],
        markdown,
    ))
}

/// Analyze the current sketch.
///
/// The canvas is snapshotted first, so a failed or slow analysis never
/// touches the drawing. The report is recorded once the text exists.
async fn analyze(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    let selection = req.selection()?;
    let temperature = req.checked_temperature()?;
    let session = state.with_session(id, |entry| entry.session.clone())?;
    if session.document().exportable().is_empty() {
        return Err(ApiError::EmptyCanvas);
    }
    let analyzer = state.analyzer.clone().ok_or(AnalysisError::NotConfigured)?;

    let image_base64 =
        off_executor(move || Ok(encode_png_base64(&render_session(&session)?)?)).await?;
    let (outcome, report) = run_analysis(
        analyzer.as_ref(),
        state.speech.as_deref(),
        &selection,
        temperature,
        req.speak,
        &image_base64,
    )
    .await?;

    if state
        .with_session(id, |entry| entry.session.record_report(report))
        .is_err()
    {
        warn!("session {id} closed while its analysis was running");
    }
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fakes::{FixedAnalyzer, FixedSpeech};
    use crate::analysis::{SpeechSynthesizer, VisionAnalyzer};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{Value, json};
    use sketchlens_core::{RasterFrame, decode_frame};
    use tower::ServiceExt;

    fn app_with(
        analyzer: Option<Arc<dyn VisionAnalyzer>>,
        speech: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Router {
        router(Arc::new(AppState::new(analyzer, speech)))
    }

    fn app() -> Router {
        app_with(None, None)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn raw_request(method: Method, uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(body.into())
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Bytes) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body)
    }

    async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = send(app, req).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn new_session(app: &Router, config: Option<Value>) -> String {
        let req = match config {
            Some(config) => json_request(Method::POST, "/sessions", config),
            None => raw_request(Method::POST, "/sessions", Body::empty()),
        };
        let (status, body) = send_json(app, req).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    fn line_json() -> Value {
        json!({
            "type": "line", "x1": 10, "y1": 10, "x2": 100, "y2": 100,
            "stroke": "#ff0000", "strokeWidth": 4
        })
    }

    async fn draw_line(app: &Router, id: &str) {
        let uri = format!("/sessions/{id}/strokes");
        let (status, _) = send_json(app, json_request(Method::POST, &uri, line_json())).await;
        assert_eq!(status, StatusCode::OK);
    }

    fn analyze_body() -> Value {
        json!({"style": "bullet-summary", "language": "en", "detail": 3})
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = send_json(&app, raw_request(Method::GET, "/health", Body::empty())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["analysis"], false);
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let app = app();
        let id = new_session(&app, None).await;
        let (status, body) =
            send_json(&app, raw_request(Method::GET, &format!("/sessions/{id}"), Body::empty())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["config"]["width"], 560);
        assert_eq!(body["document"]["version"], "4.6.0");
        assert_eq!(body["document"]["objects"], json!([]));
        assert_eq!(body["hasReport"], false);
    }

    #[tokio::test]
    async fn test_create_session_with_config() {
        let app = app();
        let id = new_session(&app, Some(json!({"showGrid": true, "gridSize": 30}))).await;
        let (_, body) =
            send_json(&app, raw_request(Method::GET, &format!("/sessions/{id}"), Body::empty())).await;
        assert_eq!(body["document"]["objects"].as_array().unwrap().len(), 31);
    }

    #[tokio::test]
    async fn test_create_session_rejects_bad_config() {
        let app = app();
        let (status, body) =
            send_json(&app, json_request(Method::POST, "/sessions", json!({"width": 0}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("positive"));

        let (status, _, _) = send(&app, raw_request(Method::POST, "/sessions", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let app = app();
        let uri = format!("/sessions/{}/export.json", Uuid::new_v4());
        let (status, body) = send_json(&app, raw_request(Method::GET, &uri, Body::empty())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_grid_toggle_twice() {
        let app = app();
        let id = new_session(&app, None).await;
        draw_line(&app, &id).await;
        let uri = format!("/sessions/{id}/grid");
        for _ in 0..2 {
            let (status, body) =
                send_json(&app, json_request(Method::POST, &uri, json!({"show": true, "size": 30}))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"objects": 32, "guides": 31}));
        }
        let (_, body) = send_json(&app, json_request(Method::POST, &uri, json!({"show": false}))).await;
        assert_eq!(body, json!({"objects": 1, "guides": 0}));

        let (status, _) =
            send_json(&app, json_request(Method::POST, &uri, json!({"show": true, "size": 0}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_freehand_and_json_export() {
        let app = app();
        let id = new_session(&app, None).await;
        draw_line(&app, &id).await;
        let (status, body) = send_json(
            &app,
            json_request(
                Method::POST,
                &format!("/sessions/{id}/freehand"),
                json!({"points": [[1, 1], [5, 8], [12, 9]]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["drawn"], true);
        assert_eq!(body["objects"], 2);

        let (status, headers, body) = send(
            &app,
            raw_request(Method::GET, &format!("/sessions/{id}/export.json"), Body::empty()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("application/json"));
        assert!(headers[header::CONTENT_DISPOSITION].to_str().unwrap().contains("annotations.json"));
        let doc = AnnotationDocument::load_bytes(&body).unwrap();
        let kinds: Vec<&str> = doc.iter().map(|o| o.kind()).collect();
        assert_eq!(kinds, vec!["line", "path"]);
    }

    #[tokio::test]
    async fn test_freehand_rejects_oversized_stroke() {
        let app = app();
        let id = new_session(&app, None).await;
        let points: Vec<[f64; 2]> = (0..=MAX_FREEHAND_POINTS)
            .map(|i| [i as f64, if i % 2 == 0 { 50.0 } else { -50.0 }])
            .collect();
        let uri = format!("/sessions/{id}/freehand");
        let (status, body) =
            send_json(&app, json_request(Method::POST, &uri, json!({"points": points}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("10000"));

        let (_, body) =
            send_json(&app, raw_request(Method::GET, &format!("/sessions/{id}"), Body::empty())).await;
        assert_eq!(body["document"]["objects"], json!([]));
    }

    #[tokio::test]
    async fn test_oversized_canvas_rejected() {
        let app = app();
        let (status, _) = send_json(
            &app,
            json_request(Method::POST, "/sessions", json!({"width": 1_000_000, "height": 1_000_000})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let id = new_session(&app, None).await;
        draw_line(&app, &id).await;
        let (status, body) = send_json(
            &app,
            json_request(
                Method::POST,
                &format!("/sessions/{id}/resize"),
                json!({"width": u32::MAX, "height": 10}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("4096px"));

        let (status, _) = send_json(
            &app,
            json_request(Method::POST, &format!("/sessions/{id}/grid"), json!({"show": true, "size": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) =
            send_json(&app, raw_request(Method::GET, &format!("/sessions/{id}"), Body::empty())).await;
        assert_eq!(body["config"]["width"], 560);
        assert_eq!(body["document"]["objects"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_session_limit_answers_503() {
        let app = router(Arc::new(AppState::new(None, None).with_session_limit(1)));
        new_session(&app, None).await;
        let (status, body) =
            send_json(&app, raw_request(Method::POST, "/sessions", Body::empty())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("limit 1"));
    }

    #[tokio::test]
    async fn test_resize_starts_new_document() {
        let app = app();
        let id = new_session(&app, None).await;
        draw_line(&app, &id).await;
        let (status, body) = send_json(
            &app,
            json_request(
                Method::POST,
                &format!("/sessions/{id}/resize"),
                json!({"width": 300, "height": 220}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reset"], true);
        assert_eq!(body["objects"], 0);
    }

    #[tokio::test]
    async fn test_import_merges_and_malformed_warns() {
        let app = app();
        let id = new_session(&app, None).await;
        draw_line(&app, &id).await;
        let uri = format!("/sessions/{id}/import");

        let upload = json!({"version": "4.6.0", "objects": [line_json(), line_json()]});
        let (status, body) =
            send_json(&app, raw_request(Method::POST, &uri, upload.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["imported"], 2);
        assert_eq!(body["objects"], 3);
        assert!(body.get("warning").is_none());

        let (status, body) = send_json(&app, raw_request(Method::POST, &uri, "{\"version\": 1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["imported"], 0);
        assert!(body["warning"].as_str().unwrap().contains("Malformed"));
        assert_eq!(body["objects"], 3);
    }

    #[tokio::test]
    async fn test_png_export() {
        let app = app();
        let id = new_session(&app, Some(json!({"width": 120, "height": 80}))).await;
        draw_line(&app, &id).await;
        let (status, headers, body) = send(
            &app,
            raw_request(Method::GET, &format!("/sessions/{id}/export.png"), Body::empty()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "image/png");
        let frame = decode_frame(&body).unwrap();
        assert_eq!((frame.width(), frame.height()), (120, 80));
        assert_eq!(frame.pixel(50, 50), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(110, 5), Some([255, 255, 255, 255]));
    }

    #[tokio::test]
    async fn test_clear_and_delete() {
        let app = app();
        let id = new_session(&app, None).await;
        draw_line(&app, &id).await;
        let (_, body) = send_json(
            &app,
            raw_request(Method::POST, &format!("/sessions/{id}/clear"), Body::empty()),
        )
        .await;
        assert_eq!(body["objects"], 0);

        let uri = format!("/sessions/{id}");
        let (status, _, _) = send(&app, raw_request(Method::DELETE, &uri, Body::empty())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _, _) = send(&app, raw_request(Method::GET, &uri, Body::empty())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reference_image() {
        let app = app();
        let id = new_session(&app, None).await;
        let uri = format!("/sessions/{id}/reference");

        let (status, _, _) = send(
            &app,
            raw_request(Method::GET, &format!("{uri}.png"), Body::empty()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send_json(&app, raw_request(Method::POST, &uri, "garbage")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let png = encode_png(&RasterFrame::filled(7, 5, [1, 2, 3, 255])).unwrap();
        let (status, body) = send_json(&app, raw_request(Method::POST, &uri, png)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"width": 7, "height": 5}));

        let (status, _, body) = send(
            &app,
            raw_request(Method::GET, &format!("{uri}.png"), Body::empty()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decode_frame(&body).unwrap().width(), 7);
    }

    #[tokio::test]
    async fn test_analyze_requires_drawing() {
        let app = app_with(Some(Arc::new(FixedAnalyzer(Ok("x".into())))), None);
        let id = new_session(&app, Some(json!({"showGrid": true}))).await;
        let uri = format!("/sessions/{id}/analyze");
        let (status, _) = send_json(&app, json_request(Method::POST, &uri, analyze_body())).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_analyze_not_configured() {
        let app = app();
        let id = new_session(&app, None).await;
        draw_line(&app, &id).await;
        let uri = format!("/sessions/{id}/analyze");
        let (status, body) = send_json(&app, json_request(Method::POST, &uri, analyze_body())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_analyze_rejects_invalid_selection() {
        let app = app_with(Some(Arc::new(FixedAnalyzer(Ok("x".into())))), None);
        let id = new_session(&app, None).await;
        draw_line(&app, &id).await;
        let uri = format!("/sessions/{id}/analyze");
        for body in [
            json!({"style": "sonnet", "language": "en"}),
            json!({"style": "tags", "language": "de"}),
            json!({"style": "tags", "language": "en", "detail": 9}),
            json!({"style": "tags", "language": "en", "temperature": 2.0}),
        ] {
            let (status, _) = send_json(&app, json_request(Method::POST, &uri, body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_analyze_failure_keeps_document() {
        let app = app_with(
            Some(Arc::new(FixedAnalyzer(Err("You exceeded your current quota".into())))),
            None,
        );
        let id = new_session(&app, None).await;
        draw_line(&app, &id).await;
        let (status, body) = send_json(
            &app,
            json_request(Method::POST, &format!("/sessions/{id}/analyze"), analyze_body()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "You exceeded your current quota");

        let (_, body) =
            send_json(&app, raw_request(Method::GET, &format!("/sessions/{id}"), Body::empty())).await;
        assert_eq!(body["document"]["objects"].as_array().unwrap().len(), 1);
        assert_eq!(body["hasReport"], false);
    }

    #[tokio::test]
    async fn test_analyze_and_download_report() {
        let app = app_with(
            Some(Arc::new(FixedAnalyzer(Ok("- a red diagonal line".into())))),
            Some(Arc::new(FixedSpeech(None))),
        );
        let id = new_session(&app, None).await;
        draw_line(&app, &id).await;

        let mut req = analyze_body();
        req["speak"] = json!(true);
        req["extraContext"] = json!("Is it straight?");
        let (status, body) = send_json(
            &app,
            json_request(Method::POST, &format!("/sessions/{id}/analyze"), req),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "- a red diagonal line");
        assert!(body["prompt"].as_str().unwrap().ends_with("Is it straight?"));
        assert!(body.get("audioBase64").is_none());
        assert_eq!(body["notices"].as_array().unwrap().len(), 1);

        let (status, headers, body) = send(
            &app,
            raw_request(Method::GET, &format!("/sessions/{id}/report.md"), Body::empty()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/markdown"));
        let markdown = String::from_utf8(body.to_vec()).unwrap();
        assert!(markdown.starts_with("# Sketch analysis"));
        assert!(markdown.ends_with("- a red diagonal line\n"));
    }

    #[tokio::test]
    async fn test_report_missing_before_analysis() {
        let app = app();
        let id = new_session(&app, None).await;
        let (status, _) = send_json(
            &app,
            raw_request(Method::GET, &format!("/sessions/{id}/report.md"), Body::empty()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
