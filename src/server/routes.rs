//! HTTP API routes
//!
//! Exposes the `searchTrails` tool and the markup exporters over HTTP.

use crate::error::{Error, ErrorKind, Result};
use crate::export::{available_exporters, get_exporter, ExportInfo};
use crate::fetch::SearchOutcome;
use crate::format::{available_formats, FormatInfo};
use crate::server::state::AppState;
use crate::tool::{SearchTrailsArgs, ToolFailure, ToolResponse, SEARCH_TRAILS};
use crate::transport::HttpTransport;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Create the API router
pub fn create_router<T>(state: Arc<AppState<T>>) -> Router
where
    T: HttpTransport + 'static,
{
    Router::new()
        .route("/api/search", post(search_handler::<T>))
        .route("/api/export/:format", post(export_handler::<T>))
        .route("/api/formats", get(formats_handler))
        .route("/api/status", get(status_handler::<T>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP status for a failed search
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidQuery => StatusCode::BAD_REQUEST,
        ErrorKind::UpstreamUnavailable
        | ErrorKind::UnparsableResponse
        | ErrorKind::MalformedGeometry => StatusCode::BAD_GATEWAY,
        ErrorKind::EmptyExport => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// API error response, rendered as an error tool payload
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    failure: ToolFailure,
}

impl ApiError {
    fn unknown_format(name: &str) -> Self {
        let err = Error::InvalidQuery(format!("unknown export format: {}", name));
        Self {
            status: StatusCode::NOT_FOUND,
            failure: ToolFailure::from(&err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let err = Error::InvalidQuery(format!(
            "bad {} arguments: {}",
            SEARCH_TRAILS,
            rejection.body_text()
        ));
        ApiError {
            status: StatusCode::BAD_REQUEST,
            failure: ToolFailure::from(&err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ToolResponse::Error(self.failure))).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = status_for(err.kind());
        if status.is_server_error() {
            warn!(status = %status, "request failed: {}", err);
        }
        ApiError {
            status,
            failure: ToolFailure::from(&err),
        }
    }
}

/// Search on behalf of a request, abandoned if the server shuts down
async fn run_search<T: HttpTransport>(state: &AppState<T>, args: &SearchTrailsArgs) -> Result<SearchOutcome> {
    let query = args.to_query(state.config.search.default_max_results)?;
    state
        .fetcher
        .search_cancellable(&query, state.cancelled())
        .await
}

/// Search trails endpoint
///
/// POST /api/search
async fn search_handler<T: HttpTransport + 'static>(
    State(state): State<Arc<AppState<T>>>,
    args: std::result::Result<Json<SearchTrailsArgs>, JsonRejection>,
) -> std::result::Result<Json<ToolResponse>, ApiError> {
    let Json(args) = args?;
    let outcome = run_search(&state, &args).await?;
    Ok(Json(ToolResponse::from_outcome(&outcome, args.include_geometry)))
}

/// Search and return the trails as a markup document
///
/// POST /api/export/:format
async fn export_handler<T: HttpTransport + 'static>(
    State(state): State<Arc<AppState<T>>>,
    Path(format): Path<String>,
    args: std::result::Result<Json<SearchTrailsArgs>, JsonRejection>,
) -> std::result::Result<Response, ApiError> {
    let exporter = get_exporter(&format).ok_or_else(|| ApiError::unknown_format(&format))?;
    let Json(args) = args?;
    let outcome = run_search(&state, &args).await?;
    let document = exporter.export(&outcome.result.trails)?;

    let headers = [
        (header::CONTENT_TYPE, exporter.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"trails.{}\"", exporter.name()),
        ),
    ];
    Ok((headers, document).into_response())
}

/// Status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server is running
    pub running: bool,
    /// Server version
    pub version: String,
    /// Trail service being queried
    pub service: String,
    /// Uptime in seconds
    pub uptime_secs: u64,
}

/// Server status endpoint
///
/// GET /api/status
async fn status_handler<T: HttpTransport + 'static>(
    State(state): State<Arc<AppState<T>>>,
) -> Json<StatusResponse> {
    Json(StatusResponse {
        running: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: state.fetcher.builder().base_url().to_string(),
        uptime_secs: state.uptime().as_secs(),
    })
}

/// Formats list response
#[derive(Debug, Serialize, Deserialize)]
pub struct FormatsResponse {
    /// Renderings of the tool payload
    pub formats: Vec<FormatInfo>,
    /// Markup documents for `/api/export/:format`
    pub exports: Vec<ExportInfo>,
}

/// List available output and export formats
///
/// GET /api/formats
async fn formats_handler() -> Json<FormatsResponse> {
    Json(FormatsResponse {
        formats: available_formats(),
        exports: available_exporters(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fetch::retry::RetryPolicy;
    use crate::fetch::TrailFetcher;
    use crate::geo::GeoPoint;
    use crate::geometry::{encode_line_string, ByteOrder};
    use crate::transport::{HttpResponse, StubTransport};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    const EMPTY: &str = include_str!("../../tests/fixtures/results_empty.html");
    const PAGE: &str = r#"<ul><li class="trail-card" data-trail-id="31"><a class="trail-title" href="/t/31">Puig Sesolles</a></li></ul>"#;

    fn create_test_state(stub: &StubTransport) -> Arc<AppState<StubTransport>> {
        let mut config = Config::default();
        config.service.base_url = "http://stub.test".to_string();
        let fetcher = TrailFetcher::new(stub.clone(), &config).with_policy(RetryPolicy {
            max_retries: 0,
            backoff: Duration::from_millis(1),
            timeout: Duration::from_secs(10),
        });
        Arc::new(AppState::with_fetcher(config, fetcher))
    }

    fn search_url(state: &AppState<StubTransport>, text: &str) -> String {
        let args = SearchTrailsArgs {
            text: Some(text.to_string()),
            ..Default::default()
        };
        let query = args.to_query(state.config.search.default_max_results).unwrap();
        state.fetcher.builder().build(&query).unwrap().url()
    }

    fn script_one_trail(stub: &StubTransport, state: &AppState<StubTransport>) {
        stub.html(search_url(state, "montseny"), PAGE);
        stub.bytes(
            state.fetcher.builder().geometry_request("31").url(),
            encode_line_string(
                &[GeoPoint::new(41.77, 2.43), GeoPoint::new(41.78, 2.44)],
                ByteOrder::LittleEndian,
            ),
        );
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let state = create_test_state(&StubTransport::new());
        let app = create_router(state);

        let response = app
            .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let status: StatusResponse = serde_json::from_slice(&body).unwrap();

        assert!(status.running);
        assert_eq!(status.service, "http://stub.test");
    }

    #[tokio::test]
    async fn test_formats_endpoint() {
        let app = create_router(create_test_state(&StubTransport::new()));

        let response = app
            .oneshot(Request::builder().uri("/api/formats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let formats: FormatsResponse = serde_json::from_slice(&body).unwrap();

        assert!(formats.formats.iter().any(|f| f.name == "json"));
        assert!(formats.exports.iter().any(|e| e.name == "kml"));
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let stub = StubTransport::new();
        let state = create_test_state(&stub);
        script_one_trail(&stub, &state);
        let app = create_router(state);

        let response = app
            .oneshot(post_json("/api/search", serde_json::json!({ "text": "montseny" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["count"], 1);
        assert_eq!(body["trails"][0]["title"], "Puig Sesolles");
    }

    #[tokio::test]
    async fn test_search_zero_results() {
        let stub = StubTransport::new();
        let state = create_test_state(&stub);
        stub.html(search_url(&state, "nowhere"), EMPTY);
        let app = create_router(state);

        let response = app
            .oneshot(post_json("/api/search", serde_json::json!({ "text": "nowhere" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_search_malformed_arguments() {
        let stub = StubTransport::new();
        let state = create_test_state(&stub);

        for body in [
            serde_json::json!({ "text": "x", "lat": 41.0 }),
            serde_json::json!({ "text": 7 }),
        ] {
            let app = create_router(state.clone());
            let response = app.oneshot(post_json("/api/search", body)).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = response.into_body().collect().await.unwrap().to_bytes();
            let parsed: ToolResponse = serde_json::from_slice(&body).unwrap();
            assert_eq!(parsed.error_kind(), Some(ErrorKind::InvalidQuery));
        }
        assert_eq!(stub.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_export_malformed_arguments() {
        let stub = StubTransport::new();
        let app = create_router(create_test_state(&stub));

        let response = app
            .oneshot(post_json("/api/export/kml", serde_json::json!({ "radius": 2 })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "invalid_query");
    }

    #[tokio::test]
    async fn test_search_invalid_query() {
        let stub = StubTransport::new();
        let app = create_router(create_test_state(&stub));

        let response = app
            .oneshot(post_json(
                "/api/search",
                serde_json::json!({ "latitude": 41.5, "radius_km": 3.0 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "invalid_query");
        assert_eq!(body["retryable"], false);
        assert_eq!(stub.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_search_upstream_failure() {
        let stub = StubTransport::new();
        let state = create_test_state(&stub);
        stub.respond(search_url(&state, "sierra"), HttpResponse::new(503, "down"));
        let app = create_router(state);

        let response = app
            .oneshot(post_json("/api/search", serde_json::json!({ "text": "sierra" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "upstream_unavailable");
        assert_eq!(body["retryable"], true);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_search() {
        let stub = StubTransport::new();
        let state = create_test_state(&stub);
        stub.respond_after(
            search_url(&state, "slow"),
            Duration::from_secs(5),
            HttpResponse::new(200, EMPTY),
        );
        let app = create_router(state.clone());

        let pending = tokio::spawn(
            app.oneshot(post_json("/api/search", serde_json::json!({ "text": "slow" }))),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        state.cancel_all();

        let response = pending.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["kind"], "cancelled");
    }

    #[tokio::test]
    async fn test_export_kml() {
        let stub = StubTransport::new();
        let state = create_test_state(&stub);
        script_one_trail(&stub, &state);
        let app = create_router(state);

        let response = app
            .oneshot(post_json("/api/export/kml", serde_json::json!({ "text": "montseny" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/vnd.google-earth.kml+xml"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let kml = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(kml.matches("<Placemark").count(), 1);
        assert!(kml.contains("trail-31"));
    }

    #[tokio::test]
    async fn test_export_nothing_found() {
        let stub = StubTransport::new();
        let state = create_test_state(&stub);
        stub.html(search_url(&state, "nowhere"), EMPTY);
        let app = create_router(state);

        let response = app
            .oneshot(post_json("/api/export/gpx", serde_json::json!({ "text": "nowhere" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["kind"], "empty_export");
    }

    #[tokio::test]
    async fn test_export_unknown_format() {
        let stub = StubTransport::new();
        let app = create_router(create_test_state(&stub));

        let response = app
            .oneshot(post_json("/api/export/shp", serde_json::json!({ "text": "x" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(stub.total_calls(), 0);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::InvalidQuery), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::UnparsableResponse), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::EmptyExport), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(ErrorKind::Cancelled), StatusCode::SERVICE_UNAVAILABLE);
    }
}
