use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::analysis::{analyze, ReportView};
use crate::config::AnalysisConfig;
use crate::pipeline::PipelineError;
use crate::sinks::csv_export;
use crate::sources::DelimitedReadingsSource;

pub const EXPORT_FILE_NAME: &str = "analysis_result.csv";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadInput(String),
    #[error("{0}")]
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Source(_) | PipelineError::Transform { .. } => Self::BadInput(e.to_string()),
            PipelineError::Sink(_) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadInput(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    #[default]
    Comma,
    Pipe,
    Semicolon,
    Tab,
}

impl Delimiter {
    fn byte(self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Pipe => b'|',
            Self::Semicolon => b';',
            Self::Tab => b'\t',
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    #[serde(default)]
    delimiter: Delimiter,
    /// Include the full result table in the JSON response.
    #[serde(default)]
    full: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct AnalysisResponse<'a> {
    #[serde(with = "time::serde::rfc3339")]
    analyzed_at: OffsetDateTime,
    digest: String,
    #[serde(flatten)]
    report: ReportView<'a>,
}

type AppState = Arc<AnalysisConfig>;

pub fn router(cfg: AnalysisConfig, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/analysis", post(analyze_upload))
        .route("/analysis/export", post(export_upload))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(Arc::new(cfg))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn upload_source(cfg: &AnalysisConfig, params: &UploadParams, body: Bytes) -> DelimitedReadingsSource {
    DelimitedReadingsSource::from_bytes(body.to_vec(), params.delimiter.byte())
        .with_location_column(cfg.location_column.clone())
}

async fn analyze_upload(
    State(cfg): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Response, ApiError> {
    metrics::counter!("amr_http_analysis_requests_total").increment(1);

    let report = analyze(upload_source(&cfg, &params, body), &cfg).await?;
    let digest = csv_export::digest(&csv_export::to_csv_bytes(&report.results)?);

    let mut view = ReportView::new(&report, cfg.top_n);
    if params.full {
        view = view.with_results(&report);
    }

    let response = AnalysisResponse {
        analyzed_at: OffsetDateTime::now_utc(),
        digest,
        report: view,
    };
    Ok(Json(response).into_response())
}

async fn export_upload(
    State(cfg): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Response, ApiError> {
    metrics::counter!("amr_http_export_requests_total").increment(1);

    let report = analyze(upload_source(&cfg, &params, body), &cfg).await?;
    let csv = csv_export::to_csv_bytes(&report.results)?;
    let digest = csv_export::digest(&csv);

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
        ),
        (header::ETAG, format!("\"{digest}\"")),
    ];
    Ok((headers, csv).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    const UPLOAD: &str = "LOCATION_CODE,CURRENT_L1,CURRENT_L2,CURRENT_L3,VOLTAGE_L1,VOLTAGE_L2,VOLTAGE_L3\n\
                          X1,0,0,0,220,220,220\n\
                          X2,10,10,10,250,220,220\n\
                          X3,10,10,10,220,,220\n";

    fn app() -> Router {
        router(AnalysisConfig::default(), 1024 * 1024)
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let resp = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn analysis_returns_summary_and_ranking() {
        let resp = app().oneshot(post("/analysis", UPLOAD)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["summary"]["total_rows"], 2);
        assert_eq!(json["summary"]["rejected_rows"], 1);
        assert_eq!(json["digest"].as_str().unwrap().len(), 64);
        assert!(json.get("results").is_none());
        // X2: over_voltage, voltage_drop, active_power_lost
        assert_eq!(json["top_candidates"][0]["location_id"], "X2");
        assert_eq!(json["top_candidates"][0]["active_indicator_count"], 3);
        assert_eq!(json["indicator_counts"].as_array().unwrap().len(), 15);
    }

    #[tokio::test]
    async fn full_flag_includes_results() {
        let resp = app().oneshot(post("/analysis?full=true", UPLOAD)).await.unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["results"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn pipe_delimiter_is_honoured() {
        let resp = app()
            .oneshot(post(
                "/analysis?delimiter=pipe",
                "LOCATION_CODE|CURRENT_L1|CURRENT_L2|CURRENT_L3|VOLTAGE_L1|VOLTAGE_L2|VOLTAGE_L3\nD1|1|1|1|220|220|220\n",
            ))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["summary"]["total_rows"], 1);
    }

    #[tokio::test]
    async fn export_returns_csv_attachment() {
        let resp = app().oneshot(post("/analysis/export", UPLOAD)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
        assert!(resp.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains(EXPORT_FILE_NAME));

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("location_id,current_lost,"));
    }

    #[tokio::test]
    async fn upload_without_location_column_is_bad_request() {
        let resp = app().oneshot(post("/analysis", "CURRENT_L1\n1\n")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["error"].as_str().unwrap().contains("LOCATION_CODE"));
    }
}
