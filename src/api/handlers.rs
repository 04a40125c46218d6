//! Request handlers for the API endpoints.

use std::io;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use tracing::warn;

use super::AppState;
use super::types::{ErrorResponse, MetricsResponse, MetricsStatus, RowRecord, RowsQuery, ShareQuery};
use crate::audit::kpi::MetricsRecord;
use crate::audit::refresh::{ShareControl, WAITING_MESSAGE};
use crate::audit::types::{Sample, derive_rows};
use crate::io::report::render_report;
use crate::store::StoreError;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

/// Resolves the share for a request, falling back to the server default.
fn resolve_share(requested: Option<i64>, default: &ShareControl) -> Result<f64, ApiError> {
    match requested {
        None => Ok(default.as_f64()),
        Some(s) => u8::try_from(s)
            .ok()
            .filter(|p| *p <= ShareControl::MAX)
            .map(f64::from)
            .ok_or_else(|| bad_request(format!("`share` ({s}) must be within 0..=100"))),
    }
}

/// Reads the store on the blocking pool so file I/O stays off the async workers.
async fn read_samples(state: &AppState) -> Result<Vec<Sample>, StoreError> {
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || store.read_all())
        .await
        .unwrap_or_else(|e| {
            Err(StoreError::Io {
                path: state.store.path().to_path_buf(),
                source: io::Error::other(e),
            })
        })
}

/// Returns aggregate metrics over the current store contents.
///
/// `GET /metrics` → 200 + `MetricsResponse` JSON
/// `GET /metrics?share=40` → metrics at a 40% renewable share
/// `GET /metrics?share=150` → 400 + `ErrorResponse`
///
/// An empty or unreadable store still answers 200 with zeroed metrics and a
/// `waiting` or `degraded` status.
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ShareQuery>,
) -> Result<Json<MetricsResponse>, ApiError> {
    let share = resolve_share(query.share, &state.share)?;

    let (status, message, metrics) = match read_samples(&state).await {
        Ok(samples) if samples.is_empty() => (
            MetricsStatus::Waiting,
            Some(WAITING_MESSAGE.to_string()),
            MetricsRecord::empty(share),
        ),
        Ok(samples) => (
            MetricsStatus::Ready,
            None,
            MetricsRecord::derive(&samples, share, &state.tariff),
        ),
        Err(e) => {
            warn!(error = %e, "metrics request on unreadable store");
            (MetricsStatus::Degraded, Some(e.to_string()), MetricsRecord::empty(share))
        }
    };

    Ok(Json(MetricsResponse {
        status,
        message,
        peak_load_time: metrics.peak_time_display(),
        metrics,
    }))
}

/// Returns derived rows, optionally filtered by sample index range.
///
/// `GET /rows` → 200 + `Vec<RowRecord>` JSON
/// `GET /rows?from=N&to=M` → filtered range (inclusive)
/// `GET /rows?from=10&to=5` → 400 + `ErrorResponse`
/// Unreadable store → 503 + `ErrorResponse`
pub async fn get_rows(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RowsQuery>,
) -> Result<Json<Vec<RowRecord>>, ApiError> {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err(bad_request(format!("`from` ({from}) must be <= `to` ({to})")));
    }
    let share = resolve_share(query.share, &state.share)?;

    let samples = read_samples(&state).await.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse { error: e.to_string() }),
        )
    })?;

    let records = derive_rows(&samples, share, &state.tariff)
        .iter()
        .enumerate()
        .filter(|(i, _)| *i >= from && *i <= to)
        .map(|(i, row)| RowRecord::new(i, row))
        .collect();

    Ok(Json(records))
}

/// Returns the plain-text audit report.
///
/// `GET /report` → 200 + `text/plain`
/// `GET /report?share=N` → report at the given share
///
/// With no readable data the report shows zeros and `N/A`.
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ShareQuery>,
) -> Result<String, ApiError> {
    let share = resolve_share(query.share, &state.share)?;
    let samples = read_samples(&state).await.unwrap_or_else(|e| {
        warn!(error = %e, "report request on unreadable store");
        Vec::new()
    });
    let metrics = MetricsRecord::derive(&samples, share, &state.tariff);
    Ok(render_report(&metrics, &state.report))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::audit::types::{Sample, Tariff};
    use crate::config::ReportConfig;
    use crate::store::SampleStore;

    fn make_test_state(dir: &tempfile::TempDir, rows: usize) -> Arc<AppState> {
        let store = SampleStore::new(dir.path().join("energy.csv"));
        store.reset().unwrap();
        for s in 0..rows {
            let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
                .and_then(|d| d.and_hms_opt(9, 0, u32::try_from(s).unwrap_or(0)))
                .unwrap_or_default();
            store.append(&Sample::new(ts, 220.0, 1.0 + s as f64)).unwrap();
        }
        Arc::new(AppState {
            store,
            tariff: Tariff::default(),
            share: ShareControl::new(25),
            report: ReportConfig::default(),
        })
    }

    async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Vec<u8>) {
        let app = router(state);
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn metrics_returns_200() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(make_test_state(&dir, 2), "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["metrics"]["sample_count"], 2);
        assert_eq!(json["metrics"]["renewable_share"], 25.0);
        // 220 W + 440 W
        let energy = json["metrics"]["total_energy_kwh"].as_f64().unwrap();
        assert!((energy - 0.66).abs() < 1e-9);
        assert_eq!(json["peak_load_time"], "01-03-2024 09:00 AM");
    }

    #[tokio::test]
    async fn metrics_share_override() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(make_test_state(&dir, 1), "/metrics?share=100").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let saved = json["metrics"]["total_co2_saved_kg"].as_f64().unwrap();
        let total = json["metrics"]["total_co2_kg"].as_f64().unwrap();
        assert!((saved - total).abs() < 1e-12);
    }

    #[tokio::test]
    async fn metrics_waiting_on_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(make_test_state(&dir, 0), "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "waiting");
        assert_eq!(json["peak_load_time"], "N/A");
        assert!(json["metrics"]["peak_load"].is_null());
    }

    #[tokio::test]
    async fn metrics_degraded_on_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(AppState {
            store: SampleStore::new(dir.path().join("missing.csv")),
            tariff: Tariff::default(),
            share: ShareControl::new(0),
            report: ReportConfig::default(),
        });
        let (status, body) = get(state, "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "degraded");
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn metrics_invalid_share_returns_400() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(make_test_state(&dir, 1), "/metrics?share=150").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json.get("error").is_some());
    }

    #[tokio::test]
    async fn share_outside_u8_returns_json_400() {
        let dir = tempfile::tempdir().unwrap();
        for uri in ["/metrics?share=300", "/metrics?share=-5", "/rows?share=1000", "/report?share=256"] {
            let (status, body) = get(make_test_state(&dir, 1), uri).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert!(json["error"].as_str().is_some_and(|e| e.contains("0..=100")), "{uri}");
        }
    }

    #[tokio::test]
    async fn rows_returns_all_samples() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(make_test_state(&dir, 8), "/rows").await;

        assert_eq!(status, StatusCode::OK);
        let json: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.len(), 8);
        assert_eq!(json[0]["timestamp"], "2024-03-01 09:00:00");
    }

    #[tokio::test]
    async fn rows_range_query() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(make_test_state(&dir, 10), "/rows?from=2&to=4").await;

        assert_eq!(status, StatusCode::OK);
        let json: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.len(), 3); // indices 2,3,4
        assert_eq!(json[0]["index"], 2);
        assert_eq!(json[2]["index"], 4);
    }

    #[tokio::test]
    async fn rows_invalid_range_returns_400() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(make_test_state(&dir, 3), "/rows?from=5&to=1").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json.get("error").is_some());
    }

    #[tokio::test]
    async fn report_is_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(make_test_state(&dir, 0), "/report").await;

        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("Total Energy (kWh): 0.00"));
        assert!(text.contains("Peak Load Time: N/A"));
    }
}
