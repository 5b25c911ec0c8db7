use crate::classify::classify;
use crate::intent::{self, alerts};
use crate::model::{HistoryResponse, Reading, StatusResponse};
use crate::state::{History, LatestReading};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, warn};

const MAX_TRANSCRIPT_CHARS: usize = 1000;

#[derive(Debug, Clone)]
struct AppState {
    latest: LatestReading,
    history: History,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AskQuery {
    q: Option<String>,
}

pub fn create_router(latest: LatestReading, history: History) -> Router {
    let state = AppState { latest, history };

    Router::new()
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/history", get(get_history))
        .route("/api/v1/ask", get(ask))
        .with_state(state)
}

/// Classifies a reading into the status payload served to the dashboard
pub fn build_status(reading: Reading, has_data: bool) -> StatusResponse {
    let comfort = classify(reading.temperature);
    StatusResponse {
        reading,
        has_data,
        comfort,
        presentation: comfort.presentation(),
        alerts: alerts(&reading),
    }
}

async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let reading = state.latest.get().await;
    let has_data = state.latest.has_data().await;
    Json(build_status(reading, has_data))
}

async fn get_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let limit = params.limit.unwrap_or(100).min(1000);
    let data = state.history.snapshot(limit).await;
    let total = state.history.len().await;

    Json(HistoryResponse { data, total, limit })
}

async fn ask(
    State(state): State<AppState>,
    Query(params): Query<AskQuery>,
) -> Result<Json<intent::Response>, AppError> {
    let transcript = params.q.unwrap_or_default();
    if transcript.chars().count() > MAX_TRANSCRIPT_CHARS {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "Transcript longer than {} characters",
            MAX_TRANSCRIPT_CHARS
        )));
    }

    let detected = intent::detect(&transcript);
    debug!("Transcript {:?} -> {:?}", transcript, detected);

    let reading = state.latest.get().await;
    Ok(Json(intent::respond(detected, &reading)))
}

struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    fn bad_request(error: anyhow::Error) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        warn!("Rejected request: {}", self.error);
        (self.status, self.error.to_string()).into_response()
    }
}
