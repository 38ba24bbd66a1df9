//! HTTP adapter (§6). Grounded on the teacher's `rag/api.rs`: the
//! same `ApiResponse<T>` envelope and `AppState` composition shape,
//! now routed to the routine-synthesis core instead of the RAG demo
//! endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::catalog::VectorIndex;
use crate::core::CoreError;
use crate::models::{JournalAnalysis, LogEntry, Routine, UserProfile, WeeklyPatternResponse};
use crate::orchestrator::Orchestrator;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_recommendations: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
            fallback_recommendations: None,
        }
    }

    pub fn error(err: &CoreError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
            fallback_recommendations: None,
        }
    }

    /// Same as [`Self::error`], but attaches `fallback_recommendations`
    /// (§7) derived straight from the submitted logs when this error
    /// kind allows it.
    pub fn error_with_fallback(err: &CoreError, logs: &[LogEntry]) -> Self {
        let mut response = Self::error(err);
        if err.allows_fallback() {
            let recs = crate::metrics::fallback_recommendations(logs);
            if !recs.is_empty() {
                response.fallback_recommendations = Some(recs);
            }
        }
        response
    }
}

pub struct AppState {
    pub orchestrator: Orchestrator,
    pub catalog: Arc<VectorIndex>,
    pub llm_configured: bool,
    pub embedding_configured: bool,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/analyze-journal", post(analyze_journal))
        .route("/recommend-routine", post(recommend_routine))
        .route("/weekly-pattern", post(weekly_pattern))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeJournalRequest {
    pub log: LogEntry,
    #[serde(default)]
    pub profile: UserProfile,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRoutineRequest {
    pub logs: Vec<LogEntry>,
    pub days: u32,
    pub frequency: u32,
    #[serde(default)]
    pub profile: UserProfile,
}

#[derive(Debug, Deserialize)]
pub struct WeeklyPatternRequest {
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub profile: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub catalog_size: usize,
    pub llm_configured: bool,
    pub embedding_configured: bool,
}

fn error_status(err: &CoreError) -> StatusCode {
    match err.kind() {
        "InputInvalid" => StatusCode::BAD_REQUEST,
        "CatalogInconsistent" => StatusCode::INTERNAL_SERVER_ERROR,
        "EmbeddingUnavailable" | "ChatUnavailable" | "Http" => StatusCode::BAD_GATEWAY,
        "ResponseMalformed" => StatusCode::UNPROCESSABLE_ENTITY,
        "Deadline" => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn analyze_journal(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeJournalRequest>,
) -> Result<Json<ApiResponse<JournalAnalysis>>, (StatusCode, Json<ApiResponse<JournalAnalysis>>)> {
    let request_id = Uuid::new_v4();
    let span = info_span!("analyze_journal", %request_id);

    async move {
        if request.log.exercises.is_empty() {
            let err = CoreError::input_invalid("log must contain at least one exercise");
            return Err((error_status(&err), Json(ApiResponse::error(&err))));
        }

        let log = request.log.clone();
        match state.orchestrator.analyze_journal(&request.log, request.profile).await {
            Ok(analysis) => Ok(Json(ApiResponse::success(analysis))),
            Err(err) => {
                error!("analyze-journal failed: {err}");
                let body = ApiResponse::error_with_fallback(&err, std::slice::from_ref(&log));
                Err((error_status(&err), Json(body)))
            }
        }
    }
    .instrument(span)
    .await
}

async fn recommend_routine(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendRoutineRequest>,
) -> Result<Json<ApiResponse<Routine>>, (StatusCode, Json<ApiResponse<Routine>>)> {
    if !(1..=14).contains(&request.days) || !(1..=7).contains(&request.frequency) {
        let err = CoreError::input_invalid("days must be 1-14 and frequency must be 1-7");
        return Err((error_status(&err), Json(ApiResponse::error(&err))));
    }

    match state
        .orchestrator
        .synthesize_routine(&request.logs, request.days, request.frequency, request.profile)
        .await
    {
        Ok(routine) => Ok(Json(ApiResponse::success(routine))),
        Err(err) => {
            error!("recommend-routine failed: {err}");
            let body = ApiResponse::error_with_fallback(&err, &request.logs);
            Err((error_status(&err), Json(body)))
        }
    }
}

async fn weekly_pattern(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WeeklyPatternRequest>,
) -> Result<Json<ApiResponse<WeeklyPatternResponse>>, (StatusCode, Json<ApiResponse<WeeklyPatternResponse>>)> {
    if request.logs.len() > 7 {
        let err = CoreError::input_invalid("weekly-pattern accepts at most 7 log entries");
        return Err((error_status(&err), Json(ApiResponse::error(&err))));
    }

    let metrics = crate::metrics::calculate_weekly_metrics(&request.logs);

    match state
        .orchestrator
        .synthesize_weekly_pattern(&metrics, request.profile)
        .await
    {
        Ok(result) => {
            let muscle_analysis = crate::models::MuscleAnalysis {
                overworked: result.muscle_balance.overworked.clone(),
                underworked: result.muscle_balance.underworked.clone(),
                next_target_muscles: result.next_target_muscles.clone(),
                focus: result
                    .daily_details
                    .first()
                    .map(|d| d.focus.clone())
                    .unwrap_or_default(),
            };
            let response = WeeklyPatternResponse {
                recommended_exercises: result.recommended_exercises.clone(),
                muscle_analysis,
                metrics_summary: metrics,
                result,
            };
            Ok(Json(ApiResponse::success(response)))
        }
        Err(err) => {
            error!("weekly-pattern failed: {err}");
            let body = ApiResponse::error_with_fallback(&err, &request.logs);
            Err((error_status(&err), Json(body)))
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    info!("health check");
    Json(HealthResponse {
        status: "ok",
        catalog_size: state.catalog.len(),
        llm_configured: state.llm_configured,
        embedding_configured: state.embedding_configured,
    })
}
