//! HTTP surface for the UI collaborator.
//!
//! Every transition of the session state machine is exposed as an endpoint;
//! the response to each mutation is the fresh session snapshot, so the UI
//! never has to guess what a trigger did. The candidate dashboard reads the
//! archive through its derived view and never mutates it.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use vetter_core::types::{CandidateField, CandidateInfo, Question, ResumeFile};

use crate::archive::{ArchiveQuery, CandidateRecord, SortDirection, SortKey};
use crate::state_machine::event::Event;
use crate::state_machine::state::{FinalizeStatus, SessionState};
use crate::AppState;

/// Read-only snapshot of the session as exposed to the UI.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: String,
    pub candidate: Option<CandidateInfo>,
    pub error: Option<String>,
    pub questions: Vec<Question>,
    pub answers: Vec<String>,
    pub current_index: Option<usize>,
    pub score: Option<u8>,
    pub resume_pending: bool,
}

impl SessionSnapshot {
    pub fn from_state(state: &SessionState, resume_pending: bool) -> Self {
        let score = match state {
            SessionState::Completed {
                finalize: FinalizeStatus::Scored { score },
                ..
            } => Some(*score),
            _ => None,
        };

        Self {
            status: state.status_name().to_string(),
            candidate: state.candidate().cloned(),
            error: state.error().map(str::to_string),
            questions: state.questions().to_vec(),
            answers: state.answers().to_vec(),
            current_index: state.current_index(),
            score,
            resume_pending,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub file_name: String,
    /// Base64-encoded document bytes.
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct FieldEditRequest {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question_index: usize,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ResumeDecisionRequest {
    pub decision: String,
}

#[derive(Debug, Deserialize)]
pub struct CandidatesQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
}

/// Dashboard list response: summary stats plus the filtered, sorted rows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total: usize,
    pub average_score: Option<u32>,
    pub candidates: Vec<CandidateSummaryResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummaryResponse {
    pub id: String,
    pub name: Option<String>,
    pub score: u8,
    pub completed_at: String,
}

/// Full record for the dashboard detail view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDetailResponse {
    pub id: String,
    pub candidate: CandidateInfo,
    pub score: u8,
    pub summary: String,
    pub completed_at: String,
    pub transcript: Vec<TranscriptEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    pub question: String,
    pub difficulty: String,
    pub answer: String,
}

impl CandidateDetailResponse {
    fn from_record(record: CandidateRecord) -> Self {
        let transcript = record
            .questions
            .iter()
            .zip(record.answers.iter())
            .map(|(question, answer)| TranscriptEntry {
                question: question.text.clone(),
                difficulty: question.difficulty.to_string(),
                answer: answer.clone(),
            })
            .collect();

        Self {
            id: record.id.0,
            candidate: record.candidate,
            score: record.score,
            summary: record.summary,
            completed_at: record.completed_at.to_rfc3339(),
            transcript,
        }
    }
}

pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/session", get(get_session))
        .route("/api/session/upload", post(post_upload))
        .route("/api/session/fields", post(post_field))
        .route("/api/session/confirm", post(post_confirm))
        .route("/api/session/cancel", post(post_cancel))
        .route("/api/session/start", post(post_start))
        .route("/api/session/answers", post(post_answer))
        .route("/api/session/restart", post(post_restart))
        .route("/api/session/retry-score", post(post_retry_score))
        .route("/api/session/resume-decision", post(post_resume_decision))
        .route("/api/candidates", get(get_candidates))
        .route("/api/candidates/:id", get(get_candidate))
        .with_state(app_state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "vetter"
    }))
}

/// Run an event through the store and answer with the fresh snapshot.
async fn dispatch(state: &AppState, event: Event) -> Json<SessionSnapshot> {
    let ctx = state.interpreter_context();
    let session = state.store.process_event(event, &ctx).await;
    let resume_pending = state.store.resume_pending().await;
    Json(SessionSnapshot::from_state(&session, resume_pending))
}

async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    let session = state.store.snapshot().await;
    let resume_pending = state.store.resume_pending().await;
    Json(SessionSnapshot::from_state(&session, resume_pending))
}

async fn post_upload(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<SessionSnapshot>, Response> {
    let data = BASE64.decode(request.data.as_bytes()).map_err(|_| {
        (StatusCode::BAD_REQUEST, "data must be valid base64").into_response()
    })?;

    if data.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "uploaded document is empty").into_response());
    }

    Ok(dispatch(
        &state,
        Event::ResumeUploaded {
            resume: ResumeFile::new(request.file_name, data),
        },
    )
    .await)
}

async fn post_field(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FieldEditRequest>,
) -> Result<Json<SessionSnapshot>, Response> {
    let field = CandidateField::parse(&request.field).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "field must be one of: name, email, phone",
        )
            .into_response()
    })?;

    Ok(dispatch(
        &state,
        Event::FieldEdited {
            field,
            value: request.value,
        },
    )
    .await)
}

async fn post_confirm(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    dispatch(&state, Event::DetailsConfirmed).await
}

async fn post_cancel(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    dispatch(&state, Event::InterviewCancelled).await
}

async fn post_start(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    dispatch(&state, Event::InterviewStarted).await
}

async fn post_answer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnswerRequest>,
) -> Json<SessionSnapshot> {
    dispatch(
        &state,
        Event::AnswerSubmitted {
            question_index: request.question_index,
            text: request.text,
        },
    )
    .await
}

async fn post_restart(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    dispatch(&state, Event::SessionRestarted).await
}

async fn post_retry_score(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    dispatch(&state, Event::ScoringRetryRequested).await
}

async fn post_resume_decision(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResumeDecisionRequest>,
) -> Result<Json<SessionSnapshot>, Response> {
    match request.decision.as_str() {
        "resume" => {
            let ctx = state.interpreter_context();
            let session = state.store.resolve_resume(&ctx).await;
            let resume_pending = state.store.resume_pending().await;
            Ok(Json(SessionSnapshot::from_state(&session, resume_pending)))
        }
        "restart" => Ok(dispatch(&state, Event::SessionRestarted).await),
        _ => Err((
            StatusCode::BAD_REQUEST,
            "decision must be \"resume\" or \"restart\"",
        )
            .into_response()),
    }
}

async fn get_candidates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CandidatesQuery>,
) -> Result<Json<DashboardResponse>, Response> {
    let mut query = ArchiveQuery {
        search: params.search,
        ..ArchiveQuery::default()
    };

    if let Some(sort) = params.sort.as_deref() {
        query.sort = SortKey::parse(sort).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "sort must be one of: name, score, date",
            )
                .into_response()
        })?;
    }

    if let Some(dir) = params.dir.as_deref() {
        query.direction = SortDirection::parse(dir).ok_or_else(|| {
            (StatusCode::BAD_REQUEST, "dir must be \"asc\" or \"desc\"").into_response()
        })?;
    }

    let view = state.directory.query(&query).await;

    let candidates = view
        .records
        .into_iter()
        .map(|record| CandidateSummaryResponse {
            id: record.id.0.clone(),
            name: record.candidate.name.clone(),
            score: record.score,
            completed_at: record.completed_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(DashboardResponse {
        total: view.total,
        average_score: view.average_score,
        candidates,
    }))
}

async fn get_candidate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CandidateDetailResponse>, Response> {
    let record = state
        .directory
        .get(&id)
        .await
        .ok_or_else(|| (StatusCode::NOT_FOUND, "no such candidate").into_response())?;

    Ok(Json(CandidateDetailResponse::from_record(record)))
}
