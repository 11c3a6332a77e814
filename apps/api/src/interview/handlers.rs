//! Axum route handlers for the Interview API.
//!
//! A thin layer: multipart/JSON unpacking, the auth extractor, and wire
//! DTOs. Every decision that matters lives in `interview::session` and
//! `interview::report`; handlers translate outcomes into client JSON.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::interview::report::{get_report, Report};
use crate::interview::session::{
    end_interview, load_owned_session, start_interview, submit_answer, AnswerOutcome,
};
use crate::resume::extract_resume_text;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInterviewResponse {
    pub session_id: Uuid,
    pub first_question: String,
    pub audio_url: Option<String>,
    pub total_questions: usize,
}

#[derive(Debug, Deserialize)]
pub struct NextQuestionRequest {
    pub answer: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextQuestionResponse {
    pub success: bool,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<usize>,
}

impl From<AnswerOutcome> for NextQuestionResponse {
    fn from(outcome: AnswerOutcome) -> Self {
        match outcome {
            AnswerOutcome::NextQuestion {
                question,
                audio_url,
                question_number,
                total_questions,
            } => Self {
                success: true,
                is_complete: false,
                next_question: Some(question),
                audio_url,
                question_number: Some(question_number),
                total_questions: Some(total_questions),
            },
            AnswerOutcome::Complete => Self {
                success: true,
                is_complete: true,
                next_question: None,
                audio_url: None,
                question_number: None,
                total_questions: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndInterviewResponse {
    pub success: bool,
    pub is_complete: bool,
    pub final_message: String,
    pub audio_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeResponse {
    pub success: bool,
    pub transcript: String,
    pub confidence: f64,
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart request: {e}"))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/interview/start
///
/// Multipart form: `resume` (PDF or text file) and `bio` (text field).
/// Kicks off a session and returns its opening question.
pub async fn handle_start_interview(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<StartInterviewResponse>, AppError> {
    let mut resume: Option<(Bytes, Option<String>, Option<String>)> = None;
    let mut bio: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("resume") => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(bad_multipart)?;
                resume = Some((data, content_type, file_name));
            }
            Some("bio") => {
                bio = Some(field.text().await.map_err(bad_multipart)?);
            }
            _ => {}
        }
    }

    let (data, content_type, file_name) = resume
        .ok_or_else(|| AppError::Validation("multipart field 'resume' is required".to_string()))?;
    let bio = bio
        .ok_or_else(|| AppError::Validation("multipart field 'bio' is required".to_string()))?;

    let resume_text = extract_resume_text(&data, content_type.as_deref(), file_name.as_deref())?;

    let outcome = start_interview(
        state.store.as_ref(),
        state.llm.as_ref(),
        state.synthesizer.as_ref(),
        user_id,
        &resume_text,
        &bio,
    )
    .await?;

    Ok(Json(StartInterviewResponse {
        session_id: outcome.session_id,
        first_question: outcome.first_question,
        audio_url: outcome.audio_url,
        total_questions: outcome.total_questions,
    }))
}

/// POST /api/interview/:session_id/transcribe
///
/// Multipart form: `audio` (recorded answer). Returns the transcript, or a
/// structured failure the client must surface — a failed transcription is
/// never passed off as an empty answer.
pub async fn handle_transcribe_answer(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    // Ownership is checked before any provider spend.
    load_owned_session(state.store.as_ref(), session_id, user_id).await?;

    let mut audio: Option<(Bytes, String)> = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        if name.as_deref() == Some("audio") {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(bad_multipart)?;
            audio = Some((data, content_type));
        }
    }

    let (data, content_type) = audio
        .ok_or_else(|| AppError::Validation("multipart field 'audio' is required".to_string()))?;

    match state.transcriber.transcribe(data, &content_type).await {
        Ok(result) => Ok(Json(TranscribeResponse {
            success: true,
            transcript: result.transcript,
            confidence: result.confidence,
        })
        .into_response()),
        Err(e) => {
            tracing::error!("Transcription failed for session {session_id}: {e}");
            Ok((
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "success": false,
                    "error": "Transcription failed",
                    "details": e.to_string(),
                })),
            )
                .into_response())
        }
    }
}

/// POST /api/interview/:session_id/next
///
/// Records an answer and returns the next question, or `isComplete: true`
/// once all questions are answered.
pub async fn handle_next_question(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
    Json(request): Json<NextQuestionRequest>,
) -> Result<Json<NextQuestionResponse>, AppError> {
    let outcome = submit_answer(
        state.store.as_ref(),
        state.llm.as_ref(),
        state.synthesizer.as_ref(),
        session_id,
        user_id,
        &request.answer,
    )
    .await?;

    Ok(Json(outcome.into()))
}

/// POST /api/interview/:session_id/end
///
/// Wraps the interview up. Safe to call more than once; repeats replay the
/// closing message.
pub async fn handle_end_interview(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<Json<EndInterviewResponse>, AppError> {
    let outcome = end_interview(
        state.store.as_ref(),
        state.synthesizer.as_ref(),
        session_id,
        user_id,
    )
    .await?;

    Ok(Json(EndInterviewResponse {
        success: true,
        is_complete: true,
        final_message: outcome.final_message,
        audio_url: outcome.audio_url,
    }))
}

/// GET /api/interview/:session_id/report
///
/// Returns the scored report, generating the analysis on first request.
pub async fn handle_get_report(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Report>, AppError> {
    let report = get_report(state.store.as_ref(), state.llm.as_ref(), session_id, user_id).await?;
    Ok(Json(report))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
