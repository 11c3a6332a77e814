//! Interview session lifecycle — start, answer, end.
//!
//! Flow per answer: load + ownership check → append candidate turn →
//! generate the next question (or wrap up at the limit) → synthesize
//! speech → one save. Each operation persists at most once, after every
//! fallible step has succeeded, so a failed call leaves the stored session
//! exactly as it found it.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::prompts::{NEXT_QUESTION_PROMPT_TEMPLATE, START_PROMPT_TEMPLATE};
use crate::interview::store::SessionStore;
use crate::interview::{render_transcript, QUESTION_LIMIT};
use crate::llm_client::{strip_code_fences, TextGenerator};
use crate::models::session::{InterviewSession, Role, Turn};
use crate::speech::synthesis::SpeechSynthesizer;

/// Spoken by the interviewer when the session wraps up.
pub const CLOSING_MESSAGE: &str =
    "That concludes our interview. Thank you for your time today, and for walking me \
     through your experience. Your feedback report is ready whenever you want it.";

// ────────────────────────────────────────────────────────────────────────────
// Outcomes
// ────────────────────────────────────────────────────────────────────────────

/// Result of starting an interview.
#[derive(Debug)]
pub struct StartOutcome {
    pub session_id: Uuid,
    pub first_question: String,
    pub audio_url: Option<String>,
    pub total_questions: usize,
}

/// Result of submitting an answer.
#[derive(Debug, PartialEq)]
pub enum AnswerOutcome {
    NextQuestion {
        question: String,
        audio_url: Option<String>,
        /// Completed question/answer exchanges so far (1-based).
        question_number: usize,
        total_questions: usize,
    },
    /// The question budget is spent (or the session was already over).
    Complete,
}

/// Result of ending an interview.
#[derive(Debug)]
pub struct EndOutcome {
    pub final_message: String,
    pub audio_url: Option<String>,
}

/// Kickoff response contract: summary bullets plus the opening question.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InterviewOutline {
    resume_summary: Vec<String>,
    first_question: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

/// Loads a session and verifies the caller owns it. Every session-scoped
/// operation goes through this single gate.
pub async fn load_owned_session(
    store: &dyn SessionStore,
    session_id: Uuid,
    caller_id: Uuid,
) -> Result<InterviewSession, AppError> {
    let session = store
        .find_by_id(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview session {session_id} not found")))?;

    if session.owner_id != caller_id {
        return Err(AppError::Forbidden);
    }

    Ok(session)
}

/// Starts an interview: one LLM call summarizes the résumé and produces the
/// opening question, then the session is persisted with that question as its
/// first turn.
pub async fn start_interview(
    store: &dyn SessionStore,
    llm: &dyn TextGenerator,
    synthesizer: &dyn SpeechSynthesizer,
    owner_id: Uuid,
    resume_text: &str,
    bio: &str,
) -> Result<StartOutcome, AppError> {
    if resume_text.trim().is_empty() {
        return Err(AppError::Validation(
            "resume text cannot be empty".to_string(),
        ));
    }
    if bio.trim().is_empty() {
        return Err(AppError::Validation("bio cannot be empty".to_string()));
    }

    let prompt = START_PROMPT_TEMPLATE
        .replace("{resume_text}", resume_text.trim())
        .replace("{bio}", bio.trim());

    let raw = llm
        .generate(&prompt)
        .await
        .map_err(|e| AppError::Generation(format!("Interview kickoff call failed: {e}")))?;

    let outline: InterviewOutline =
        serde_json::from_str(strip_code_fences(&raw)).map_err(|e| {
            AppError::Generation(format!("Kickoff response did not match the schema: {e}"))
        })?;

    let first_question = outline.first_question.trim().to_string();
    if first_question.is_empty() {
        return Err(AppError::Generation(
            "Kickoff produced an empty first question".to_string(),
        ));
    }
    let resume_summary = outline.resume_summary.join(" ");

    let audio_url = synthesizer.synthesize(&first_question).await;

    let session = InterviewSession::new(
        owner_id,
        resume_summary,
        bio.trim().to_string(),
        first_question.clone(),
    );
    store.save(&session).await?;

    info!("Started interview {} for user {}", session.id, owner_id);

    Ok(StartOutcome {
        session_id: session.id,
        first_question,
        audio_url,
        total_questions: QUESTION_LIMIT,
    })
}

/// Records the candidate's answer and produces the next question, or reports
/// completion once all questions have been answered.
pub async fn submit_answer(
    store: &dyn SessionStore,
    llm: &dyn TextGenerator,
    synthesizer: &dyn SpeechSynthesizer,
    session_id: Uuid,
    caller_id: Uuid,
    answer: &str,
) -> Result<AnswerOutcome, AppError> {
    if answer.trim().is_empty() {
        return Err(AppError::Validation("answer cannot be empty".to_string()));
    }

    let mut session = load_owned_session(store, session_id, caller_id).await?;

    // A finished interview accepts no further answers; report the terminal
    // state instead of failing, so a laggy client converges. A stored
    // analysis is equally terminal: analysis is never recomputed, so the
    // scored transcript must not grow underneath it.
    if session.is_completed() || session.analysis.is_some() {
        return Ok(AnswerOutcome::Complete);
    }

    session.conversation.push(Turn::candidate(answer.trim()));

    // Every question asked so far now has an answer.
    let answered = session.question_count();

    if answered >= QUESTION_LIMIT {
        store.save(&session).await?;
        info!("Interview {} answered all {} questions", session.id, answered);
        return Ok(AnswerOutcome::Complete);
    }

    let prompt = NEXT_QUESTION_PROMPT_TEMPLATE
        .replace("{resume_summary}", &session.resume_summary)
        .replace("{bio}", &session.bio)
        .replace("{transcript}", &render_transcript(&session.conversation))
        .replace("{next_number}", &(answered + 1).to_string())
        .replace("{total}", &QUESTION_LIMIT.to_string());

    let raw = llm
        .generate(&prompt)
        .await
        .map_err(|e| AppError::Generation(format!("Follow-up question call failed: {e}")))?;

    // Follow-up questions are a plain-text contract, unlike the structured
    // kickoff. Strip fences anyway; the model sometimes wraps regardless.
    let question = strip_code_fences(&raw).trim().to_string();
    if question.is_empty() {
        return Err(AppError::Generation(
            "Follow-up call produced an empty question".to_string(),
        ));
    }

    let audio_url = synthesizer.synthesize(&question).await;

    session.conversation.push(Turn::interviewer(question.clone()));
    store.save(&session).await?;

    Ok(AnswerOutcome::NextQuestion {
        question,
        audio_url,
        question_number: answered,
        total_questions: QUESTION_LIMIT,
    })
}

/// Ends an interview: appends the closing message as a final interviewer
/// turn and stamps `completed_at`. Ending an already-ended session replays
/// the wrap-up instead of stacking closing turns.
pub async fn end_interview(
    store: &dyn SessionStore,
    synthesizer: &dyn SpeechSynthesizer,
    session_id: Uuid,
    caller_id: Uuid,
) -> Result<EndOutcome, AppError> {
    let mut session = load_owned_session(store, session_id, caller_id).await?;

    if session.is_completed() {
        let final_message = session
            .conversation
            .iter()
            .rev()
            .find(|turn| turn.role == Role::Interviewer)
            .map(|turn| turn.message.clone())
            .unwrap_or_else(|| CLOSING_MESSAGE.to_string());

        return Ok(EndOutcome {
            final_message,
            audio_url: None,
        });
    }

    let audio_url = synthesizer.synthesize(CLOSING_MESSAGE).await;

    session.conversation.push(Turn::interviewer(CLOSING_MESSAGE));
    session.completed_at = Some(Utc::now());
    store.save(&session).await?;

    info!("Ended interview {}", session.id);

    Ok(EndOutcome {
        final_message: CLOSING_MESSAGE.to_string(),
        audio_url,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
