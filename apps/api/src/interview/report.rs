//! Report assembly — analysis on demand, cached after the first build.
//!
//! Analysis is computed at most once per session. Any provider or parse
//! failure stores a deterministic fallback instead, so the report endpoint
//! keeps working when the model is down. Favors availability over accuracy.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::prompts::ANALYSIS_PROMPT_TEMPLATE;
use crate::interview::render_transcript;
use crate::interview::session::load_owned_session;
use crate::interview::store::SessionStore;
use crate::llm_client::{strip_code_fences, TextGenerator};
use crate::models::session::{Analysis, InterviewSession, Role, Scores};

/// Spacing of the synthetic per-turn timestamps in report messages. Turns
/// carry no stored timestamp, so the report fabricates a steady cadence from
/// the session start.
const TURN_SPACING_SECS: i64 = 45;

// ────────────────────────────────────────────────────────────────────────────
// Report shape
// ────────────────────────────────────────────────────────────────────────────

/// Which side of the table a report message came from, in client vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Question,
    Answer,
}

/// One transcript line as shown in the report UI.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Full payload of `GET /api/interview/:session_id/report`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub session_id: Uuid,
    pub summary: String,
    pub scores: Scores,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub messages: Vec<ReportMessage>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis
// ────────────────────────────────────────────────────────────────────────────

/// Stored when analysis generation fails. Deterministic, neutral scores, so
/// a broken provider yields a stable report rather than an error page.
fn fallback_analysis() -> Analysis {
    Analysis {
        summary: "Automated analysis was unavailable for this interview. The scores shown \
                  are neutral defaults; the full transcript below still reflects exactly \
                  what was said."
            .to_string(),
        scores: Scores {
            technical: 6.0,
            communication: 6.5,
            confidence: 6.0,
        },
        strengths: vec![
            "Completed the full interview".to_string(),
            "Engaged with every question asked".to_string(),
        ],
        weaknesses: vec![
            "Automated feedback could not be generated for this attempt".to_string(),
            "Retake the interview to receive scored feedback".to_string(),
        ],
    }
}

async fn generate_analysis(
    llm: &dyn TextGenerator,
    session: &InterviewSession,
) -> anyhow::Result<Analysis> {
    let prompt = ANALYSIS_PROMPT_TEMPLATE
        .replace("{resume_summary}", &session.resume_summary)
        .replace("{transcript}", &render_transcript(&session.conversation));

    let raw = llm.generate(&prompt).await?;
    let analysis: Analysis = serde_json::from_str(strip_code_fences(&raw))?;

    Ok(Analysis {
        scores: analysis.scores.clamped(),
        ..analysis
    })
}

/// Returns the session's analysis, computing and storing it on first demand.
///
/// Once an analysis exists it is returned unchanged forever; there is no
/// recomputation path. Failures store `fallback_analysis()` under the same
/// once-only rule.
pub async fn get_or_build_analysis(
    store: &dyn SessionStore,
    llm: &dyn TextGenerator,
    session: &mut InterviewSession,
) -> Result<Analysis, AppError> {
    if let Some(analysis) = &session.analysis {
        return Ok(analysis.clone());
    }

    let analysis = match generate_analysis(llm, session).await {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!(
                "Analysis for session {} failed, storing fallback: {e}",
                session.id
            );
            fallback_analysis()
        }
    };

    session.analysis = Some(analysis.clone());
    store.save(session).await?;

    info!("Stored analysis for session {}", session.id);
    Ok(analysis)
}

// ────────────────────────────────────────────────────────────────────────────
// Assembly
// ────────────────────────────────────────────────────────────────────────────

fn build_messages(session: &InterviewSession) -> Vec<ReportMessage> {
    session
        .conversation
        .iter()
        .enumerate()
        .map(|(i, turn)| ReportMessage {
            kind: match turn.role {
                Role::Interviewer => MessageKind::Question,
                Role::Candidate => MessageKind::Answer,
            },
            text: turn.message.clone(),
            timestamp: session.created_at + Duration::seconds(TURN_SPACING_SECS * (i as i64 + 1)),
        })
        .collect()
}

fn build_report(session: &InterviewSession, analysis: Analysis) -> Report {
    Report {
        session_id: session.id,
        summary: analysis.summary,
        scores: analysis.scores,
        strengths: analysis.strengths,
        weaknesses: analysis.weaknesses,
        messages: build_messages(session),
        created_at: session.created_at,
        completed_at: session.completed_at,
    }
}

/// Loads a session the caller owns and assembles its report, generating the
/// analysis if this is the first request for it.
pub async fn get_report(
    store: &dyn SessionStore,
    llm: &dyn TextGenerator,
    session_id: Uuid,
    caller_id: Uuid,
) -> Result<Report, AppError> {
    let mut session = load_owned_session(store, session_id, caller_id).await?;
    let analysis = get_or_build_analysis(store, llm, &mut session).await?;
    Ok(build_report(&session, analysis))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
