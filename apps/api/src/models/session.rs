//! Interview session domain model.
//!
//! A session is one complete interview attempt by one candidate: the AI
//! context captured at start (résumé summary + bio), the append-only
//! conversation transcript, and the analysis derived once the interview
//! is over. Sessions are persisted as a single document per id — see
//! `interview::store`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a turn. Stored explicitly with every turn — the closing
/// message means both roles can repeat, so role is never derived from
/// index parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Interviewer,
    Candidate,
}

/// One utterance in the conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub message: String,
}

impl Turn {
    pub fn interviewer(message: impl Into<String>) -> Self {
        Self {
            role: Role::Interviewer,
            message: message.into(),
        }
    }

    pub fn candidate(message: impl Into<String>) -> Self {
        Self {
            role: Role::Candidate,
            message: message.into(),
        }
    }
}

/// Per-dimension interview scores, each on a 0–10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub technical: f64,
    pub communication: f64,
    pub confidence: f64,
}

impl Scores {
    /// Clamps every dimension into the contractual [0, 10] range. Applied
    /// after parsing model output — the model occasionally scores off-scale.
    pub fn clamped(self) -> Self {
        Self {
            technical: self.technical.clamp(0.0, 10.0),
            communication: self.communication.clamp(0.0, 10.0),
            confidence: self.confidence.clamp(0.0, 10.0),
        }
    }
}

/// The derived performance record, computed at most once per session and
/// never user-edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub summary: String,
    pub scores: Scores,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

/// One interview session. Created by `start_interview`, mutated only by the
/// session controller, never deleted in-band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Condensed résumé content used as AI context. Immutable after creation.
    pub resume_summary: String,
    /// Immutable after creation.
    pub bio: String,
    /// Chronological transcript. Append-only; always opens with an
    /// interviewer turn.
    pub conversation: Vec<Turn>,
    /// Written at most once, when the report is first requested.
    pub analysis: Option<Analysis>,
    /// Set exactly once, when the interview is explicitly ended.
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Refreshed by the store on every save.
    pub updated_at: DateTime<Utc>,
}

impl InterviewSession {
    /// Creates a fresh session whose conversation opens with the given
    /// interviewer question.
    pub fn new(
        owner_id: Uuid,
        resume_summary: String,
        bio: String,
        first_question: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            resume_summary,
            bio,
            conversation: vec![Turn::interviewer(first_question)],
            analysis: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of interviewer turns so far — the question count the 10-question
    /// cap is enforced against.
    pub fn question_count(&self) -> usize {
        self.conversation
            .iter()
            .filter(|t| t.role == Role::Interviewer)
            .count()
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}
