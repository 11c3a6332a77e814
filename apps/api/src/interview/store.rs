//! Session persistence — one row per interview in `interview_sessions`,
//! conversation and analysis stored as JSONB.
//!
//! Every mutation goes through `save`, which writes the whole session in a
//! single upsert. There are no partial-field updates, so a failed request
//! can never leave a half-written session behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::session::{Analysis, InterviewSession, Turn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Storage boundary for interview sessions. Carried in `AppState` as
/// `Arc<dyn SessionStore>` so session logic never sees a concrete pool.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<InterviewSession>, StoreError>;

    /// Persists the whole session atomically and returns the `updated_at`
    /// that was written.
    async fn save(&self, session: &InterviewSession) -> Result<DateTime<Utc>, StoreError>;
}

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Row mapping
// ────────────────────────────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    owner_id: Uuid,
    resume_summary: String,
    bio: String,
    conversation: Json<Vec<Turn>>,
    analysis: Option<Json<Analysis>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SessionRow> for InterviewSession {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            resume_summary: row.resume_summary,
            bio: row.bio,
            conversation: row.conversation.0,
            analysis: row.analysis.map(|json| json.0),
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<InterviewSession>, StoreError> {
        let row =
            sqlx::query_as::<_, SessionRow>("SELECT * FROM interview_sessions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(InterviewSession::from))
    }

    async fn save(&self, session: &InterviewSession) -> Result<DateTime<Utc>, StoreError> {
        let updated_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO interview_sessions
                (id, owner_id, resume_summary, bio, conversation, analysis,
                 completed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                conversation = EXCLUDED.conversation,
                analysis     = EXCLUDED.analysis,
                completed_at = EXCLUDED.completed_at,
                updated_at   = EXCLUDED.updated_at
            "#,
        )
        .bind(session.id)
        .bind(session.owner_id)
        .bind(&session.resume_summary)
        .bind(&session.bio)
        .bind(Json(&session.conversation))
        .bind(session.analysis.as_ref().map(Json))
        .bind(session.completed_at)
        .bind(session.created_at)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(updated_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::session::{Role, Scores};

    fn sample_row() -> SessionRow {
        SessionRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            resume_summary: "Backend engineer, 5 years of Rust.".to_string(),
            bio: "I like distributed systems.".to_string(),
            conversation: Json(vec![
                Turn::interviewer("What drew you to Rust?"),
                Turn::candidate("Memory safety without garbage collection."),
            ]),
            analysis: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_maps_to_session() {
        let row = sample_row();
        let id = row.id;

        let session = InterviewSession::from(row);

        assert_eq!(session.id, id);
        assert_eq!(session.conversation.len(), 2);
        assert_eq!(session.conversation[0].role, Role::Interviewer);
        assert!(session.analysis.is_none());
        assert!(!session.is_completed());
    }

    #[test]
    fn test_row_maps_analysis_when_present() {
        let mut row = sample_row();
        row.analysis = Some(Json(Analysis {
            summary: "Solid throughout.".to_string(),
            scores: Scores {
                technical: 8.0,
                communication: 7.0,
                confidence: 7.5,
            },
            strengths: vec!["Concrete examples".to_string()],
            weaknesses: vec!["Short answers".to_string()],
        }));
        row.completed_at = Some(Utc::now());

        let session = InterviewSession::from(row);

        assert!(session.is_completed());
        let analysis = session.analysis.unwrap();
        assert_eq!(analysis.scores.technical, 8.0);
        assert_eq!(analysis.strengths.len(), 1);
    }
}
