use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Bootstraps the session table. The whole session lives in one row:
/// `conversation` and `analysis` are JSONB documents, mirroring the
/// one-document-per-session write model.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS interview_sessions (
            id UUID PRIMARY KEY,
            owner_id UUID NOT NULL,
            resume_summary TEXT NOT NULL,
            bio TEXT NOT NULL,
            conversation JSONB NOT NULL,
            analysis JSONB,
            completed_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Schema ensured: interview_sessions");
    Ok(())
}
