use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ProgressEntry {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub weight_kg: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn create_progress_entry(
        &self,
        user_id: Uuid,
        weight_kg: f64,
        recorded_at: OffsetDateTime,
    ) -> anyhow::Result<ProgressEntry>;

    /// Newest first.
    async fn list_progress_entries(&self, user_id: Uuid) -> anyhow::Result<Vec<ProgressEntry>>;
}

#[derive(Clone)]
pub struct PgProgressRepository {
    db: PgPool,
}

impl PgProgressRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProgressRepository for PgProgressRepository {
    async fn create_progress_entry(
        &self,
        user_id: Uuid,
        weight_kg: f64,
        recorded_at: OffsetDateTime,
    ) -> anyhow::Result<ProgressEntry> {
        let entry = sqlx::query_as::<_, ProgressEntry>(
            r#"
            INSERT INTO progress_entries (id, user_id, weight_kg, recorded_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, weight_kg, recorded_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(weight_kg)
        .bind(recorded_at)
        .fetch_one(&self.db)
        .await
        .context("insert progress entry")?;
        Ok(entry)
    }

    async fn list_progress_entries(&self, user_id: Uuid) -> anyhow::Result<Vec<ProgressEntry>> {
        let rows = sqlx::query_as::<_, ProgressEntry>(
            r#"
            SELECT id, user_id, weight_kg, recorded_at
              FROM progress_entries
             WHERE user_id = $1
             ORDER BY recorded_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list progress entries")?;
        Ok(rows)
    }
}
