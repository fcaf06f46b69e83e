use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{DateRange, MealRecord, MealRecordRow, NewMealRecord};

/// Persistence gateway for meal records. Append-only: there is no update or delete.
#[async_trait]
pub trait MealRepository: Send + Sync {
    async fn create_meal_record(&self, new: NewMealRecord) -> anyhow::Result<MealRecord>;

    /// Newest first.
    async fn list_meal_records(
        &self,
        user_id: Uuid,
        range: Option<DateRange>,
    ) -> anyhow::Result<Vec<MealRecord>>;

    async fn get_meal_record(&self, user_id: Uuid, id: Uuid)
        -> anyhow::Result<Option<MealRecord>>;

    /// The record already logged for this photo, if any.
    async fn find_meal_by_photo(
        &self,
        user_id: Uuid,
        photo_digest: &str,
    ) -> anyhow::Result<Option<MealRecord>>;
}

const COLUMNS: &str =
    "id, user_id, image_reference, photo_digest, calories, protein, carbs, fat, logged_at";

#[derive(Clone)]
pub struct PgMealRepository {
    db: PgPool,
}

impl PgMealRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MealRepository for PgMealRepository {
    async fn create_meal_record(&self, new: NewMealRecord) -> anyhow::Result<MealRecord> {
        let row = sqlx::query_as::<_, MealRecordRow>(&format!(
            r#"
            INSERT INTO meal_records
                (id, user_id, image_reference, photo_digest, calories, protein, carbs, fat, logged_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(new.id)
        .bind(new.user_id)
        .bind(&new.image_reference)
        .bind(&new.photo_digest)
        .bind(new.nutrition.calories as i32)
        .bind(new.nutrition.protein)
        .bind(new.nutrition.carbs)
        .bind(new.nutrition.fat)
        .bind(new.logged_at)
        .fetch_one(&self.db)
        .await
        .context("insert meal record")?;
        Ok(row.into())
    }

    async fn list_meal_records(
        &self,
        user_id: Uuid,
        range: Option<DateRange>,
    ) -> anyhow::Result<Vec<MealRecord>> {
        let rows = sqlx::query_as::<_, MealRecordRow>(&format!(
            r#"
            SELECT {COLUMNS}
              FROM meal_records
             WHERE user_id = $1
               AND ($2::timestamptz IS NULL OR logged_at >= $2)
               AND ($3::timestamptz IS NULL OR logged_at < $3)
             ORDER BY logged_at DESC
            "#
        ))
        .bind(user_id)
        .bind(range.map(|r| r.from))
        .bind(range.map(|r| r.to))
        .fetch_all(&self.db)
        .await
        .context("list meal records")?;
        Ok(rows.into_iter().map(MealRecord::from).collect())
    }

    async fn get_meal_record(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> anyhow::Result<Option<MealRecord>> {
        let row = sqlx::query_as::<_, MealRecordRow>(&format!(
            "SELECT {COLUMNS} FROM meal_records WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("get meal record")?;
        Ok(row.map(MealRecord::from))
    }

    async fn find_meal_by_photo(
        &self,
        user_id: Uuid,
        photo_digest: &str,
    ) -> anyhow::Result<Option<MealRecord>> {
        let row = sqlx::query_as::<_, MealRecordRow>(&format!(
            "SELECT {COLUMNS} FROM meal_records WHERE user_id = $1 AND photo_digest = $2"
        ))
        .bind(user_id)
        .bind(photo_digest)
        .fetch_optional(&self.db)
        .await
        .context("find meal by photo")?;
        Ok(row.map(MealRecord::from))
    }
}
