use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::NutritionFacts;

#[derive(Debug, FromRow)]
pub struct MealRecordRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_reference: String,
    pub photo_digest: String,
    pub calories: i32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub logged_at: OffsetDateTime,
}

/// A logged meal. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_reference: String,
    /// SHA-256 of the photo bytes; one record per photo and user.
    pub photo_digest: String,
    pub nutrition: NutritionFacts,
    #[serde(with = "time::serde::rfc3339")]
    pub logged_at: OffsetDateTime,
}

impl From<MealRecordRow> for MealRecord {
    fn from(r: MealRecordRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            image_reference: r.image_reference,
            photo_digest: r.photo_digest,
            nutrition: NutritionFacts {
                // column has CHECK (calories BETWEEN 0 AND 5000)
                calories: r.calories.max(0) as u32,
                protein: r.protein,
                carbs: r.carbs,
                fat: r.fat,
            },
            logged_at: r.logged_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMealRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_reference: String,
    pub photo_digest: String,
    pub nutrition: NutritionFacts,
    pub logged_at: OffsetDateTime,
}

impl NewMealRecord {
    pub fn into_record(self) -> MealRecord {
        MealRecord {
            id: self.id,
            user_id: self.user_id,
            image_reference: self.image_reference,
            photo_digest: self.photo_digest,
            nutrition: self.nutrition,
            logged_at: self.logged_at,
        }
    }
}

/// Half-open `[from, to)` window over `logged_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: OffsetDateTime,
    pub to: OffsetDateTime,
}

impl DateRange {
    pub fn contains(&self, at: OffsetDateTime) -> bool {
        self.from <= at && at < self.to
    }
}
