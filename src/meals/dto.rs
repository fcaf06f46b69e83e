use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::meals::repo_types::MealRecord;
use crate::nutrition::{NutritionEstimate, NutritionFacts};

#[derive(Debug, Serialize)]
pub struct MealResponse {
    pub id: Uuid,
    pub image_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub nutrition: NutritionFacts,
    #[serde(with = "time::serde::rfc3339")]
    pub logged_at: OffsetDateTime,
}

impl MealResponse {
    pub fn new(record: MealRecord, photo_url: Option<String>) -> Self {
        Self {
            id: record.id,
            image_reference: record.image_reference,
            photo_url,
            nutrition: record.nutrition,
            logged_at: record.logged_at,
        }
    }
}

/// Nutrition the client already knows, typically from a barcode scan.
#[derive(Debug, Clone, Deserialize)]
pub struct KnownNutrition {
    #[serde(default)]
    pub name: Option<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl From<&KnownNutrition> for NutritionEstimate {
    fn from(k: &KnownNutrition) -> Self {
        Self {
            calories: k.calories,
            protein: k.protein,
            carbs: k.carbs,
            fat: k.fat,
        }
    }
}

/// POST /meals/base64
#[derive(Debug, Deserialize)]
pub struct CreateMealBase64 {
    /// Raw base64 or a `data:image/...;base64,` URL.
    pub image_base64: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub known_nutrition: Option<KnownNutrition>,
}

/// Either both `from` and `to` (RFC 3339), or a single UTC `date` (YYYY-MM-DD).
#[derive(Debug, Default, Deserialize)]
pub struct ListMealsQuery {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub from: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub to: Option<OffsetDateTime>,
    #[serde(default)]
    pub date: Option<String>,
}
