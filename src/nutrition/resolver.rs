use std::sync::Arc;

use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use super::facts::{NutritionEstimate, NutritionFacts};
use super::vision::VisionAnalyzer;
use crate::images::services::{inspect_photo, PhotoInfo};

/// Where the nutrition numbers for a capture come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureNutrition {
    /// Pre-resolved facts (barcode lookup or manual entry); skips photo analysis.
    Known(NutritionEstimate),
    /// Only the photo is available; the vision analyzer decides.
    Unknown,
}

/// A single meal photo submission. Consumed by one resolution.
#[derive(Debug, Clone)]
pub struct MealCapture {
    pub image: Bytes,
    pub nutrition: CaptureNutrition,
    pub captured_at: OffsetDateTime,
}

impl MealCapture {
    pub fn new(image: Bytes, nutrition: CaptureNutrition) -> Self {
        Self {
            image,
            nutrition,
            captured_at: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("meal photo is empty")]
    EmptyImage,

    #[error("meal photo is not a readable image: {0}")]
    InvalidImage(String),

    #[error("meal photo analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("nutrition value out of range: {field} = {value}")]
    InvalidNutrition { field: &'static str, value: f64 },
}

/// A resolved capture: validated facts plus what the photo header told us.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub facts: NutritionFacts,
    pub photo: PhotoInfo,
}

#[derive(Clone)]
pub struct NutritionResolver {
    vision: Arc<dyn VisionAnalyzer>,
}

impl NutritionResolver {
    pub fn new(vision: Arc<dyn VisionAnalyzer>) -> Self {
        Self { vision }
    }

    /// Known nutrition short-circuits the vision call. At most one analyzer
    /// request per call and never a retry: the model is not deterministic and
    /// each call is billed.
    #[instrument(skip(self, capture), fields(bytes = capture.image.len(), captured_at = %capture.captured_at))]
    pub async fn resolve(&self, capture: &MealCapture) -> Result<Resolution, ResolutionError> {
        if capture.image.is_empty() {
            return Err(ResolutionError::EmptyImage);
        }
        let photo = inspect_photo(&capture.image).map_err(|e| {
            warn!(error = %e, "rejecting unreadable photo");
            ResolutionError::InvalidImage(e.to_string())
        })?;

        let raw = match capture.nutrition {
            CaptureNutrition::Known(known) => {
                info!("using supplied nutrition, skipping photo analysis");
                known
            }
            CaptureNutrition::Unknown => self
                .vision
                .analyze(&capture.image, photo.content_type)
                .await
                .map_err(|e| {
                    warn!(error = %e, "photo analysis failed");
                    ResolutionError::AnalysisFailed(e.to_string())
                })?,
        };

        let facts = NutritionFacts::normalize(raw).map_err(|e| {
            warn!(field = e.field, value = e.value, "nutrition out of range");
            ResolutionError::InvalidNutrition {
                field: e.field,
                value: e.value,
            }
        })?;

        Ok(Resolution { facts, photo })
    }
}
