use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::MealResponse;
use super::repo_types::{DateRange, MealRecord, NewMealRecord};
use crate::images::services::{meal_photo_key, photo_digest, presign_many, upload_meal_photo};
use crate::nutrition::{MealCapture, Resolution, ResolutionError};
use crate::state::AppState;

pub const PHOTO_URL_TTL_SECS: u64 = 10 * 60;

#[derive(Debug, thiserror::Error)]
pub enum LogMealError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Storage or database failure; never retried here.
    #[error("persisting meal failed: {0:#}")]
    PersistenceFailed(anyhow::Error),
}

/// Outcome of a submission. A photo the user already logged returns the
/// earlier record instead of resolving it again.
#[derive(Debug, Clone, PartialEq)]
pub enum LoggedMeal {
    Created(MealRecord),
    Existing(MealRecord),
}

impl LoggedMeal {
    pub fn is_created(&self) -> bool {
        matches!(self, LoggedMeal::Created(_))
    }

    pub fn into_record(self) -> MealRecord {
        match self {
            LoggedMeal::Created(r) | LoggedMeal::Existing(r) => r,
        }
    }
}

/// Resolve the capture, store the photo, then write the record. Either a
/// complete record exists afterwards or nothing does, and at most one record
/// exists per user and photo.
#[instrument(skip(st, capture))]
pub async fn log_meal(
    st: &AppState,
    user_id: Uuid,
    capture: MealCapture,
) -> Result<LoggedMeal, LogMealError> {
    let digest = photo_digest(&capture.image);
    if !capture.image.is_empty() {
        if let Some(existing) = find_logged(st, user_id, &digest).await? {
            info!(meal_id = %existing.id, "photo already logged");
            return Ok(LoggedMeal::Existing(existing));
        }
    }

    let Resolution { facts, photo } = st.resolver.resolve(&capture).await?;
    let logged_at = OffsetDateTime::now_utc();

    let id = Uuid::new_v4();
    let key = meal_photo_key(user_id, &digest, photo.content_type);
    upload_meal_photo(st.storage.as_ref(), &key, capture.image, photo.content_type)
        .await
        .map_err(LogMealError::PersistenceFailed)?;

    let new = NewMealRecord {
        id,
        user_id,
        image_reference: key.clone(),
        photo_digest: digest.clone(),
        nutrition: facts,
        logged_at,
    };
    match st.meals.create_meal_record(new).await {
        Ok(record) => {
            info!(meal_id = %record.id, calories = record.nutrition.calories, "meal logged");
            Ok(LoggedMeal::Created(record))
        }
        Err(e) => {
            // a concurrent submission of the same photo may have won the insert;
            // its record points at the object we just wrote, so keep it
            if let Ok(Some(existing)) = st.meals.find_meal_by_photo(user_id, &digest).await {
                info!(meal_id = %existing.id, "photo logged concurrently");
                return Ok(LoggedMeal::Existing(existing));
            }
            error!(error = %format!("{e:#}"), meal_id = %id, "create meal record failed");
            if let Err(cleanup) = st.storage.delete_object(&key).await {
                warn!(error = %cleanup, key = %key, "orphaned meal photo left in storage");
            }
            Err(LogMealError::PersistenceFailed(e))
        }
    }
}

async fn find_logged(
    st: &AppState,
    user_id: Uuid,
    digest: &str,
) -> Result<Option<MealRecord>, LogMealError> {
    st.meals
        .find_meal_by_photo(user_id, digest)
        .await
        .map_err(LogMealError::PersistenceFailed)
}

/// Records of one user with short-lived photo URLs attached.
#[instrument(skip(st))]
pub async fn list_meals(
    st: &AppState,
    user_id: Uuid,
    range: Option<DateRange>,
) -> anyhow::Result<Vec<MealResponse>> {
    let records = st.meals.list_meal_records(user_id, range).await?;
    let keys: Vec<String> = records.iter().map(|r| r.image_reference.clone()).collect();
    let urls = presign_many(st.storage.as_ref(), &keys, PHOTO_URL_TTL_SECS).await?;
    Ok(records
        .into_iter()
        .zip(urls)
        .map(|(record, url)| MealResponse::new(record, Some(url)))
        .collect())
}

#[instrument(skip(st))]
pub async fn get_meal(
    st: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> anyhow::Result<Option<MealResponse>> {
    let Some(record) = st.meals.get_meal_record(user_id, id).await? else {
        return Ok(None);
    };
    let url = st
        .storage
        .presign_get(&record.image_reference, PHOTO_URL_TTL_SECS)
        .await?;
    Ok(Some(MealResponse::new(record, Some(url))))
}
