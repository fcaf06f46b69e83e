use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::{info, instrument};
use validator::Validate;

use super::dto::CreateProgress;
use super::repo::ProgressEntry;
use crate::{auth::AuthUser, error::AppResult, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/progress", get(list_progress).post(create_progress))
}

#[instrument(skip(state, body))]
pub async fn create_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateProgress>,
) -> AppResult<(StatusCode, Json<ProgressEntry>)> {
    body.validate()?;
    let recorded_at = body.recorded_at.unwrap_or_else(OffsetDateTime::now_utc);
    let entry = state
        .progress
        .create_progress_entry(user_id, body.weight_kg, recorded_at)
        .await?;
    info!(entry_id = %entry.id, weight_kg = entry.weight_kg, "weight recorded");
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn list_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<ProgressEntry>>> {
    Ok(Json(state.progress.list_progress_entries(user_id).await?))
}

#[cfg(test)]
mod tests {
    use crate::testing::{send_as, Fakes};
    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn records_weight_and_lists_newest_first() {
        let fakes = Fakes::default();
        let me = Uuid::new_v4();
        for (weight, at) in [(82.5, "2024-03-01T07:00:00Z"), (81.9, "2024-03-08T07:00:00Z")] {
            let (status, body) = send_as(
                &fakes,
                me,
                "POST",
                "/api/v1/progress",
                Some(json!({ "weight_kg": weight, "recorded_at": at })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["weight_kg"], weight);
            assert!(body.get("user_id").is_none());
        }
        send_as(&fakes, Uuid::new_v4(), "POST", "/api/v1/progress", Some(json!({ "weight_kg": 60 })))
            .await;

        let (status, body) = send_as(&fakes, me, "GET", "/api/v1/progress", None).await;
        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["recorded_at"], "2024-03-08T07:00:00Z");
        assert_eq!(entries[1]["weight_kg"], 82.5);
    }

    #[tokio::test]
    async fn out_of_range_weight_is_rejected() {
        let fakes = Fakes::default();
        let (status, body) = send_as(
            &fakes,
            Uuid::new_v4(),
            "POST",
            "/api/v1/progress",
            Some(json!({ "weight_kg": 700 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(fakes.progress.len(), 0);
    }
}
