use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::dto::CreateExercise;
use super::repo::Exercise;
use crate::{auth::AuthUser, error::AppResult, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/exercises", get(list_exercises).post(create_exercise))
}

#[instrument(skip(state, body))]
pub async fn create_exercise(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateExercise>,
) -> AppResult<(StatusCode, Json<Exercise>)> {
    let logged_at = body.logged_at.unwrap_or_else(OffsetDateTime::now_utc);
    let kind = body.into_kind()?;
    let exercise = state.exercises.create_exercise(user_id, &kind, logged_at).await?;
    info!(exercise_id = %exercise.id, kind = kind.type_name(), "exercise logged");
    Ok((StatusCode::CREATED, Json(exercise)))
}

#[instrument(skip(state))]
pub async fn list_exercises(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<Exercise>>> {
    Ok(Json(state.exercises.list_exercises(user_id).await?))
}
