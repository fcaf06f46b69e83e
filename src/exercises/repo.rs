use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::ExerciseKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exercise {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: ExerciseKind,
    #[serde(with = "time::serde::rfc3339")]
    pub logged_at: OffsetDateTime,
}

/// One row per exercise; columns not used by the row's kind are NULL.
#[derive(Debug, FromRow)]
struct ExerciseRow {
    id: Uuid,
    kind: String,
    description: Option<String>,
    intensity: Option<String>,
    duration_min: Option<i32>,
    distance_km: Option<f64>,
    pace: Option<f64>,
    sets: Option<i32>,
    reps: Option<i32>,
    weight_kg: Option<f64>,
    logged_at: OffsetDateTime,
}

impl TryFrom<ExerciseRow> for Exercise {
    type Error = anyhow::Error;

    fn try_from(r: ExerciseRow) -> anyhow::Result<Self> {
        let kind = match (r.kind.as_str(), r.description, r.duration_min, r.distance_km, r.sets, r.reps, r.weight_kg) {
            ("custom", description, duration_min, ..) => ExerciseKind::Custom {
                description,
                intensity: r.intensity,
                duration_min,
            },
            ("run", _, Some(duration_min), Some(distance_km), ..) => ExerciseKind::Run {
                distance_km,
                duration_min,
                pace: r.pace,
            },
            ("weightlifting", _, _, _, Some(sets), Some(reps), Some(weight_kg)) => {
                ExerciseKind::Weightlifting {
                    sets,
                    reps,
                    weight_kg,
                    intensity: r.intensity,
                }
            }
            (kind, ..) => bail!("exercise {} has incomplete columns for kind {:?}", r.id, kind),
        };
        Ok(Exercise {
            id: r.id,
            kind,
            logged_at: r.logged_at,
        })
    }
}

const COLUMNS: &str =
    "id, kind, description, intensity, duration_min, distance_km, pace, sets, reps, weight_kg, logged_at";

#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    async fn create_exercise(
        &self,
        user_id: Uuid,
        kind: &ExerciseKind,
        logged_at: OffsetDateTime,
    ) -> anyhow::Result<Exercise>;

    /// Newest first.
    async fn list_exercises(&self, user_id: Uuid) -> anyhow::Result<Vec<Exercise>>;
}

#[derive(Clone)]
pub struct PgExerciseRepository {
    db: PgPool,
}

impl PgExerciseRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ExerciseRepository for PgExerciseRepository {
    async fn create_exercise(
        &self,
        user_id: Uuid,
        kind: &ExerciseKind,
        logged_at: OffsetDateTime,
    ) -> anyhow::Result<Exercise> {
        let (mut description, mut intensity, mut duration_min) = (None, None, None);
        let (mut distance_km, mut pace) = (None, None);
        let (mut sets, mut reps, mut weight_kg) = (None, None, None);
        match kind {
            ExerciseKind::Custom { description: d, intensity: i, duration_min: m } => {
                description = d.clone();
                intensity = i.clone();
                duration_min = *m;
            }
            ExerciseKind::Run { distance_km: d, duration_min: m, pace: p } => {
                distance_km = Some(*d);
                duration_min = Some(*m);
                pace = *p;
            }
            ExerciseKind::Weightlifting { sets: s, reps: r, weight_kg: w, intensity: i } => {
                sets = Some(*s);
                reps = Some(*r);
                weight_kg = Some(*w);
                intensity = i.clone();
            }
        }

        let row = sqlx::query_as::<_, ExerciseRow>(&format!(
            r#"
            INSERT INTO exercises (id, user_id, kind, description, intensity, duration_min,
                                   distance_km, pace, sets, reps, weight_kg, logged_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind.type_name())
        .bind(description)
        .bind(intensity)
        .bind(duration_min)
        .bind(distance_km)
        .bind(pace)
        .bind(sets)
        .bind(reps)
        .bind(weight_kg)
        .bind(logged_at)
        .fetch_one(&self.db)
        .await
        .context("insert exercise")?;
        row.try_into()
    }

    async fn list_exercises(&self, user_id: Uuid) -> anyhow::Result<Vec<Exercise>> {
        let rows = sqlx::query_as::<_, ExerciseRow>(&format!(
            "SELECT {COLUMNS} FROM exercises WHERE user_id = $1 ORDER BY logged_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list exercises")?;
        rows.into_iter().map(Exercise::try_from).collect()
    }
}
