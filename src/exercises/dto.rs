use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    Custom,
    Run,
    Weightlifting,
}

/// An exercise with exactly the fields its type needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExerciseKind {
    Custom {
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        intensity: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_min: Option<i32>,
    },
    Run {
        distance_km: f64,
        duration_min: i32,
        /// Minutes per km.
        #[serde(skip_serializing_if = "Option::is_none")]
        pace: Option<f64>,
    },
    Weightlifting {
        sets: i32,
        reps: i32,
        weight_kg: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        intensity: Option<String>,
    },
}

impl ExerciseKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ExerciseKind::Custom { .. } => "custom",
            ExerciseKind::Run { .. } => "run",
            ExerciseKind::Weightlifting { .. } => "weightlifting",
        }
    }
}

/// POST /exercises. Flat on the wire; `into_kind` enforces per-type fields.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExercise {
    #[serde(rename = "type")]
    pub kind: ExerciseType,
    #[validate(length(min = 1, max = 500))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub intensity: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub duration_min: Option<i32>,
    #[validate(range(min = 0.01, max = 1000.0))]
    pub distance_km: Option<f64>,
    #[validate(range(min = 0.0, max = 120.0))]
    pub pace: Option<f64>,
    #[validate(range(min = 1, max = 100))]
    pub sets: Option<i32>,
    #[validate(range(min = 1, max = 1000))]
    pub reps: Option<i32>,
    #[validate(range(min = 0.1, max = 1000.0))]
    pub weight_kg: Option<f64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub logged_at: Option<OffsetDateTime>,
}

impl CreateExercise {
    pub fn into_kind(self) -> Result<ExerciseKind, ValidationErrors> {
        self.validate()?;

        let mut errs = ValidationErrors::new();
        let kind = match self.kind {
            ExerciseType::Custom => Some(ExerciseKind::Custom {
                description: self.description,
                intensity: self.intensity,
                duration_min: self.duration_min,
            }),
            ExerciseType::Run => match (self.distance_km, self.duration_min) {
                (Some(distance_km), Some(duration_min)) => Some(ExerciseKind::Run {
                    distance_km,
                    duration_min,
                    pace: self.pace,
                }),
                (distance, duration) => {
                    let msg = "distance and duration are required for runs";
                    if distance.is_none() {
                        errs.add("distance_km", required(msg));
                    }
                    if duration.is_none() {
                        errs.add("duration_min", required(msg));
                    }
                    None
                }
            },
            ExerciseType::Weightlifting => match (self.sets, self.reps, self.weight_kg) {
                (Some(sets), Some(reps), Some(weight_kg)) => Some(ExerciseKind::Weightlifting {
                    sets,
                    reps,
                    weight_kg,
                    intensity: self.intensity,
                }),
                (sets, reps, weight) => {
                    let msg = "sets, reps and weight are required for weightlifting";
                    if sets.is_none() {
                        errs.add("sets", required(msg));
                    }
                    if reps.is_none() {
                        errs.add("reps", required(msg));
                    }
                    if weight.is_none() {
                        errs.add("weight_kg", required(msg));
                    }
                    None
                }
            },
        };

        kind.ok_or(errs)
    }
}

fn required(message: &'static str) -> ValidationError {
    let mut err = ValidationError::new("required");
    err.message = Some(message.into());
    err
}
