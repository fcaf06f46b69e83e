use serde::Deserialize;
use time::OffsetDateTime;
use validator::Validate;

/// POST /progress
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProgress {
    #[validate(range(min = 20.0, max = 500.0))]
    pub weight_kg: f64,
    /// Defaults to now.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub recorded_at: Option<OffsetDateTime>,
}
