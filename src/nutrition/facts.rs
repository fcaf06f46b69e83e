use serde::{Deserialize, Serialize};

pub const MAX_CALORIES: u32 = 5000;
pub const MAX_MACRO_GRAMS: f64 = 500.0;

/// Raw nutrition numbers as reported by an analyzer or a product database,
/// before rounding and bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionEstimate {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Normalized nutrition values: integer kcal, macros in grams at 0.1 g precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("{field} = {value} is outside the allowed range")]
pub struct OutOfBounds {
    pub field: &'static str,
    pub value: f64,
}

impl NutritionFacts {
    /// Rounds then validates. NaN and infinities are rejected by the range check.
    pub fn normalize(raw: NutritionEstimate) -> Result<Self, OutOfBounds> {
        let calories = round_whole(raw.calories);
        if !(0.0..=f64::from(MAX_CALORIES)).contains(&calories) {
            return Err(OutOfBounds {
                field: "calories",
                value: raw.calories,
            });
        }
        Ok(Self {
            calories: calories as u32,
            protein: macro_grams("protein", raw.protein)?,
            carbs: macro_grams("carbs", raw.carbs)?,
            fat: macro_grams("fat", raw.fat)?,
        })
    }
}

fn macro_grams(field: &'static str, value: f64) -> Result<f64, OutOfBounds> {
    let rounded = round_tenth(value);
    if (0.0..=MAX_MACRO_GRAMS).contains(&rounded) {
        Ok(rounded)
    } else {
        Err(OutOfBounds { field, value })
    }
}

// `+ 0.0` turns -0.0 into 0.0 so tiny negative inputs store as plain zero.
fn round_whole(v: f64) -> f64 {
    v.round() + 0.0
}

fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0 + 0.0
}
