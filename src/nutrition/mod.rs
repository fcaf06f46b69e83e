pub mod facts;
pub mod lookup;
pub mod resolver;
pub mod vision;

pub use facts::{NutritionEstimate, NutritionFacts};
pub use resolver::{CaptureNutrition, MealCapture, NutritionResolver, Resolution, ResolutionError};
