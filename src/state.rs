use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::exercises::repo::{ExerciseRepository, PgExerciseRepository};
use crate::meals::repo::{MealRepository, PgMealRepository};
use crate::nutrition::lookup::{OpenFoodFacts, ProductLookup};
use crate::nutrition::vision::{OpenAiVision, VisionAnalyzer};
use crate::nutrition::NutritionResolver;
use crate::progress::repo::{PgProgressRepository, ProgressRepository};
use crate::storage::{S3Storage, StorageClient};

/// Everything a request handler may touch. Built once in `main` and cloned
/// into each request; there is no global instance.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub meals: Arc<dyn MealRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub exercises: Arc<dyn ExerciseRepository>,
    pub products: Arc<dyn ProductLookup>,
    pub resolver: NutritionResolver,
}

/// The external collaborators behind an `AppState`.
pub struct Backends {
    pub storage: Arc<dyn StorageClient>,
    pub meals: Arc<dyn MealRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub exercises: Arc<dyn ExerciseRepository>,
    pub products: Arc<dyn ProductLookup>,
    pub vision: Arc<dyn VisionAnalyzer>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let storage = S3Storage::new(&config.storage)
            .await
            .context("init photo storage")?;
        let vision = OpenAiVision::from_config(&config.vision).context("init vision client")?;
        let products =
            OpenFoodFacts::from_config(&config.food_db).context("init food database client")?;

        let backends = Backends {
            storage: Arc::new(storage),
            meals: Arc::new(PgMealRepository::new(db.clone())),
            progress: Arc::new(PgProgressRepository::new(db.clone())),
            exercises: Arc::new(PgExerciseRepository::new(db.clone())),
            products: Arc::new(products),
            vision: Arc::new(vision),
        };
        Ok(Self::from_parts(db, config, backends))
    }

    pub fn from_parts(db: PgPool, config: Arc<AppConfig>, backends: Backends) -> Self {
        Self {
            db,
            config,
            storage: backends.storage,
            meals: backends.meals,
            progress: backends.progress,
            exercises: backends.exercises,
            products: backends.products,
            resolver: NutritionResolver::new(backends.vision),
        }
    }
}
