use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderName, StatusCode},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use bytes::Bytes;
use time::{macros::format_description, Date, Duration};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateMealBase64, KnownNutrition, ListMealsQuery, MealResponse};
use super::repo_types::DateRange;
use super::services::{self, PHOTO_URL_TTL_SECS};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    nutrition::{lookup::is_valid_barcode, CaptureNutrition, MealCapture, ResolutionError},
    state::AppState,
};

const MAX_PHOTO_BYTES: usize = 20 * 1024 * 1024;

/// 201 for a new record, 200 when the photo was already logged.
type Logged = (StatusCode, [(HeaderName, String); 1], Json<MealResponse>);

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals))
        .route("/meals/:id", get(get_meal))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", post(create_meal_multipart)) // fields: image, barcode?
        .route("/meals/base64", post(create_meal_base64))
        .layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES))
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ListMealsQuery>,
) -> AppResult<Json<Vec<MealResponse>>> {
    let range = date_range(&q)?;
    let meals = services::list_meals(&state, user_id, range).await?;
    Ok(Json(meals))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MealResponse>> {
    services::get_meal(&state, user_id, id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Meal"))
}

/// POST /meals (multipart). A missing `image` part is treated as an empty photo.
#[instrument(skip(state, mp))]
pub async fn create_meal_multipart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> AppResult<Logged> {
    let mut image = Bytes::new();
    let mut barcode = None;
    while let Some(field) = mp.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") | Some("file") => image = field.bytes().await.map_err(bad_multipart)?,
            Some("barcode") => barcode = Some(field.text().await.map_err(bad_multipart)?),
            _ => {}
        }
    }

    ensure_photo(&image)?;
    let nutrition = capture_nutrition(&state, barcode, None).await?;
    create(&state, user_id, MealCapture::new(image, nutrition)).await
}

/// POST /meals/base64 { image_base64, barcode?, known_nutrition? }
#[instrument(skip(state, body))]
pub async fn create_meal_base64(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateMealBase64>,
) -> AppResult<Logged> {
    let image = decode_image_base64(&body.image_base64)?;
    ensure_photo(&image)?;
    let nutrition = capture_nutrition(&state, body.barcode, body.known_nutrition).await?;
    create(&state, user_id, MealCapture::new(image, nutrition)).await
}

async fn create(state: &AppState, user_id: Uuid, capture: MealCapture) -> AppResult<Logged> {
    let logged = services::log_meal(state, user_id, capture).await?;
    let status = if logged.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let record = logged.into_record();
    let photo_url = match state
        .storage
        .presign_get(&record.image_reference, PHOTO_URL_TTL_SECS)
        .await
    {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(error = %format!("{e:#}"), meal_id = %record.id, "photo url unavailable");
            None
        }
    };
    let location = format!("/api/v1/meals/{}", record.id);
    Ok((
        status,
        [(header::LOCATION, location)],
        Json(MealResponse::new(record, photo_url)),
    ))
}

/// Rejects an empty photo before any external lookup is made for it.
fn ensure_photo(image: &Bytes) -> AppResult<()> {
    if image.is_empty() {
        return Err(ResolutionError::EmptyImage.into());
    }
    Ok(())
}

/// Client-supplied nutrition wins; otherwise a barcode is looked up, and an
/// unknown product falls back to photo analysis.
async fn capture_nutrition(
    state: &AppState,
    barcode: Option<String>,
    known: Option<KnownNutrition>,
) -> AppResult<CaptureNutrition> {
    let barcode = barcode
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty());

    match (known, barcode) {
        (Some(_), Some(_)) => Err(AppError::BadRequest(
            "send either known_nutrition or barcode, not both".into(),
        )),
        (Some(known), None) => {
            info!(product = ?known.name, "client supplied nutrition");
            Ok(CaptureNutrition::Known((&known).into()))
        }
        (None, Some(code)) => {
            if !is_valid_barcode(&code) {
                return Err(AppError::BadRequest("barcode must be 8-14 digits".into()));
            }
            match state.products.lookup(&code).await.map_err(AppError::Upstream)? {
                Some(product) => {
                    info!(barcode = %code, product = %product.name, "barcode resolved");
                    Ok(CaptureNutrition::Known(product.estimate()))
                }
                None => {
                    info!(barcode = %code, "unknown barcode, analyzing photo instead");
                    Ok(CaptureNutrition::Unknown)
                }
            }
        }
        (None, None) => Ok(CaptureNutrition::Unknown),
    }
}

fn decode_image_base64(input: &str) -> AppResult<Bytes> {
    let input = input.trim();
    let payload = match input.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| AppError::BadRequest("malformed data URL".into()))?,
        None => input,
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map(Bytes::from)
        .map_err(|_| AppError::BadRequest("image_base64 is not valid base64".into()))
}

fn date_range(q: &ListMealsQuery) -> AppResult<Option<DateRange>> {
    match (q.from, q.to, q.date.as_deref()) {
        (None, None, None) => Ok(None),
        (Some(from), Some(to), None) => {
            if from >= to {
                return Err(AppError::BadRequest("from must be before to".into()));
            }
            Ok(Some(DateRange { from, to }))
        }
        (None, None, Some(day)) => {
            let date = Date::parse(day, format_description!("[year]-[month]-[day]"))
                .map_err(|_| AppError::BadRequest("date must be YYYY-MM-DD".into()))?;
            let from = date.midnight().assume_utc();
            Ok(Some(DateRange {
                from,
                to: from + Duration::days(1),
            }))
        }
        _ => Err(AppError::BadRequest(
            "use either from and to together, or date".into(),
        )),
    }
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("invalid multipart body: {}", e))
}
