use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    nutrition::lookup::{is_valid_barcode, ProductInfo},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/products/:barcode", get(get_product))
}

/// Per-100 g nutrition for a scanned barcode, so the client can prefill a meal.
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(barcode): Path<String>,
) -> AppResult<Json<ProductInfo>> {
    if !is_valid_barcode(&barcode) {
        return Err(AppError::BadRequest("barcode must be 8-14 digits".into()));
    }
    state
        .products
        .lookup(&barcode)
        .await
        .map_err(AppError::Upstream)?
        .map(Json)
        .ok_or(AppError::NotFound("Product"))
}
