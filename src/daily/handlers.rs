use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;

use super::dto::{AddWaterRequest, CompleteMealRequest, DailyDocument, DailySummary, WaterResponse};
use super::services;
use crate::{
    auth::AuthUser,
    error::ApiError,
    orchestrator::calendar::{date_key, parse_date_key},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct DailyResponse {
    pub document: DailyDocument,
    pub summary: DailySummary,
}

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/daily/:date", get(get_daily))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/daily/:date/water", post(add_water))
        .route("/daily/:date/meals/:meal_id/complete", post(complete_meal))
}

/// Normalizes the path date to the `YYYY-MM-DD` document key.
fn checked_key(raw: &str) -> Result<String, ApiError> {
    parse_date_key(raw)
        .map(date_key)
        .ok_or_else(|| ApiError::bad_request(format!("invalid date '{}', expected YYYY-MM-DD", raw)))
}

#[instrument(skip(state))]
pub async fn get_daily(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(date): Path<String>,
) -> Result<Json<DailyResponse>, ApiError> {
    let key = checked_key(&date)?;
    let document = services::load(state.store.as_ref(), user_id, &key).await?;
    let summary = services::summarize(&key, &document);
    Ok(Json(DailyResponse { document, summary }))
}

#[instrument(skip(state, body))]
pub async fn add_water(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(date): Path<String>,
    body: Result<Json<AddWaterRequest>, JsonRejection>,
) -> Result<Json<WaterResponse>, ApiError> {
    let Json(body) = body?;
    let key = checked_key(&date)?;
    let total = services::add_water(state.store.as_ref(), user_id, &key, body.amount).await?;
    Ok(Json(WaterResponse { water_ml: total }))
}

#[instrument(skip(state, body))]
pub async fn complete_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((date, meal_id)): Path<(String, String)>,
    body: Result<Json<CompleteMealRequest>, JsonRejection>,
) -> Result<Json<DailyResponse>, ApiError> {
    let Json(body) = body?;
    let key = checked_key(&date)?;
    let document =
        services::complete_meal(state.store.as_ref(), user_id, &key, body.alternative, &meal_id)
            .await?;
    let summary = services::summarize(&key, &document);
    Ok(Json(DailyResponse { document, summary }))
}
