use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use tracing::{field, info, instrument, Span};

use super::dto::{DayPlanRequest, PlanEnvelope};
use super::services::generate_day_plan;
use crate::{error::ApiError, state::AppState};

pub fn plan_routes() -> Router<AppState> {
    Router::new().route("/gerar-plano-dia", post(generate_single_day))
}

#[instrument(skip(state, payload), fields(day = field::Empty, alternative = field::Empty))]
pub async fn generate_single_day(
    State(state): State<AppState>,
    payload: Result<Json<DayPlanRequest>, JsonRejection>,
) -> Result<Json<PlanEnvelope<Value>>, ApiError> {
    let Json(payload) = payload?;
    Span::current()
        .record("day", payload.day_name.as_str())
        .record("alternative", payload.alternative_index);

    let plan = generate_day_plan(state.model.as_ref(), &payload).await?;
    info!("day plan generated");
    Ok(Json(plan))
}
