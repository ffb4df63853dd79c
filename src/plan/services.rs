use serde_json::Value;
use tracing::{debug, error, instrument};

use super::dto::{DayPlanRequest, PlanEnvelope};
use super::model::TextModel;
use super::prompt::build_day_prompt;
use crate::error::PlanError;

/// Removes the markdown fences models tend to wrap JSON in, then trims.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json\n", "")
        .replace("\n```", "")
        .trim()
        .to_string()
}

pub fn parse_model_json(text: &str) -> Result<Value, PlanError> {
    if text.trim().is_empty() {
        return Err(PlanError::EmptyResponse);
    }
    let cleaned = strip_code_fences(text);
    serde_json::from_str(&cleaned).map_err(|e| PlanError::MalformedJson(e.to_string()))
}

/// Generates one day/alternative plan. The parsed JSON is passed through unchecked.
#[instrument(skip(model, req), fields(day = %req.day_name, alternative = req.alternative_index, model = model.model_name()))]
pub async fn generate_day_plan(
    model: &dyn TextModel,
    req: &DayPlanRequest,
) -> Result<PlanEnvelope<Value>, PlanError> {
    let prompt = build_day_prompt(req);
    let result = async {
        let text = model.generate_text(&prompt).await?;
        debug!(chars = text.len(), "model replied");
        parse_model_json(&text)
    }
    .await;

    match result {
        Ok(data) => Ok(PlanEnvelope { data }),
        Err(e) => {
            error!(error = %e, day = %req.day_name, alternative = req.alternative_index, "day plan generation failed");
            Err(e)
        }
    }
}
