use std::collections::HashMap;

use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    ActiveMeal, ConsumedTotals, DailyDocument, DailySummary, DEFAULT_WATER_GOAL, MAX_WATER_ENTRY,
    WATER_FIELD,
};
use crate::error::ApiError;
use crate::orchestrator::Alternative;
use crate::plan::dto::{is_completed, meal_text, number_field, DayPlan};
use crate::store::{DocumentPath, DocumentStore};

#[derive(Debug, Error)]
pub enum DailyError {
    #[error("insira a quantidade ingerida de água.")]
    InvalidWaterAmount,

    #[error("Plano {0} não encontrado para atualizar.")]
    PlanNotFound(Alternative),

    #[error("Refeição {0} não encontrada.")]
    MealNotFound(String),

    #[error("stored daily document is unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<DailyError> for ApiError {
    fn from(e: DailyError) -> Self {
        match e {
            DailyError::InvalidWaterAmount => ApiError::bad_request(e.to_string()),
            DailyError::PlanNotFound(_) | DailyError::MealNotFound(_) => {
                ApiError::not_found(e.to_string())
            }
            DailyError::Corrupt(_) => ApiError::internal(anyhow::anyhow!(e.to_string())),
            DailyError::Store(inner) => ApiError::internal(inner),
        }
    }
}

pub async fn load(
    store: &dyn DocumentStore,
    user_id: Uuid,
    date_key: &str,
) -> Result<DailyDocument, DailyError> {
    let path = DocumentPath::daily(user_id, date_key);
    match store.get(&path).await? {
        Some(doc) => Ok(serde_json::from_value(Value::Object(doc))?),
        None => Ok(DailyDocument::default()),
    }
}

/// Adds one water entry (clamped to 4000 ml) to the day's total and returns the new total.
#[instrument(skip(store))]
pub async fn add_water(
    store: &dyn DocumentStore,
    user_id: Uuid,
    date_key: &str,
    amount: i64,
) -> Result<i64, DailyError> {
    if amount <= 0 {
        return Err(DailyError::InvalidWaterAmount);
    }
    let amount = amount.min(MAX_WATER_ENTRY);

    let current = load(store, user_id, date_key).await?;
    let total = current.water_ml.round() as i64 + amount;

    let mut fields = Map::new();
    fields.insert(WATER_FIELD.to_string(), json!(total));
    store
        .set_merge(&DocumentPath::daily(user_id, date_key), fields)
        .await?;

    info!(total, "water intake updated");
    Ok(total)
}

fn same_meal(candidate: &Value, id: &str, name: Option<&str>) -> bool {
    meal_text(candidate, "id") == Some(id)
        || (name.is_some() && meal_text(candidate, "nome") == name)
}

/// Sets `completed` on matching meals and leaves every other field alone.
fn with_completion(plan: &DayPlan, id: &str, name: Option<&str>, completed: bool) -> DayPlan {
    let mut plan = plan.clone();
    if let Some(meals) = plan.meals_mut() {
        for meal in meals.iter_mut().filter(|m| same_meal(m, id, name)) {
            if let Some(fields) = meal.as_object_mut() {
                fields.insert("completed".to_string(), Value::Bool(completed));
            }
        }
    }
    plan
}

/// Marks a meal done in `alternative` and clears the matching meal in the other alternative.
#[instrument(skip(store))]
pub async fn complete_meal(
    store: &dyn DocumentStore,
    user_id: Uuid,
    date_key: &str,
    alternative: Alternative,
    meal_id: &str,
) -> Result<DailyDocument, DailyError> {
    let mut doc = load(store, user_id, date_key).await?;

    let target = doc
        .plan(alternative)
        .ok_or(DailyError::PlanNotFound(alternative))?;
    let name = target
        .meals()
        .iter()
        .find(|m| meal_text(m, "id") == Some(meal_id))
        .map(|m| meal_text(m, "nome").map(str::to_string))
        .ok_or_else(|| DailyError::MealNotFound(meal_id.to_string()))?;

    let mut fields = Map::new();
    let updated = with_completion(target, meal_id, name.as_deref(), true);
    fields.insert(alternative.field().to_string(), updated.0.clone());

    let other = alternative.other();
    let other_updated = doc
        .plan(other)
        .map(|p| with_completion(p, meal_id, name.as_deref(), false));
    if let Some(plan) = &other_updated {
        fields.insert(other.field().to_string(), plan.0.clone());
    }

    store
        .set_merge(&DocumentPath::daily(user_id, date_key), fields)
        .await?;

    match alternative {
        Alternative::Primary => {
            doc.primary = Some(updated);
            doc.substitute = other_updated;
        }
        Alternative::Substitute => {
            doc.substitute = Some(updated);
            doc.primary = other_updated;
        }
    }
    info!(%meal_id, %alternative, "meal completed");
    Ok(doc)
}

fn meals_of(plan: Option<&DayPlan>) -> &[Value] {
    plan.map(DayPlan::meals).unwrap_or_default()
}

/// Builds the day view: primary meals, each swapped for a completed substitute of the same name.
pub fn summarize(date_key: &str, doc: &DailyDocument) -> DailySummary {
    let primary_meals = meals_of(doc.primary.as_ref());
    let substitute_meals = meals_of(doc.substitute.as_ref());

    let completed_substitutes: HashMap<&str, &Map<String, Value>> = substitute_meals
        .iter()
        .filter(|m| is_completed(m))
        .filter_map(|m| Some((meal_text(m, "nome")?, m.as_object()?)))
        .collect();

    let meals = primary_meals
        .iter()
        .filter_map(Value::as_object)
        .map(|m| {
            let swapped = m
                .get("nome")
                .and_then(Value::as_str)
                .and_then(|name| completed_substitutes.get(name));
            match swapped {
                Some(sub) => ActiveMeal {
                    meal: (*sub).clone(),
                    source: Alternative::Substitute,
                },
                None => ActiveMeal {
                    meal: m.clone(),
                    source: Alternative::Primary,
                },
            }
        })
        .collect();

    let consumed = primary_meals
        .iter()
        .chain(substitute_meals.iter())
        .filter(|m| is_completed(m))
        .fold(ConsumedTotals::default(), |mut acc, m| {
            acc.calories += number_field(m, "calorias");
            acc.protein += number_field(m, "proteinas");
            acc.carbs += number_field(m, "carboidratos");
            acc.fat += number_field(m, "lipidios");
            acc
        });

    let targets = doc.primary.as_ref().and_then(|p| p.summary().cloned());
    let water_goal = targets
        .as_ref()
        .map(|s| number_field(s, "metaAgua"))
        .filter(|g| *g > 0.0)
        .unwrap_or(DEFAULT_WATER_GOAL);
    let water_progress = ((doc.water_ml / water_goal) * 100.0).min(100.0);

    DailySummary {
        date: date_key.to_string(),
        has_primary_plan: doc.primary.is_some(),
        targets,
        meals,
        consumed,
        water_goal,
        water_consumed: doc.water_ml,
        water_progress,
    }
}
