use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::orchestrator::Alternative;
use crate::plan::dto::DayPlan;

pub const WATER_FIELD: &str = "aguaConsumida";
pub const DEFAULT_WATER_GOAL: f64 = 2500.0;
/// Largest amount accepted in a single water entry, in ml.
pub const MAX_WATER_ENTRY: i64 = 4000;

/// Typed view of `users/{uid}/dailyData/{date}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DailyDocument {
    #[serde(rename = "planos.1", default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<DayPlan>,
    #[serde(rename = "planos.2", default, skip_serializing_if = "Option::is_none")]
    pub substitute: Option<DayPlan>,
    #[serde(rename = "aguaConsumida", default, deserialize_with = "null_as_zero")]
    pub water_ml: f64,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl DailyDocument {
    pub fn plan(&self, alt: Alternative) -> Option<&DayPlan> {
        match alt {
            Alternative::Primary => self.primary.as_ref(),
            Alternative::Substitute => self.substitute.as_ref(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddWaterRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct WaterResponse {
    #[serde(rename = "aguaConsumida")]
    pub water_ml: i64,
}

#[derive(Debug, Deserialize)]
pub struct CompleteMealRequest {
    pub alternative: Alternative,
}

/// A meal as shown for the day, with every stored field, tagged with the alternative it came from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActiveMeal {
    #[serde(flatten)]
    pub meal: Map<String, Value>,
    pub source: Alternative,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ConsumedTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailySummary {
    pub date: String,
    pub has_primary_plan: bool,
    /// The primary plan's `resumo`, as stored.
    pub targets: Option<Value>,
    pub meals: Vec<ActiveMeal>,
    pub consumed: ConsumedTotals,
    pub water_goal: f64,
    pub water_consumed: f64,
    pub water_progress: f64,
}
