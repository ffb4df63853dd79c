use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Answers are free-form; numbers and booleans are kept as their JSON text, null as empty.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Onboarding answers as collected by the questionnaire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub age: String,
    #[serde(deserialize_with = "lenient_text")]
    pub gender: String,
    #[serde(deserialize_with = "lenient_text")]
    pub height: String,
    #[serde(deserialize_with = "lenient_text")]
    pub weight: String,
    #[serde(deserialize_with = "lenient_text")]
    pub objective: String,
    #[serde(rename = "metaPeso", deserialize_with = "lenient_text")]
    pub goal_weight: String,
    #[serde(deserialize_with = "lenient_text")]
    pub level: String,
    #[serde(rename = "modeloDieta", deserialize_with = "lenient_text")]
    pub diet_model: String,
    #[serde(rename = "orcamento", deserialize_with = "lenient_text")]
    pub budget: String,
    #[serde(rename = "medicamentos", deserialize_with = "lenient_text")]
    pub medications: String,
    #[serde(rename = "condicaoMedica", deserialize_with = "lenient_text")]
    pub medical_conditions: String,
    #[serde(rename = "estiloDieta", deserialize_with = "lenient_text")]
    pub diet_style: String,
    #[serde(rename = "restricoes", deserialize_with = "lenient_text")]
    pub restrictions: String,
}

/// Body of `POST /gerar-plano-dia`: the flattened profile plus the day/alternative to generate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayPlanRequest {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(rename = "diaDaSemana")]
    pub day_name: String,
    #[serde(rename = "indiceAlternativa")]
    pub alternative_index: u8,
}

/// One generated day, kept exactly as the model wrote it.
///
/// Only `resumo` is ever looked at before storing; meals are read leniently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DayPlan(pub Value);

impl DayPlan {
    /// `resumo`, unless missing or null.
    pub fn summary(&self) -> Option<&Value> {
        self.0.get("resumo").filter(|v| !v.is_null())
    }

    /// `refeicoes` when it is an array, otherwise nothing.
    pub fn meals(&self) -> &[Value] {
        self.0
            .get("refeicoes")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn meals_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.0.get_mut("refeicoes").and_then(Value::as_array_mut)
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// Reads a meal field as text. Non-string values yield `None`.
pub fn meal_text<'a>(meal: &'a Value, key: &str) -> Option<&'a str> {
    meal.get(key).and_then(Value::as_str)
}

/// Reads a numeric plan field, accepting numbers and numeric strings; anything else is 0.
pub fn number_field(value: &Value, key: &str) -> f64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub fn is_completed(meal: &Value) -> bool {
    meal.get("completed").and_then(Value::as_bool).unwrap_or(false)
}

/// `{ "data": ... }` envelope returned by the generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEnvelope<T> {
    pub data: T,
}
