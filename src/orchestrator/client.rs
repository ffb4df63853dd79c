use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::PlanError;
use crate::plan::dto::{DayPlan, DayPlanRequest};

/// Remote side of `POST /gerar-plano-dia`.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: &DayPlanRequest) -> Result<DayPlan, PlanError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpGenerationClient {
    client: Client,
    endpoint: String,
}

impl HttpGenerationClient {
    /// `base_url` is the backend root, e.g. `http://localhost:3333`.
    pub fn new(base_url: &str) -> Result<Self, PlanError> {
        // No request timeout: a hung reply stalls the run.
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| PlanError::UpstreamError(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: format!("{}/gerar-plano-dia", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, request: &DayPlanRequest) -> Result<DayPlan, PlanError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| PlanError::UpstreamError(format!("request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PlanError::UpstreamError(format!("failed to read reply: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(text);
            return Err(PlanError::UpstreamError(format!("status {}: {}", status, message)));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| PlanError::MalformedJson(e.to_string()))?;
        day_plan_from_envelope(body, request)
    }
}

/// Pulls `data` out of the reply and requires a non-null `resumo`. The plan is otherwise untouched.
pub fn day_plan_from_envelope(mut body: Value, request: &DayPlanRequest) -> Result<DayPlan, PlanError> {
    let plan = DayPlan(body.get_mut("data").map(Value::take).unwrap_or(Value::Null));
    if plan.summary().is_none() {
        return Err(PlanError::InvalidPlanShape(format!(
            "API retornou dados inválidos para {} (Opção {})",
            request.day_name, request.alternative_index
        )));
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::dto::UserProfile;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    fn request() -> DayPlanRequest {
        DayPlanRequest {
            profile: UserProfile::default(),
            day_name: "Quinta-feira".into(),
            alternative_index: 2,
        }
    }

    #[test]
    fn keeps_plan_exactly_as_returned() {
        let data = json!({
            "resumo": { "caloriasTotais": 1900, "metaAgua": 2200, "dica": "beba água" },
            "refeicoes": [
                { "id": "Qui-2-1", "nome": "Almoço", "calorias": "350", "tempoPreparo": 15,
                  "observacao": "sem sal" }
            ]
        });
        let plan = day_plan_from_envelope(json!({ "data": data.clone() }), &request()).unwrap();
        assert_eq!(plan.into_inner(), data);
    }

    #[test]
    fn missing_or_null_resumo_is_invalid_shape() {
        for body in [
            json!({ "data": { "refeicoes": [] } }),
            json!({ "data": { "resumo": null, "refeicoes": [] } }),
            json!({ "data": null }),
            json!({ "message": "ok?" }),
        ] {
            let err = day_plan_from_envelope(body, &request()).unwrap_err();
            match err {
                PlanError::InvalidPlanShape(msg) => {
                    assert!(msg.contains("Quinta-feira (Opção 2)"), "{msg}")
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    /// Serves canned replies under `/ok`, `/fail` and `/garbage` on an ephemeral port.
    async fn backend() -> String {
        let app = Router::new()
            .route(
                "/ok/gerar-plano-dia",
                post(|Json(req): Json<Value>| async move {
                    Json(json!({ "data": {
                        "resumo": { "caloriasTotais": 1800 },
                        "refeicoes": [{ "id": "Qui-2-1", "dia": req["diaDaSemana"] }]
                    }}))
                }),
            )
            .route(
                "/fail/gerar-plano-dia",
                post(|| async {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({ "message": "Falha na IA: A IA retornou uma resposta vazia." })),
                    )
                }),
            )
            .route("/garbage/gerar-plano-dia", post(|| async { "<html>oops</html>" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn http_client_posts_request_and_reads_envelope() {
        let base = backend().await;
        let client = HttpGenerationClient::new(&format!("{}/ok/", base)).unwrap();
        let plan = client.generate(&request()).await.unwrap();
        assert_eq!(plan.summary().unwrap()["caloriasTotais"], 1800);
        assert_eq!(plan.meals()[0]["dia"], "Quinta-feira");
    }

    #[tokio::test]
    async fn http_client_maps_error_status_and_bad_body() {
        let base = backend().await;

        let client = HttpGenerationClient::new(&format!("{}/fail", base)).unwrap();
        match client.generate(&request()).await.unwrap_err() {
            PlanError::UpstreamError(msg) => {
                assert!(msg.contains("400"), "{msg}");
                assert!(msg.contains("A IA retornou uma resposta vazia."), "{msg}");
            }
            other => panic!("unexpected {other:?}"),
        }

        let client = HttpGenerationClient::new(&format!("{}/garbage", base)).unwrap();
        assert!(matches!(
            client.generate(&request()).await.unwrap_err(),
            PlanError::MalformedJson(_)
        ));
    }
}
