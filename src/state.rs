use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{AppConfig, GeminiConfig, JwtConfig};
use crate::error::PlanError;
use crate::plan::model::{GeminiClient, TextModel};
use crate::store::{DocumentStore, MemoryDocumentStore, PgDocumentStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub model: Arc<dyn TextModel>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.database_url {
            Some(url) => {
                let pg = PgDocumentStore::connect(url).await?;
                if let Err(e) = sqlx::migrate!("./migrations").run(pg.pool()).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(pg) as Arc<dyn DocumentStore>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; daily documents are kept in memory");
                Arc::new(MemoryDocumentStore::new()) as Arc<dyn DocumentStore>
            }
        };

        let model = Arc::new(GeminiClient::new(&config.gemini)?) as Arc<dyn TextModel>;

        Ok(Self {
            config,
            store,
            model,
        })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn DocumentStore>,
        model: Arc<dyn TextModel>,
    ) -> Self {
        Self {
            config,
            store,
            model,
        }
    }

    pub fn fake() -> Self {
        struct FakeModel;
        #[async_trait]
        impl TextModel for FakeModel {
            async fn generate_text(&self, _prompt: &str) -> Result<String, PlanError> {
                Ok("```json\n{\"resumo\": {\"caloriasTotais\": 2000, \"metaAgua\": 2500}, \"refeicoes\": []}\n```".into())
            }
            fn model_name(&self) -> &str {
                "fake"
            }
        }

        Self::fake_with_model(Arc::new(FakeModel))
    }

    pub fn fake_with_model(model: Arc<dyn TextModel>) -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 3333,
            database_url: None,
            gemini: GeminiConfig {
                api_key: "test".into(),
                model: "fake".into(),
                base_url: "http://fake.local".into(),
            },
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
            },
        });
        let store = Arc::new(MemoryDocumentStore::new()) as Arc<dyn DocumentStore>;
        Self::from_parts(config, store, model)
    }
}
