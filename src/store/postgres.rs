use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};

use super::{Document, DocumentPath, DocumentStore};

/// Documents kept as JSONB rows in the `documents` table.
#[derive(Clone)]
pub struct PgDocumentStore {
    db: PgPool,
}

impl PgDocumentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, path: &DocumentPath) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query_as::<_, (Json<Document>,)>(
            r#"
            SELECT body
              FROM documents
             WHERE path = $1
            "#,
        )
        .bind(path.as_str())
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("get document {}", path))?;

        Ok(row.map(|(Json(body),)| body))
    }

    async fn set_merge(&self, path: &DocumentPath, fields: Document) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (path, body, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (path)
            DO UPDATE SET body = documents.body || EXCLUDED.body,
                          updated_at = now()
            "#,
        )
        .bind(path.as_str())
        .bind(Json(fields))
        .execute(&self.db)
        .await
        .with_context(|| format!("merge document {}", path))?;

        Ok(())
    }
}
