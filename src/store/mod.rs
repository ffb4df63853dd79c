//! Per-user document store addressed by slash-separated paths.
//!
//! Writes are field-level merges: every top-level key of the written fields
//! replaces the stored key, everything else is kept. Keys such as `planos.1`
//! are literal field names, not nested paths.

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

pub type Document = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath(String);

impl DocumentPath {
    /// `users/{uid}/dailyData/{date_key}`
    pub fn daily(user_id: Uuid, date_key: &str) -> Self {
        Self(format!("users/{}/dailyData/{}", user_id, date_key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocumentPath) -> anyhow::Result<Option<Document>>;
    async fn set_merge(&self, path: &DocumentPath, fields: Document) -> anyhow::Result<()>;
}

pub(crate) fn merge_into(target: &mut Document, fields: Document) {
    for (k, v) in fields {
        target.insert(k, v);
    }
}
