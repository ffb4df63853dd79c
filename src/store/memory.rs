use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{merge_into, Document, DocumentPath, DocumentStore};

/// Process-local store used by tests and by the server when no database is configured.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<HashMap<DocumentPath, Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> anyhow::Result<Option<Document>> {
        Ok(self.docs.read().await.get(path).cloned())
    }

    async fn set_merge(&self, path: &DocumentPath, fields: Document) -> anyhow::Result<()> {
        let mut docs = self.docs.write().await;
        merge_into(docs.entry(path.clone()).or_default(), fields);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn obj(v: serde_json::Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn missing_document_is_none() {
        let store = MemoryDocumentStore::new();
        let path = DocumentPath::daily(Uuid::new_v4(), "2024-06-03");
        assert!(store.get(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn merge_write_keeps_sibling_fields() {
        let store = MemoryDocumentStore::new();
        let path = DocumentPath::daily(Uuid::new_v4(), "2024-06-03");

        store
            .set_merge(&path, obj(json!({ "planos.2": { "resumo": { "metaAgua": 2000 } } })))
            .await
            .unwrap();
        store
            .set_merge(&path, obj(json!({ "aguaConsumida": 500 })))
            .await
            .unwrap();
        store
            .set_merge(&path, obj(json!({ "planos.1": { "resumo": { "metaAgua": 2500 } } })))
            .await
            .unwrap();

        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc["aguaConsumida"], json!(500));
        assert_eq!(doc["planos.1"]["resumo"]["metaAgua"], json!(2500));
        assert_eq!(doc["planos.2"]["resumo"]["metaAgua"], json!(2000));
        assert_eq!(store.len().await, 1);
    }
}
