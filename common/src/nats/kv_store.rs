use std::sync::Arc;

use async_nats::jetstream::kv::{Config, Store};
use futures::StreamExt;
use tracing::error;

use crate::{models::DocumentModel, persistence::IDocumentPersistence};

use super::base::BaseJetStream;

pub struct KeyValueStoreService {
    key_value: Store,
}

impl KeyValueStoreService {
    pub async fn build(base: Arc<BaseJetStream>, bucket: String) -> Result<Self, &'static str> {
        let key_value = match base.jetstream.get_key_value(&bucket).await {
            Ok(key_value) => key_value,
            Err(_) => base
                .jetstream
                .create_key_value(Config { bucket, ..Default::default() })
                .await
                .map_err(|_| "could not create key value store bucket")?,
        };
        Ok(KeyValueStoreService { key_value })
    }
}

#[async_trait::async_trait]
impl IDocumentPersistence for KeyValueStoreService {
    async fn get(&self, id: u64) -> Result<Option<DocumentModel>, &'static str> {
        let entry = self.key_value.get(id.to_string()).await.map_err(|_| "could not get document")?;
        entry.map(|bytes| DocumentModel::from_json_slice(&bytes)).transpose()
    }

    async fn put(&self, document: &DocumentModel) -> Result<(), &'static str> {
        let json = document.to_json()?;
        self.key_value.put(document.key(), json.into()).await.map_err(|_| "could not put document")?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<DocumentModel>, &'static str> {
        let mut keys = self.key_value.keys().await.map_err(|_| "could not list documents")?;
        let mut documents = vec![];
        while let Some(key) = keys.next().await {
            let key = key.map_err(|_| "could not list documents")?;
            let entry = self.key_value.get(&key).await.map_err(|_| "could not get document")?;
            if let Some(bytes) = entry {
                let document = DocumentModel::from_json_slice(&bytes).map_err(|_| {
                    error!("Document {} could not be decoded", &key);
                    "could not decode document"
                })?;
                documents.push(document);
            }
        }
        Ok(documents)
    }
}
