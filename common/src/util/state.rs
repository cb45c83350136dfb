use std::{env, path::PathBuf, sync::Arc};

use crate::{
    nats::{base::BaseJetStream, kv_store::KeyValueStoreService},
    persistence::{local::LocalFileStorage, s3::S3FileStorage, IDocumentPersistence, IFileStorage},
};

pub struct NatsBaseSettings<'a> {
    pub nats_uri: &'a str,
    pub bucket: String,
}

pub struct NatsBaseServiceCollection {
    pub base_jetstream: Arc<BaseJetStream>,
    pub document_persistence: Arc<dyn IDocumentPersistence>,
}

impl NatsBaseServiceCollection {
    pub async fn build(nats_settings: &NatsBaseSettings<'_>) -> Result<Arc<Self>, &'static str> {
        let base_jetstream = Arc::new(BaseJetStream::build(nats_settings.nats_uri).await?);
        Ok(Arc::new(NatsBaseServiceCollection {
            document_persistence: Arc::new(KeyValueStoreService::build(base_jetstream.clone(), nats_settings.bucket.clone()).await?),
            base_jetstream,
        }))
    }
}

pub struct S3BaseSettings {
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
}

pub enum StorageSettings {
    Local,
    S3(S3BaseSettings),
}

impl StorageSettings {
    pub fn from_env() -> Self {
        match env::var("STORAGE_BACKEND").as_deref() {
            Ok("s3") => StorageSettings::S3(S3BaseSettings {
                endpoint: env::var("S3_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string()),
                region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                access_key_id: env::var("S3_ACCESS_KEY_ID").unwrap_or_else(|_| "minio123".to_string()),
                secret_access_key: env::var("S3_SECRET_ACCESS_KEY").unwrap_or_else(|_| "minio123".to_string()),
                bucket: env::var("S3_BUCKET").unwrap_or_else(|_| "media".to_string()),
            }),
            _ => StorageSettings::Local,
        }
    }
}

pub struct StorageBaseServiceCollection {
    pub base_jetstream: Arc<BaseJetStream>,
    pub document_persistence: Arc<dyn IDocumentPersistence>,
    pub file_storage: Arc<dyn IFileStorage>,
    pub media_root: PathBuf,
}

impl StorageBaseServiceCollection {
    pub async fn build(nats_settings: &NatsBaseSettings<'_>, storage_settings: StorageSettings, media_root: PathBuf) -> Result<Arc<Self>, &'static str> {
        let nats_base = NatsBaseServiceCollection::build(nats_settings).await?;
        let file_storage: Arc<dyn IFileStorage> = match storage_settings {
            StorageSettings::Local => Arc::new(LocalFileStorage::new(media_root.clone())),
            StorageSettings::S3(s3_settings) => Arc::new(
                S3FileStorage::build(s3_settings.endpoint, s3_settings.region, s3_settings.access_key_id, s3_settings.secret_access_key, s3_settings.bucket).await?,
            ),
        };
        Ok(Arc::new(StorageBaseServiceCollection {
            base_jetstream: nats_base.base_jetstream.clone(),
            document_persistence: nats_base.document_persistence.clone(),
            file_storage,
            media_root,
        }))
    }
}
