use tokio::io::AsyncRead;

use crate::models::DocumentModel;

pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

#[async_trait::async_trait]
pub trait IDocumentPersistence: Send + Sync {
    async fn get(&self, id: u64) -> Result<Option<DocumentModel>, &'static str>;
    async fn put(&self, document: &DocumentModel) -> Result<(), &'static str>;
    async fn list(&self) -> Result<Vec<DocumentModel>, &'static str>;
}

/// Storage addressed by names relative to the media root, e.g. `documents/a.pdf`.
#[async_trait::async_trait]
pub trait IFileStorage: Send + Sync {
    async fn exists(&self, name: &str) -> Result<bool, &'static str>;
    async fn open(&self, name: &str) -> Result<FileReader, &'static str>;
    async fn save(&self, name: &str, mime_type: Option<&str>, content: Vec<u8>) -> Result<String, &'static str>;
    async fn list(&self, prefix: &str) -> Result<Vec<String>, &'static str>;
    async fn delete(&self, name: &str) -> Result<(), &'static str>;
}
