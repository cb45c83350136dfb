use std::{
    collections::BTreeMap,
    io::Cursor,
    sync::Mutex,
};

use crate::models::DocumentModel;

use super::{FileReader, IDocumentPersistence, IFileStorage};

#[derive(Default)]
pub struct InMemoryDocumentPersistence {
    documents: Mutex<BTreeMap<u64, DocumentModel>>,
}

impl InMemoryDocumentPersistence {
    pub fn with(documents: Vec<DocumentModel>) -> Self {
        InMemoryDocumentPersistence {
            documents: Mutex::new(documents.into_iter().map(|document| (document.id, document)).collect()),
        }
    }

    pub fn document(&self, id: u64) -> Option<DocumentModel> {
        self.documents.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait::async_trait]
impl IDocumentPersistence for InMemoryDocumentPersistence {
    async fn get(&self, id: u64) -> Result<Option<DocumentModel>, &'static str> {
        Ok(self.document(id))
    }

    async fn put(&self, document: &DocumentModel) -> Result<(), &'static str> {
        self.documents.lock().unwrap().insert(document.id, document.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<DocumentModel>, &'static str> {
        Ok(self.documents.lock().unwrap().values().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryFileStorage {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryFileStorage {
    pub fn with(files: Vec<(&str, Vec<u8>)>) -> Self {
        InMemoryFileStorage {
            files: Mutex::new(files.into_iter().map(|(name, content)| (name.to_string(), content)).collect()),
        }
    }

    pub fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait::async_trait]
impl IFileStorage for InMemoryFileStorage {
    async fn exists(&self, name: &str) -> Result<bool, &'static str> {
        Ok(self.files.lock().unwrap().contains_key(name))
    }

    async fn open(&self, name: &str) -> Result<FileReader, &'static str> {
        let content = self.file(name).ok_or("file not found")?;
        Ok(Box::new(Cursor::new(content)))
    }

    async fn save(&self, name: &str, _mime_type: Option<&str>, content: Vec<u8>) -> Result<String, &'static str> {
        self.files.lock().unwrap().insert(name.to_string(), content);
        Ok(name.to_string())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, &'static str> {
        Ok(self.names().into_iter().filter(|name| name.starts_with(prefix)).collect())
    }

    async fn delete(&self, name: &str) -> Result<(), &'static str> {
        self.files.lock().unwrap().remove(name).map(|_| ()).ok_or("file not found")
    }
}
