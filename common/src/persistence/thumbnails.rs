use std::sync::Arc;

use tracing::info;

use crate::{models::DocumentModel, util::consts::THUMBS_PREFIX};

use super::{IDocumentPersistence, IFileStorage};

pub struct ThumbnailPersistence {
    pub documents: Arc<dyn IDocumentPersistence>,
    pub storage: Arc<dyn IFileStorage>,
}

impl ThumbnailPersistence {
    /// Stores the thumbnail under `thumbs/` and points the document at it.
    pub async fn save_thumbnail(&self, document: &mut DocumentModel, file_name: &str, content: Vec<u8>) -> Result<String, &'static str> {
        let name = format!("{}{}", THUMBS_PREFIX, file_name);
        let size = content.len();
        let stored = self.storage.save(&name, Some("image/png"), content).await?;
        document.thumbnail = Some(stored.clone());
        self.documents.put(document).await?;
        info!("Saved thumbnail {} ({} bytes) for document #{}", &stored, size, document.id);
        Ok(stored)
    }
}
