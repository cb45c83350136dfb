use std::{collections::HashSet, sync::Arc};

use common::{
    models::{Queue, TaskMessage, DELETE_ORPHANED_DOCUMENT_FILES, DELETE_ORPHANED_THUMBNAILS},
    persistence::{IDocumentPersistence, IFileStorage},
    tasks::{ITask, WorkError},
    util::consts::{DOCUMENTS_PREFIX, THUMBS_PREFIX},
};
use tracing::{error, info, warn};

/// Removes stored files that no document record points at.
pub struct OrphanSweeper {
    pub documents: Arc<dyn IDocumentPersistence>,
    pub storage: Arc<dyn IFileStorage>,
}

impl OrphanSweeper {
    pub async fn delete_orphaned_document_files(&self) -> Result<usize, &'static str> {
        let referenced: HashSet<String> = self.documents.list().await?.into_iter().filter_map(|document| document.doc_file).collect();
        self.sweep(DOCUMENTS_PREFIX, &referenced).await
    }

    pub async fn delete_orphaned_thumbnails(&self) -> Result<usize, &'static str> {
        let referenced: HashSet<String> = self.documents.list().await?.into_iter().filter_map(|document| document.thumbnail).collect();
        self.sweep(THUMBS_PREFIX, &referenced).await
    }

    async fn sweep(&self, prefix: &str, referenced: &HashSet<String>) -> Result<usize, &'static str> {
        let mut deleted = 0;
        for name in self.storage.list(prefix).await? {
            if referenced.contains(&name) {
                continue;
            }
            match self.storage.delete(&name).await {
                Ok(()) => {
                    info!("Deleted orphaned file {}", &name);
                    deleted += 1;
                }
                Err(err) => warn!("Could not delete orphaned file {}: {}", &name, err),
            }
        }
        info!("Deleted {} orphaned files under {}", deleted, prefix);
        Ok(deleted)
    }
}

fn finish(task_name: &str, result: Result<usize, &'static str>) -> Result<(), WorkError> {
    match result {
        Ok(_) => Ok(()),
        Err(err) => {
            error!("{} failed: {}", task_name, err);
            Err(WorkError::Retry)
        }
    }
}

pub struct DeleteOrphanedDocumentFilesTask {
    pub sweeper: Arc<OrphanSweeper>,
}

#[async_trait::async_trait]
impl ITask for DeleteOrphanedDocumentFilesTask {
    fn name(&self) -> &'static str {
        DELETE_ORPHANED_DOCUMENT_FILES
    }

    fn queue(&self) -> Queue {
        Queue::Cleanup
    }

    #[tracing::instrument(skip(self))]
    async fn work(&self, _message: &TaskMessage) -> Result<(), WorkError> {
        finish(self.name(), self.sweeper.delete_orphaned_document_files().await)
    }
}

pub struct DeleteOrphanedThumbnailsTask {
    pub sweeper: Arc<OrphanSweeper>,
}

#[async_trait::async_trait]
impl ITask for DeleteOrphanedThumbnailsTask {
    fn name(&self) -> &'static str {
        DELETE_ORPHANED_THUMBNAILS
    }

    fn queue(&self) -> Queue {
        Queue::Cleanup
    }

    #[tracing::instrument(skip(self))]
    async fn work(&self, _message: &TaskMessage) -> Result<(), WorkError> {
        finish(self.name(), self.sweeper.delete_orphaned_thumbnails().await)
    }
}
