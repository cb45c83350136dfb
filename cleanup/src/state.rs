use std::{path::PathBuf, sync::Arc};

use common::{
    models::Queue,
    nats::subscribe::{ISubscribeService, SubscribeService, SubscribeSettings},
    tasks::TaskRegistry,
    util::state::{NatsBaseSettings, StorageBaseServiceCollection, StorageSettings},
};

use crate::orphans::{DeleteOrphanedDocumentFilesTask, DeleteOrphanedThumbnailsTask, OrphanSweeper};

pub struct ServiceCollection {
    pub subscribe_service: Arc<dyn ISubscribeService>,
}

impl ServiceCollection {
    pub async fn build(nats_settings: NatsBaseSettings<'_>, storage_settings: StorageSettings, media_root: PathBuf, subscribe_settings: SubscribeSettings) -> Result<Self, &'static str> {
        let base = StorageBaseServiceCollection::build(&nats_settings, storage_settings, media_root).await?;
        let sweeper = Arc::new(OrphanSweeper {
            documents: base.document_persistence.clone(),
            storage: base.file_storage.clone(),
        });
        let mut registry = TaskRegistry::default();
        registry
            .register(Arc::new(DeleteOrphanedDocumentFilesTask { sweeper: sweeper.clone() }))
            .register(Arc::new(DeleteOrphanedThumbnailsTask { sweeper }));
        Ok(ServiceCollection {
            subscribe_service: Arc::new(SubscribeService::build(base.base_jetstream.clone(), Queue::Cleanup, Arc::new(registry), subscribe_settings).await?),
        })
    }
}
