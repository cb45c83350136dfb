use std::{path::PathBuf, sync::Arc};

use common::{
    models::Queue,
    nats::subscribe::{ISubscribeService, SubscribeService, SubscribeSettings},
    persistence::ThumbnailPersistence,
    tasks::TaskRegistry,
    util::state::{NatsBaseSettings, StorageBaseServiceCollection, StorageSettings},
};
use pdfium_render::prelude::Pdfium;

use crate::{
    render::{DocumentRenderer, LibreSettings},
    task::{ThumbnailSettings, ThumbnailTask},
    thumbnail::ImageThumbnailRenderer,
};

pub struct ThumbnailServiceSettings {
    pub placeholder_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub libre: LibreSettings,
}

pub struct ServiceCollection {
    pub subscribe_service: Arc<dyn ISubscribeService>,
}

impl ServiceCollection {
    pub async fn build(
        nats_settings: NatsBaseSettings<'_>, storage_settings: StorageSettings, media_root: PathBuf, subscribe_settings: SubscribeSettings, thumbnail_settings: ThumbnailServiceSettings, pdfium: Option<Pdfium>,
    ) -> Result<Self, &'static str> {
        let base = StorageBaseServiceCollection::build(&nats_settings, storage_settings, media_root).await?;
        let task = ThumbnailTask {
            thumbnails: ThumbnailPersistence {
                documents: base.document_persistence.clone(),
                storage: base.file_storage.clone(),
            },
            renderer: Arc::new(DocumentRenderer {
                pdfium: pdfium.map(Arc::new),
                libre: thumbnail_settings.libre,
            }),
            thumbnailer: Arc::new(ImageThumbnailRenderer::default()),
            settings: ThumbnailSettings {
                media_root: base.media_root.clone(),
                placeholder_dir: thumbnail_settings.placeholder_dir,
                temp_dir: thumbnail_settings.temp_dir,
            },
        };
        let mut registry = TaskRegistry::default();
        registry.register(Arc::new(task));
        Ok(ServiceCollection {
            subscribe_service: Arc::new(SubscribeService::build(base.base_jetstream.clone(), Queue::Update, Arc::new(registry), subscribe_settings).await?),
        })
    }
}
