use std::sync::Arc;

use common::{
    models::Queue,
    nats::{
        base::BaseJetStream,
        publish::{IPublishService, PublishService},
    },
};

pub type Services = Arc<ServiceCollection>;

pub struct ServiceCollection {
    pub update_publish_service: Arc<dyn IPublishService>,
    pub cleanup_publish_service: Arc<dyn IPublishService>,
}

impl ServiceCollection {
    pub async fn build(nats_uri: &str) -> Result<Services, &'static str> {
        let base = Arc::new(BaseJetStream::build(nats_uri).await?);
        base.queue_stream(Queue::Update).await?;
        base.queue_stream(Queue::Cleanup).await?;
        Ok(Arc::new(ServiceCollection {
            update_publish_service: Arc::new(PublishService::new(base.clone(), Queue::Update)),
            cleanup_publish_service: Arc::new(PublishService::new(base, Queue::Cleanup)),
        }))
    }
}
