use std::sync::Arc;

use crate::models::{Queue, TaskMessage};

use super::base::BaseJetStream;

#[async_trait::async_trait]
pub trait IPublishService: Sync + Send {
    async fn publish(&self, task_name: &str, message: &TaskMessage) -> Result<(), &'static str>;
}

pub struct PublishService {
    base: Arc<BaseJetStream>,
    queue: Queue,
}

impl PublishService {
    pub fn new(base: Arc<BaseJetStream>, queue: Queue) -> Self {
        PublishService { base, queue }
    }
}

#[async_trait::async_trait]
impl IPublishService for PublishService {
    async fn publish(&self, task_name: &str, message: &TaskMessage) -> Result<(), &'static str> {
        let json = message.to_json()?;
        let ack = self.base.jetstream.publish(self.queue.subject(task_name), json.into()).await.map_err(|_| "not published")?;
        ack.await.map_err(|_| "not acknowledged")?;
        Ok(())
    }
}
