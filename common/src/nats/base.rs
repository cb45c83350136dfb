use async_nats::{
    connect,
    jetstream::{
        stream::{Config, RetentionPolicy, Stream},
        Context,
    },
};

use crate::models::Queue;

pub struct BaseJetStream {
    pub jetstream: Context,
}

impl BaseJetStream {
    pub async fn build(uri: &str) -> Result<Self, &'static str> {
        let nc = connect(uri).await.map_err(|_| "could not connect")?;
        let jetstream = async_nats::jetstream::new(nc);
        Ok(BaseJetStream { jetstream })
    }

    /// Work-queue stream backing `queue`; each message is delivered to one worker.
    pub async fn queue_stream(&self, queue: Queue) -> Result<Stream, &'static str> {
        self.jetstream
            .get_or_create_stream(Config {
                name: queue.as_str().to_string(),
                subjects: vec![queue.subjects()],
                max_messages: 10_000,
                retention: RetentionPolicy::WorkQueue,
                ..Default::default()
            })
            .await
            .map_err(|_| "could not get or create stream")
    }
}
