use std::{fmt::Display, future::Future, sync::Arc, time::Duration};

use async_nats::jetstream::{stream::Stream as JetStream, AckKind, Message};
use futures::{pin_mut, Stream, StreamExt};
use tracing::{error, info, warn};

use crate::{models::Queue, tasks::{TaskRegistry, WorkError}};

use super::base::BaseJetStream;

#[async_trait::async_trait]
pub trait ISubscribeService: Sync + Send {
    async fn subscribe(&self) -> Result<(), &'static str>;
}

pub struct SubscribeSettings {
    pub consumer: String,
    pub max_deliver: i64,
    pub ack_wait: Duration,
}

pub struct SubscribeService {
    stream: JetStream,
    queue: Queue,
    registry: Arc<TaskRegistry>,
    settings: SubscribeSettings,
}

impl SubscribeService {
    pub async fn build(base: Arc<BaseJetStream>, queue: Queue, registry: Arc<TaskRegistry>, settings: SubscribeSettings) -> Result<Self, &'static str> {
        let stream = base.queue_stream(queue).await?;
        Ok(SubscribeService {
            stream,
            queue,
            registry,
            settings,
        })
    }
}

#[async_trait::async_trait]
impl ISubscribeService for SubscribeService {
    async fn subscribe(&self) -> Result<(), &'static str> {
        let consumer_name = format!("{}-{}", &self.settings.consumer, self.queue.as_str());
        let consumer = self
            .stream
            .get_or_create_consumer(&consumer_name, async_nats::jetstream::consumer::pull::Config {
                name: Some(consumer_name.clone()),
                durable_name: Some(consumer_name.clone()),
                filter_subject: self.queue.subjects(),
                max_deliver: self.settings.max_deliver,
                ack_wait: self.settings.ack_wait,
                ..Default::default()
            })
            .await
            .map_err(|_| "could not get or create consumer")?;
        let messages = consumer.messages().await.map_err(|_| "could not get messages")?;
        info!("Consuming queue {} as {}", self.queue.as_str(), &consumer_name);
        consume_messages(messages, |msg| self.process(msg)).await
    }
}

impl SubscribeService {
    async fn process(&self, msg: Message) {
        info!("procressing next message");
        let work: Result<(), &'static str> = async {
            msg.ack_with(AckKind::Progress).await.map_err(|_| "could not progress")?;
            let subject = msg.subject.to_string();
            info!("## start: {}", &subject);
            let result = self.registry.dispatch(&subject, &msg.payload).await;
            info!("## end: {} with {:?}", &subject, &result);
            match result {
                Ok(()) => msg.ack().await.map_err(|_| "could not ack")?,
                Err(WorkError::NoRetry) => msg.ack_with(AckKind::Term).await.map_err(|_| "could not term")?,
                Err(WorkError::Retry) => msg.ack_with(AckKind::Nak(None)).await.map_err(|_| "could not nak")?,
            };
            Ok::<(), &'static str>(())
        }
        .await;
        if let Err(err) = work {
            error!("Error occured processing message {err}");
        }
    }
}

/// Hands every message to `handle`. Stream errors are logged and skipped; the
/// stream running dry is an error since pull consumers never end on their own.
pub async fn consume_messages<S, T, E, F, Fut>(messages: S, mut handle: F) -> Result<(), &'static str>
where
    S: Stream<Item = Result<T, E>>,
    E: Display,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = ()>,
{
    pin_mut!(messages);
    while let Some(next) = messages.next().await {
        match next {
            Ok(msg) => handle(msg).await,
            Err(err) => warn!("Could not receive message: {}", err),
        }
    }
    error!("Message stream ended");
    Err("message stream ended")
}
