use std::{env, path::PathBuf, time::Duration};

use cleanup::state::ServiceCollection;
use common::{
    nats::subscribe::SubscribeSettings,
    util::state::{NatsBaseSettings, StorageSettings},
};

#[tokio::main]
async fn main() {
    let subscriber = tracing_subscriber::fmt().json().finish();
    tracing::subscriber::set_global_default(subscriber).expect("Could not init tracing.");

    let nats_uri = get_nats();
    let nats_settings = NatsBaseSettings {
        nats_uri: &nats_uri,
        bucket: get_bucket(),
    };
    let subscribe_settings = SubscribeSettings {
        consumer: get_consumer(),
        max_deliver: get_max_deliver(),
        ack_wait: get_consumer_ack_wait(),
    };

    let services = ServiceCollection::build(nats_settings, StorageSettings::from_env(), get_media_root(), subscribe_settings).await.unwrap();
    services.subscribe_service.subscribe().await.unwrap();
}

fn get_nats() -> String {
    env::var("NATS_URI").unwrap_or_else(|_| "nats://localhost:4222".to_string())
}

fn get_bucket() -> String {
    env::var("NATS_KV_STORE_BUCKET").unwrap_or_else(|_| "documents".to_string())
}

fn get_consumer() -> String {
    env::var("NATS_JETSTREAM_CONSUMER").unwrap_or_else(|_| "cleanup".to_string())
}

fn get_max_deliver() -> i64 {
    let max_deliver = env::var("NATS_JETSTREAM_CONSUMER_MAX_DELIVERIES").map(|max_deliver| max_deliver.parse::<i64>());

    match max_deliver {
        Ok(Ok(max_deliver)) => max_deliver,
        _ => 3,
    }
}

fn get_consumer_ack_wait() -> Duration {
    let consumer_ack_wait = env::var("NATS_JETSTREAM_CONSUMER_ACK_WAIT_SECONDS").map(|ack_wait| ack_wait.parse::<u64>());

    let consumer_ack_wait = match consumer_ack_wait {
        Ok(Ok(consumer_ack_wait)) => consumer_ack_wait,
        _ => 300,
    };
    Duration::from_secs(consumer_ack_wait)
}

fn get_media_root() -> PathBuf {
    PathBuf::from(env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string()))
}
