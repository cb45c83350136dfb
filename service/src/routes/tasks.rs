use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use common::models::{Queue, TaskMessage, CREATE_DOCUMENT_THUMBNAIL, DELETE_ORPHANED_DOCUMENT_FILES, DELETE_ORPHANED_THUMBNAILS};
use common::nats::publish::IPublishService;
use tracing::{error, info};

use crate::{dtos::TaskAcceptedDto, state::Services};

pub fn create_route(services: Services) -> Router {
    Router::new()
        .route("/documents/:object_id/thumbnail", post(create_document_thumbnail))
        .route("/cleanup/documents", post(delete_orphaned_document_files))
        .route("/cleanup/thumbnails", post(delete_orphaned_thumbnails))
        .with_state(services)
}

#[tracing::instrument(skip(services))]
pub async fn create_document_thumbnail(State(services): State<Services>, Path(object_id): Path<u64>) -> impl IntoResponse {
    dispatch(services.update_publish_service.clone(), Queue::Update, CREATE_DOCUMENT_THUMBNAIL, TaskMessage::for_object(object_id)).await
}

#[tracing::instrument(skip(services))]
pub async fn delete_orphaned_document_files(State(services): State<Services>) -> impl IntoResponse {
    dispatch(services.cleanup_publish_service.clone(), Queue::Cleanup, DELETE_ORPHANED_DOCUMENT_FILES, TaskMessage::default()).await
}

#[tracing::instrument(skip(services))]
pub async fn delete_orphaned_thumbnails(State(services): State<Services>) -> impl IntoResponse {
    dispatch(services.cleanup_publish_service.clone(), Queue::Cleanup, DELETE_ORPHANED_THUMBNAILS, TaskMessage::default()).await
}

async fn dispatch(publisher: Arc<dyn IPublishService>, queue: Queue, task: &str, message: TaskMessage) -> Result<(StatusCode, Json<TaskAcceptedDto>), (StatusCode, &'static str)> {
    match publisher.publish(task, &message).await {
        Ok(()) => {
            info!("Queued {} on {}", task, queue.as_str());
            Ok((
                StatusCode::ACCEPTED,
                Json(TaskAcceptedDto {
                    task: task.to_string(),
                    queue,
                    object_id: message.object_id,
                }),
            ))
        }
        Err(err) => {
            error!("Could not queue {}: {}", task, err);
            Err((StatusCode::SERVICE_UNAVAILABLE, err))
        }
    }
}
