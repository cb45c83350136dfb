use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::dtos::{RootDto, RootLinks};

pub fn create_route() -> Router {
    Router::new().route("/", get(root_links)).route("/health", get(health))
}

pub async fn root_links() -> Json<RootDto> {
    Json(RootDto {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        _links: RootLinks {
            thumbnail: "/documents/{id}/thumbnail".to_string(),
            cleanup_documents: "/cleanup/documents".to_string(),
            cleanup_thumbnails: "/cleanup/thumbnails".to_string(),
        },
    })
}

#[tracing::instrument]
pub async fn health() -> StatusCode {
    StatusCode::OK
}
