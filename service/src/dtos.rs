use common::models::Queue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootDto {
    pub name: String,
    pub version: String,
    #[serde(rename = "_links")]
    pub _links: RootLinks,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootLinks {
    pub thumbnail: String,
    pub cleanup_documents: String,
    pub cleanup_thumbnails: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskAcceptedDto {
    pub task: String,
    pub queue: Queue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<u64>,
}
