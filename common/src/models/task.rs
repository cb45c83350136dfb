use serde::{Deserialize, Serialize};

pub const CREATE_DOCUMENT_THUMBNAIL: &str = "create_document_thumbnail";
pub const DELETE_ORPHANED_DOCUMENT_FILES: &str = "delete_orphaned_document_files";
pub const DELETE_ORPHANED_THUMBNAILS: &str = "delete_orphaned_thumbnails";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Queue {
    Update,
    Cleanup,
}

impl Queue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Queue::Update => "update",
            Queue::Cleanup => "cleanup",
        }
    }

    pub fn subject(&self, task_name: &str) -> String {
        format!("{}.{}", self.as_str(), task_name)
    }

    pub fn subjects(&self) -> String {
        format!("{}.*", self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<u64>,
}

impl TaskMessage {
    pub fn for_object(object_id: u64) -> Self {
        TaskMessage {
            object_id: Some(object_id),
        }
    }

    pub fn from_json_slice(slice: &[u8]) -> Result<Self, &'static str> {
        serde_json::from_slice(slice).map_err(|_| "task message is not valid json")
    }

    pub fn to_json(&self) -> Result<String, &'static str> {
        serde_json::to_string(self).map_err(|_| "task message is not serializable")
    }
}
