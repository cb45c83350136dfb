use std::path::{Path, PathBuf};

use mime::Mime;
use serde::{Deserialize, Serialize};

use crate::util::mime::get_content_type;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentModel {
    pub id: u64,
    pub uuid: String,
    #[serde(default)]
    pub title: String,
    pub doc_file: Option<String>,
    pub extension: Option<String>,
    pub thumbnail: Option<String>,
}

impl DocumentModel {
    pub fn from_json_slice(slice: &[u8]) -> Result<Self, &'static str> {
        serde_json::from_slice(slice).map_err(|_| "document is not valid json")
    }

    pub fn to_json(&self) -> Result<String, &'static str> {
        serde_json::to_string(self).map_err(|_| "document is not serializable")
    }

    pub fn key(&self) -> String {
        self.id.to_string()
    }

    /// Lowercase extension, taken from the record or else from the file name.
    pub fn extension(&self) -> Option<String> {
        if let Some(extension) = self.extension.as_deref().filter(|extension| !extension.is_empty()) {
            return Some(extension.trim_start_matches('.').to_lowercase());
        }
        let doc_file = self.doc_file.as_deref()?;
        Path::new(doc_file).extension().and_then(|extension| extension.to_str()).map(|extension| extension.to_lowercase())
    }

    pub fn content_type(&self) -> Mime {
        match self.extension() {
            Some(extension) => get_content_type(None, &format!("document.{}", extension)),
            None => mime::APPLICATION_OCTET_STREAM,
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type().type_() == mime::IMAGE
    }

    pub fn is_file(&self) -> bool {
        self.doc_file.as_deref().map(|doc_file| !doc_file.is_empty()).unwrap_or(false)
    }

    /// Placeholder for this kind of document, falling back to the generic one.
    pub fn find_placeholder(&self, placeholder_dir: &Path) -> Option<PathBuf> {
        let by_extension = self.extension().map(|extension| placeholder_dir.join(format!("{}-placeholder.png", extension)));
        by_extension
            .into_iter()
            .chain(std::iter::once(placeholder_dir.join("generic-placeholder.png")))
            .find(|path| path.is_file())
    }

    pub fn thumbnail_file_name(&self) -> String {
        format!("document-{}-thumb.png", self.uuid)
    }
}
