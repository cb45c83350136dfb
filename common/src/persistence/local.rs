use std::path::{Component, Path, PathBuf};

use tokio::{fs, io::AsyncWriteExt};
use tracing::info;

use super::{FileReader, IFileStorage};

pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: PathBuf) -> Self {
        LocalFileStorage { root }
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, &'static str> {
        let relative = Path::new(name);
        let escapes = relative.components().any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || escapes {
            return Err("invalid storage name");
        }
        Ok(self.root.join(relative))
    }

    fn to_name(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Option<Vec<&str>> = relative.components().map(|component| component.as_os_str().to_str()).collect();
        parts.map(|parts| parts.join("/"))
    }
}

#[async_trait::async_trait]
impl IFileStorage for LocalFileStorage {
    async fn exists(&self, name: &str) -> Result<bool, &'static str> {
        let path = self.resolve(name)?;
        Ok(fs::metadata(&path).await.map(|metadata| metadata.is_file()).unwrap_or(false))
    }

    async fn open(&self, name: &str) -> Result<FileReader, &'static str> {
        let path = self.resolve(name)?;
        let file = fs::File::open(&path).await.map_err(|_| "file not found")?;
        Ok(Box::new(file))
    }

    async fn save(&self, name: &str, _mime_type: Option<&str>, content: Vec<u8>) -> Result<String, &'static str> {
        let path = self.resolve(name)?;
        info!("Storing {}", name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|_| "could not create directory")?;
        }
        let mut file = fs::File::create(&path).await.map_err(|_| "could not create file")?;
        file.write_all(&content).await.map_err(|_| "could not write file")?;
        file.flush().await.map_err(|_| "could not write file")?;
        Ok(name.to_string())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, &'static str> {
        let directory = self.resolve(prefix.trim_end_matches('/'))?;
        if !fs::try_exists(&directory).await.unwrap_or(false) {
            return Ok(vec![]);
        }
        let mut names = vec![];
        let mut pending = vec![directory];
        while let Some(directory) = pending.pop() {
            let mut entries = fs::read_dir(&directory).await.map_err(|_| "could not read directory")?;
            while let Some(entry) = entries.next_entry().await.map_err(|_| "could not read directory")? {
                let file_type = entry.file_type().await.map_err(|_| "could not read directory")?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if let Some(name) = self.to_name(&entry.path()) {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> Result<(), &'static str> {
        let path = self.resolve(name)?;
        fs::remove_file(&path).await.map_err(|_| "could not delete file")
    }
}
