use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{debug, warn};

use crate::util::random::generate_30_alphanumeric;

/// Files created during one task run. Everything tracked here, plus the
/// scratch directory, is removed when the value is dropped.
#[derive(Debug)]
pub struct TempFiles {
    directory: PathBuf,
    to_dispose: Vec<PathBuf>,
}

impl TempFiles {
    pub fn new(base: &Path, job_id: &str) -> TempFiles {
        TempFiles {
            directory: base.join(format!("{}-{}", job_id, generate_30_alphanumeric())),
            to_dispose: vec![],
        }
    }

    /// Scratch directory for this run, created on first use.
    pub async fn directory(&self) -> Result<&Path, &'static str> {
        fs::create_dir_all(&self.directory).await.map_err(|_| "could not create temp directory")?;
        Ok(&self.directory)
    }

    pub async fn get_path(&self, extension: &str) -> Result<PathBuf, &'static str> {
        let path = self.directory().await?.join(generate_30_alphanumeric());
        Ok(path.with_extension(extension))
    }

    pub fn track(&mut self, path: PathBuf) {
        if !self.to_dispose.contains(&path) {
            self.to_dispose.push(path);
        }
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.to_dispose
    }

    fn clean_up(&mut self) {
        for path in self.to_dispose.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("Disposed {}", path.display()),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => warn!("Error occured, while deleting temp file {}: {}", path.display(), err),
            }
        }
        match std::fs::remove_dir_all(&self.directory) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!("Error occured, while deleting temp directory {}: {}", self.directory.display(), err),
        }
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        self.clean_up();
    }
}
