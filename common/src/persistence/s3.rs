use std::{fmt::Display, io};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use s3::{creds::Credentials, region::Region, Bucket};
use tokio_util::io::StreamReader;
use tracing::info;

use super::{FileReader, IFileStorage};

pub struct S3FileStorage {
    bucket: Bucket,
}

impl S3FileStorage {
    pub async fn build(endpoint: String, region: String, access_key_id: String, secret_access_key: String, bucket: String) -> Result<Self, &'static str> {
        let credentials = Credentials::new(Some(&access_key_id), Some(&secret_access_key), None, None, None);
        let credentials = credentials.map_err(|_| "error with credentials")?;
        let bucket = Bucket::new(&bucket, Region::Custom { region, endpoint }, credentials).map_err(|_| "error with bucket")?;
        let bucket = bucket.with_path_style();
        Ok(S3FileStorage { bucket })
    }
}

#[async_trait::async_trait]
impl IFileStorage for S3FileStorage {
    async fn exists(&self, name: &str) -> Result<bool, &'static str> {
        let (_, status_code) = self.bucket.head_object(name).await.map_err(|_| "could not reach bucket")?;
        Ok(status_code == 200)
    }

    async fn open(&self, name: &str) -> Result<FileReader, &'static str> {
        let response = self.bucket.get_object_stream(name).await.map_err(|_| "could not get blob")?;
        if response.status_code != 200 {
            return Err("blob not found");
        }
        Ok(chunk_reader(response.bytes))
    }

    async fn save(&self, name: &str, mime_type: Option<&str>, content: Vec<u8>) -> Result<String, &'static str> {
        info!("Storing {}", name);
        let mime_type = mime_type.unwrap_or("application/octet-stream");
        let response = self.bucket.put_object_with_content_type(name, &content, mime_type).await.map_err(|_| "could not put blob")?;
        if response.status_code() != 200 {
            return Err("could not put blob");
        }
        Ok(name.to_string())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, &'static str> {
        let results = self.bucket.list(prefix.to_string(), None).await.map_err(|_| "could not list blobs")?;
        Ok(results.into_iter().flat_map(|result| result.contents).map(|object| object.key).collect())
    }

    async fn delete(&self, name: &str) -> Result<(), &'static str> {
        let response = self.bucket.delete_object(name).await.map_err(|_| "could not delete blob")?;
        match response.status_code() {
            200 | 204 => Ok(()),
            _ => Err("could not delete blob"),
        }
    }
}

/// Body chunk of an object stream. Depending on the rust-s3 release the
/// stream yields bare `Bytes` or a `Result` per chunk.
pub trait IntoChunk {
    fn into_chunk(self) -> io::Result<Bytes>;
}

impl IntoChunk for Bytes {
    fn into_chunk(self) -> io::Result<Bytes> {
        Ok(self)
    }
}

impl<E: Display> IntoChunk for Result<Bytes, E> {
    fn into_chunk(self) -> io::Result<Bytes> {
        self.map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))
    }
}

/// Reads an object body as it arrives instead of buffering it whole.
pub fn chunk_reader<S>(chunks: S) -> FileReader
where
    S: Stream + Send + Unpin + 'static,
    S::Item: IntoChunk,
{
    Box::new(StreamReader::new(chunks.map(IntoChunk::into_chunk)))
}
