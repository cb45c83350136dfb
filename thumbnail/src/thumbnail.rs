use std::{io::Cursor, path::Path};

use image::{error::ImageError, imageops::FilterType, io::Reader, ImageFormat};

pub const THUMBNAIL_WIDTH: u32 = 200;
pub const THUMBNAIL_HEIGHT: u32 = 150;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailError {
    /// No decoder is available for the source image format.
    MissingRenderer,
    Failed(&'static str),
}

#[async_trait::async_trait]
pub trait IThumbnailRenderer: Send + Sync {
    async fn generate(&self, image_path: &Path) -> Result<Vec<u8>, ThumbnailError>;
}

pub struct ImageThumbnailRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageThumbnailRenderer {
    fn default() -> Self {
        ImageThumbnailRenderer {
            width: THUMBNAIL_WIDTH,
            height: THUMBNAIL_HEIGHT,
        }
    }
}

#[async_trait::async_trait]
impl IThumbnailRenderer for ImageThumbnailRenderer {
    async fn generate(&self, image_path: &Path) -> Result<Vec<u8>, ThumbnailError> {
        let image_path = image_path.to_path_buf();
        let (width, height) = (self.width, self.height);
        tokio::task::spawn_blocking(move || fit_to_png(&image_path, width, height))
            .await
            .map_err(|_| ThumbnailError::Failed("thumbnail worker panicked"))?
    }
}

/// Crops to the target aspect ratio and scales, like a "cover" fit.
fn fit_to_png(image_path: &Path, width: u32, height: u32) -> Result<Vec<u8>, ThumbnailError> {
    let reader = Reader::open(image_path)
        .map_err(|_| ThumbnailError::Failed("could not open image"))?
        .with_guessed_format()
        .map_err(|_| ThumbnailError::Failed("could not read image"))?;
    if reader.format().is_none() {
        return Err(ThumbnailError::MissingRenderer);
    }
    let source = reader.decode().map_err(|err| match err {
        ImageError::Unsupported(_) => ThumbnailError::MissingRenderer,
        _ => ThumbnailError::Failed("could not decode image"),
    })?;
    let thumbnail = source.resize_to_fill(width, height, FilterType::Lanczos3);
    let mut bytes: Vec<u8> = Vec::new();
    thumbnail
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|_| ThumbnailError::Failed("could not encode thumbnail"))?;
    Ok(bytes)
}
