use std::{path::Path, str::FromStr};

use mime::Mime;

pub fn get_content_type(mime_type: Option<&str>, filename: &str) -> Mime {
    if let Some(mime_type) = mime_type {
        if let Ok(content_type) = Mime::from_str(mime_type) {
            return content_type;
        }
    }
    if let Some(extension) = Path::new(filename).extension() {
        if let Some(extension) = extension.to_str() {
            return match extension.to_lowercase().as_str() {
                "pdf" => mime::APPLICATION_PDF,
                "png" => mime::IMAGE_PNG,
                "jpg" | "jpeg" => mime::IMAGE_JPEG,
                "gif" => mime::IMAGE_GIF,
                "bmp" => mime::IMAGE_BMP,
                "tif" | "tiff" => Mime::from_str("image/tiff").unwrap_or(mime::APPLICATION_OCTET_STREAM),
                "txt" => mime::TEXT_PLAIN,
                _ => mime::APPLICATION_OCTET_STREAM,
            };
        }
    }
    mime::APPLICATION_OCTET_STREAM
}

pub fn is_pdf(path: &Path) -> bool {
    get_content_type(None, &path.to_string_lossy()) == mime::APPLICATION_PDF
}
