use std::{
    fmt,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
    time::Duration,
};

use common::{persistence::tempfiles::TempFiles, util::mime::is_pdf};
use image::ImageFormat;
use pdfium_render::prelude::{PdfRenderConfig, Pdfium};
use tokio::process::Command;
use tracing::{debug, info};

#[cfg(feature = "static")]
pub fn init_pdfium() -> Result<Pdfium, &'static str> {
    Ok(Pdfium::new(Pdfium::bind_to_statically_linked_library().map_err(|_| "Could not init pdfium")?))
}

#[cfg(not(feature = "static"))]
pub fn init_pdfium() -> Result<Pdfium, &'static str> {
    Ok(Pdfium::new(Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./")).map_err(|_| "Could not init pdfium")?))
}

const RENDER_WIDTH: i32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError(pub &'static str);

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Turns a non-image document into an image. Intermediate files are tracked
/// in `temp_files`; the caller owns the returned image.
#[async_trait::async_trait]
pub trait IDocumentRenderer: Send + Sync {
    async fn render(&self, source: &Path, temp_files: &mut TempFiles) -> Result<PathBuf, ConversionError>;
}

pub struct LibreSettings {
    pub executable: PathBuf,
    pub timeout: Duration,
}

pub struct DocumentRenderer {
    pub pdfium: Option<Arc<Pdfium>>,
    pub libre: LibreSettings,
}

#[async_trait::async_trait]
impl IDocumentRenderer for DocumentRenderer {
    async fn render(&self, source: &Path, temp_files: &mut TempFiles) -> Result<PathBuf, ConversionError> {
        let pdf = if is_pdf(source) {
            source.to_path_buf()
        } else {
            let pdf = self.load_from_libre(source, temp_files).await?;
            info!("Converted {} from libre", source.display());
            pdf
        };
        let output = temp_files.get_path("png").await.map_err(ConversionError)?;
        temp_files.track(output.clone());
        let pdfium = self.pdfium.clone();
        let page_output = output.clone();
        tokio::task::spawn_blocking(move || render_first_page(pdfium.as_deref(), &pdf, &page_output))
            .await
            .map_err(|_| ConversionError("render worker panicked"))??;
        Ok(output)
    }
}

/// Runs on a blocking thread; pdfium calls are synchronous.
fn render_first_page(pdfium: Option<&Pdfium>, pdf: &Path, output: &Path) -> Result<(), ConversionError> {
    let pdfium = pdfium.ok_or(ConversionError("pdfium is not available"))?;
    let document = pdfium.load_pdf_from_file(pdf, None).map_err(|_| ConversionError("could not open document"))?;
    let page = document.pages().get(0).map_err(|_| ConversionError("document has no pages"))?;
    let render_config = PdfRenderConfig::new().set_target_width(RENDER_WIDTH);
    page.render_with_config(&render_config)
        .map_err(|_| ConversionError("could not render to image"))?
        .as_image()
        .as_rgba8()
        .ok_or(ConversionError("could not render image"))?
        .save_with_format(output, ImageFormat::Png)
        .map_err(|_| ConversionError("could not save image"))?;
    debug!("Rendered first page of {} to {}", pdf.display(), output.display());
    Ok(())
}

impl DocumentRenderer {
    async fn load_from_libre(&self, source: &Path, temp_files: &mut TempFiles) -> Result<PathBuf, ConversionError> {
        if !self.libre.executable.exists() {
            return Err(ConversionError("libreoffice is not installed"));
        }
        let output_directory = temp_files.get_path("").await.map_err(ConversionError)?;
        tokio::fs::create_dir_all(&output_directory).await.map_err(|_| ConversionError("could not create output directory"))?;
        let file_name = source.file_name().ok_or(ConversionError("source has no file name"))?;
        let result_path = output_directory.join(file_name).with_extension("pdf");
        temp_files.track(result_path.clone());

        let mut child = Command::new(&self.libre.executable)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg(source.as_os_str())
            .arg("--outdir")
            .arg(output_directory.as_os_str())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|_| ConversionError("could not start libre"))?;

        let status = match tokio::time::timeout(self.libre.timeout, child.wait()).await {
            Ok(status) => status.map_err(|_| ConversionError("could not wait on libre"))?,
            Err(_) => {
                child.kill().await.map_err(|_| ConversionError("could not kill libre"))?;
                return Err(ConversionError("libre timed out"));
            }
        };
        match status.code() {
            Some(0) if result_path.is_file() => Ok(result_path),
            Some(0) => Err(ConversionError("libre produced no output")),
            code => {
                info!("Libre failed with '{:?}'", code);
                Err(ConversionError("libre conversion failed"))
            }
        }
    }
}
