use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use common::{
    models::{DocumentModel, Queue, TaskMessage, CREATE_DOCUMENT_THUMBNAIL},
    persistence::{tempfiles::TempFiles, IFileStorage, ThumbnailPersistence},
    tasks::{ITask, WorkError},
    util::consts::COPY_CHUNK_SIZE,
};
use tokio::{
    fs,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, error, info, warn};

use crate::{
    render::IDocumentRenderer,
    thumbnail::{IThumbnailRenderer, ThumbnailError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    Saved { file_name: String, size: usize },
    DocumentMissing,
    FileUnresolvable,
    NoPlaceholder,
    MissingRenderer,
}

pub struct ThumbnailSettings {
    pub media_root: PathBuf,
    pub placeholder_dir: PathBuf,
    pub temp_dir: PathBuf,
}

pub struct ThumbnailTask {
    pub thumbnails: ThumbnailPersistence,
    pub renderer: Arc<dyn IDocumentRenderer>,
    pub thumbnailer: Arc<dyn IThumbnailRenderer>,
    pub settings: ThumbnailSettings,
}

#[async_trait::async_trait]
impl ITask for ThumbnailTask {
    fn name(&self) -> &'static str {
        CREATE_DOCUMENT_THUMBNAIL
    }

    fn queue(&self) -> Queue {
        Queue::Update
    }

    #[tracing::instrument(skip(self))]
    async fn work(&self, message: &TaskMessage) -> Result<(), WorkError> {
        let object_id = message.object_id.ok_or_else(|| {
            error!("Thumbnail task without document id");
            WorkError::NoRetry
        })?;
        match self.create_document_thumbnail(object_id).await {
            Ok(outcome) => {
                info!("Thumbnail for document #{} finished with {:?}", object_id, outcome);
                Ok(())
            }
            Err(err) => {
                error!("Thumbnail for document #{} failed: {}", object_id, err);
                Err(WorkError::Retry)
            }
        }
    }
}

impl ThumbnailTask {
    /// Every early return drops `temp_files`, which removes whatever this run
    /// downloaded or converted.
    pub async fn create_document_thumbnail(&self, object_id: u64) -> Result<ThumbnailOutcome, &'static str> {
        debug!("Generating thumbnail for document #{}.", object_id);

        let Some(mut document) = self.thumbnails.documents.get(object_id).await? else {
            error!("Document #{} does not exist.", object_id);
            return Ok(ThumbnailOutcome::DocumentMissing);
        };

        let mut temp_files = TempFiles::new(&self.settings.temp_dir, &object_id.to_string());

        let document_path = match document.doc_file.as_deref().filter(|doc_file| !doc_file.is_empty()) {
            Some(doc_file) => match self.resolve_document_path(doc_file, &mut temp_files).await? {
                Some(document_path) => Some(document_path),
                None => {
                    error!("Document #{} exists but its path could not be resolved.", object_id);
                    return Ok(ThumbnailOutcome::FileUnresolvable);
                }
            },
            None => None,
        };

        let mut candidate = self.image_source(&document, document_path.as_deref(), &mut temp_files).await;
        if let Some(image_path) = &candidate {
            if !is_usable_image(image_path).await {
                candidate = None;
            }
        }

        let image_path = match candidate.or_else(|| document.find_placeholder(&self.settings.placeholder_dir)) {
            Some(image_path) => image_path,
            None => {
                debug!("Could not find placeholder for document #{}", object_id);
                return Ok(ThumbnailOutcome::NoPlaceholder);
            }
        };

        let content = match self.thumbnailer.generate(&image_path).await {
            Ok(content) => content,
            Err(ThumbnailError::MissingRenderer) => {
                error!("No decoder for {}, could not generate thumbnail.", image_path.display());
                return Ok(ThumbnailOutcome::MissingRenderer);
            }
            Err(ThumbnailError::Failed(err)) => return Err(err),
        };

        if content.is_empty() {
            warn!("Thumbnail for document #{} empty.", object_id);
        }
        let file_name = document.thumbnail_file_name();
        let size = content.len();
        self.thumbnails.save_thumbnail(&mut document, &file_name, content).await?;
        debug!("Thumbnail for document #{} created.", object_id);
        Ok(ThumbnailOutcome::Saved { file_name, size })
    }

    /// Local path of the document file, fetched from storage when only the
    /// storage has it. `None` when neither has it.
    async fn resolve_document_path(&self, doc_file: &str, temp_files: &mut TempFiles) -> Result<Option<PathBuf>, &'static str> {
        let relative = Path::new(doc_file);
        if relative.components().any(|component| !matches!(component, Component::Normal(_) | Component::CurDir)) {
            warn!("Refusing document path {}", doc_file);
            return Ok(None);
        }
        let document_path = self.settings.media_root.join(relative);
        match fs::try_exists(&document_path).await {
            Ok(true) => return Ok(Some(document_path)),
            Ok(false) => {}
            Err(err) => {
                warn!("Could not check {}: {}", document_path.display(), err);
                return Ok(None);
            }
        }
        if !self.thumbnails.storage.exists(doc_file).await? {
            return Ok(None);
        }
        if let Some(parent) = document_path.parent() {
            fs::create_dir_all(parent).await.map_err(|_| "could not create document directory")?;
        }
        temp_files.track(document_path.clone());
        let copied = copy_in_chunks(self.thumbnails.storage.as_ref(), doc_file, &document_path).await?;
        info!("Fetched {} ({} bytes) from storage", doc_file, copied);
        Ok(Some(document_path))
    }

    async fn image_source(&self, document: &DocumentModel, document_path: Option<&Path>, temp_files: &mut TempFiles) -> Option<PathBuf> {
        let document_path = document_path?;
        if document.is_image() {
            return Some(document_path.to_path_buf());
        }
        if !document.is_file() {
            return None;
        }
        match self.renderer.render(document_path, temp_files).await {
            Ok(image_path) => {
                temp_files.track(image_path.clone());
                Some(image_path)
            }
            Err(err) => {
                debug!("Could not convert document #{}: {}.", document.id, err);
                None
            }
        }
    }
}

pub async fn copy_in_chunks(storage: &dyn IFileStorage, name: &str, destination: &Path) -> Result<u64, &'static str> {
    let mut source = storage.open(name).await?;
    let mut file = fs::File::create(destination).await.map_err(|_| "could not create local copy")?;
    let mut buffer = [0u8; COPY_CHUNK_SIZE];
    let mut copied = 0u64;
    loop {
        let read = source.read(&mut buffer).await.map_err(|_| "could not read from storage")?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read]).await.map_err(|_| "could not write local copy")?;
        copied += read as u64;
    }
    file.flush().await.map_err(|_| "could not write local copy")?;
    Ok(copied)
}

async fn is_usable_image(path: &Path) -> bool {
    let non_empty_file = match fs::metadata(path).await {
        Ok(metadata) => metadata.is_file() && metadata.len() > 0,
        Err(_) => false,
    };
    non_empty_file && fs::File::open(path).await.is_ok()
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use common::persistence::memory::{InMemoryDocumentPersistence, InMemoryFileStorage};

    use super::*;
    use crate::render::ConversionError;

    const UUID: &str = "5f0c1a9e-42aa-4c1e-9a77-0c2b5d1e4242";

    enum RenderMode {
        Fails,
        Writes(PathBuf, usize),
    }

    struct FakeRenderer {
        mode: RenderMode,
        calls: AtomicUsize,
    }

    impl FakeRenderer {
        fn new(mode: RenderMode) -> Arc<Self> {
            Arc::new(FakeRenderer {
                mode,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl IDocumentRenderer for FakeRenderer {
        async fn render(&self, _source: &Path, _temp_files: &mut TempFiles) -> Result<PathBuf, ConversionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.mode {
                RenderMode::Fails => Err(ConversionError("libre conversion failed")),
                RenderMode::Writes(path, size) => {
                    std::fs::write(path, vec![7u8; *size]).unwrap();
                    Ok(path.clone())
                }
            }
        }
    }

    struct FakeThumbnailer {
        result: Result<Vec<u8>, ThumbnailError>,
        sources: Mutex<Vec<PathBuf>>,
    }

    impl FakeThumbnailer {
        fn new(result: Result<Vec<u8>, ThumbnailError>) -> Arc<Self> {
            Arc::new(FakeThumbnailer {
                result,
                sources: Mutex::new(vec![]),
            })
        }

        fn sources(&self) -> Vec<PathBuf> {
            self.sources.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl IThumbnailRenderer for FakeThumbnailer {
        async fn generate(&self, image_path: &Path) -> Result<Vec<u8>, ThumbnailError> {
            self.sources.lock().unwrap().push(image_path.to_path_buf());
            self.result.clone()
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        documents: Arc<InMemoryDocumentPersistence>,
        storage: Arc<InMemoryFileStorage>,
    }

    impl Fixture {
        fn new(doc_file: &str, remote: Vec<(&str, Vec<u8>)>) -> Self {
            let dir = tempfile::tempdir().unwrap();
            for sub in ["media", "placeholders", "tmp", "converted"] {
                std::fs::create_dir_all(dir.path().join(sub)).unwrap();
            }
            let document = DocumentModel {
                id: 42,
                uuid: UUID.to_string(),
                title: "Site plan".to_string(),
                doc_file: Some(doc_file.to_string()),
                extension: None,
                thumbnail: None,
            };
            Fixture {
                dir,
                documents: Arc::new(InMemoryDocumentPersistence::with(vec![document])),
                storage: Arc::new(InMemoryFileStorage::with(remote)),
            }
        }

        fn path(&self, relative: &str) -> PathBuf {
            self.dir.path().join(relative)
        }

        fn write_local(&self, doc_file: &str, content: &[u8]) -> PathBuf {
            let path = self.path("media").join(doc_file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
            path
        }

        fn write_placeholder(&self) -> PathBuf {
            let path = self.path("placeholders").join("generic-placeholder.png");
            std::fs::write(&path, b"placeholder").unwrap();
            path
        }

        fn task(&self, renderer: Arc<FakeRenderer>, thumbnailer: Arc<FakeThumbnailer>) -> ThumbnailTask {
            ThumbnailTask {
                thumbnails: ThumbnailPersistence {
                    documents: self.documents.clone(),
                    storage: self.storage.clone(),
                },
                renderer,
                thumbnailer,
                settings: ThumbnailSettings {
                    media_root: self.path("media"),
                    placeholder_dir: self.path("placeholders"),
                    temp_dir: self.path("tmp"),
                },
            }
        }

        fn saved_thumbnail(&self) -> Option<Vec<u8>> {
            self.storage.file(&format!("thumbs/document-{}-thumb.png", UUID))
        }

        fn temp_dir_is_empty(&self) -> bool {
            std::fs::read_dir(self.path("tmp")).unwrap().next().is_none()
        }
    }

    fn saved(size: usize) -> ThumbnailOutcome {
        ThumbnailOutcome::Saved {
            file_name: format!("document-{}-thumb.png", UUID),
            size,
        }
    }

    #[tokio::test]
    async fn image_documents_skip_the_renderer() {
        let fixture = Fixture::new("documents/plan.png", vec![]);
        let image = fixture.write_local("documents/plan.png", b"png bytes");
        let renderer = FakeRenderer::new(RenderMode::Fails);
        let thumbnailer = FakeThumbnailer::new(Ok(vec![1, 2, 3]));

        let outcome = fixture.task(renderer.clone(), thumbnailer.clone()).create_document_thumbnail(42).await.unwrap();

        assert_eq!(outcome, saved(3));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(thumbnailer.sources(), vec![image.clone()]);
        assert!(image.exists());
        assert_eq!(fixture.saved_thumbnail(), Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn failed_conversion_falls_back_to_placeholder() {
        let fixture = Fixture::new("documents/report.odt", vec![]);
        fixture.write_local("documents/report.odt", b"odt");
        let placeholder = fixture.write_placeholder();
        let thumbnailer = FakeThumbnailer::new(Ok(vec![5]));

        let outcome = fixture.task(FakeRenderer::new(RenderMode::Fails), thumbnailer.clone()).create_document_thumbnail(42).await.unwrap();

        assert_eq!(outcome, saved(1));
        assert_eq!(thumbnailer.sources(), vec![placeholder]);
    }

    #[tokio::test]
    async fn empty_conversion_output_falls_back_to_placeholder() {
        let fixture = Fixture::new("documents/report.odt", vec![]);
        fixture.write_local("documents/report.odt", b"odt");
        let placeholder = fixture.write_placeholder();
        let converted = fixture.path("converted/empty.png");
        let thumbnailer = FakeThumbnailer::new(Ok(vec![5]));

        fixture.task(FakeRenderer::new(RenderMode::Writes(converted.clone(), 0)), thumbnailer.clone()).create_document_thumbnail(42).await.unwrap();

        assert_eq!(thumbnailer.sources(), vec![placeholder]);
        assert!(!converted.exists());
    }

    #[tokio::test]
    async fn no_image_and_no_placeholder_saves_nothing() {
        let fixture = Fixture::new("documents/report.odt", vec![]);
        fixture.write_local("documents/report.odt", b"odt");
        let thumbnailer = FakeThumbnailer::new(Ok(vec![5]));

        let outcome = fixture.task(FakeRenderer::new(RenderMode::Fails), thumbnailer.clone()).create_document_thumbnail(42).await.unwrap();

        assert_eq!(outcome, ThumbnailOutcome::NoPlaceholder);
        assert!(thumbnailer.sources().is_empty());
        assert!(fixture.storage.names().is_empty());
        assert_eq!(fixture.documents.document(42).unwrap().thumbnail, None);
    }

    #[tokio::test]
    async fn missing_document_is_a_silent_no_op() {
        let fixture = Fixture::new("documents/report.odt", vec![]);
        let renderer = FakeRenderer::new(RenderMode::Fails);

        let outcome = fixture.task(renderer.clone(), FakeThumbnailer::new(Ok(vec![5]))).create_document_thumbnail(7).await.unwrap();

        assert_eq!(outcome, ThumbnailOutcome::DocumentMissing);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
        assert!(fixture.temp_dir_is_empty());
        assert!(std::fs::read_dir(fixture.path("media")).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn unresolvable_file_aborts() {
        let fixture = Fixture::new("documents/gone.pdf", vec![]);
        fixture.write_placeholder();
        let thumbnailer = FakeThumbnailer::new(Ok(vec![5]));

        let outcome = fixture.task(FakeRenderer::new(RenderMode::Fails), thumbnailer.clone()).create_document_thumbnail(42).await.unwrap();

        assert_eq!(outcome, ThumbnailOutcome::FileUnresolvable);
        assert!(thumbnailer.sources().is_empty());
        assert!(fixture.saved_thumbnail().is_none());
    }

    #[tokio::test]
    async fn unreadable_local_path_is_not_fetched_again() {
        let fixture = Fixture::new("documents/scan.png", vec![("documents/scan.png", b"remote".to_vec())]);
        fixture.write_placeholder();
        // a file where the documents directory should be makes the lookup fail
        let blocker = fixture.path("media/documents");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let thumbnailer = FakeThumbnailer::new(Ok(vec![5]));

        let outcome = fixture.task(FakeRenderer::new(RenderMode::Fails), thumbnailer.clone()).create_document_thumbnail(42).await.unwrap();

        assert_eq!(outcome, ThumbnailOutcome::FileUnresolvable);
        assert!(thumbnailer.sources().is_empty());
        assert_eq!(std::fs::read(&blocker).unwrap(), b"not a directory");
        assert!(fixture.saved_thumbnail().is_none());
    }

    #[tokio::test]
    async fn converted_document_is_saved_and_conversion_removed() {
        let fixture = Fixture::new("documents/report.odt", vec![]);
        fixture.write_local("documents/report.odt", b"odt");
        let converted = fixture.path("converted/x.png");
        let thumbnailer = FakeThumbnailer::new(Ok(vec![8; 64]));

        let outcome = fixture
            .task(FakeRenderer::new(RenderMode::Writes(converted.clone(), 10 * 1024)), thumbnailer.clone())
            .create_document_thumbnail(42)
            .await
            .unwrap();

        assert_eq!(outcome, saved(64));
        assert_eq!(thumbnailer.sources(), vec![converted.clone()]);
        assert!(!converted.exists());
        assert_eq!(fixture.saved_thumbnail(), Some(vec![8; 64]));
        assert_eq!(
            fixture.documents.document(42).unwrap().thumbnail,
            Some(format!("thumbs/document-{}-thumb.png", UUID))
        );
    }

    #[tokio::test]
    async fn remote_copy_is_fetched_in_chunks_and_removed() {
        let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let fixture = Fixture::new("documents/scan.png", vec![("documents/scan.png", content.clone())]);
        let local = fixture.path("media/documents/scan.png");
        let observed = Arc::new(Mutex::new(None));
        let thumbnailer = Arc::new(CopyObserver { observed: observed.clone() });

        let task = ThumbnailTask {
            thumbnailer,
            ..fixture.task(FakeRenderer::new(RenderMode::Fails), FakeThumbnailer::new(Ok(vec![])))
        };
        let outcome = task.create_document_thumbnail(42).await.unwrap();

        assert_eq!(outcome, saved(1));
        assert_eq!(observed.lock().unwrap().as_ref(), Some(&content));
        assert!(!local.exists());
    }

    struct CopyObserver {
        observed: Arc<Mutex<Option<Vec<u8>>>>,
    }

    #[async_trait::async_trait]
    impl IThumbnailRenderer for CopyObserver {
        async fn generate(&self, image_path: &Path) -> Result<Vec<u8>, ThumbnailError> {
            *self.observed.lock().unwrap() = Some(std::fs::read(image_path).unwrap());
            Ok(vec![1])
        }
    }

    #[tokio::test]
    async fn temp_files_are_removed_on_early_abort() {
        let fixture = Fixture::new("documents/report.odt", vec![("documents/report.odt", b"odt".to_vec())]);
        let local = fixture.path("media/documents/report.odt");

        let outcome = fixture
            .task(FakeRenderer::new(RenderMode::Fails), FakeThumbnailer::new(Ok(vec![5])))
            .create_document_thumbnail(42)
            .await
            .unwrap();

        assert_eq!(outcome, ThumbnailOutcome::NoPlaceholder);
        assert!(!local.exists());
        assert!(fixture.temp_dir_is_empty());
    }

    #[tokio::test]
    async fn temp_files_are_removed_when_thumbnailing_fails() {
        let fixture = Fixture::new("documents/report.odt", vec![("documents/report.odt", b"odt".to_vec())]);
        let local = fixture.path("media/documents/report.odt");
        let converted = fixture.path("converted/x.png");
        let thumbnailer = FakeThumbnailer::new(Err(ThumbnailError::Failed("could not decode image")));

        let result = fixture
            .task(FakeRenderer::new(RenderMode::Writes(converted.clone(), 128)), thumbnailer)
            .create_document_thumbnail(42)
            .await;

        assert_eq!(result, Err("could not decode image"));
        assert!(!local.exists());
        assert!(!converted.exists());
    }

    #[tokio::test]
    async fn missing_renderer_aborts_without_saving() {
        let fixture = Fixture::new("documents/plan.png", vec![]);
        fixture.write_local("documents/plan.png", b"png");

        let outcome = fixture
            .task(FakeRenderer::new(RenderMode::Fails), FakeThumbnailer::new(Err(ThumbnailError::MissingRenderer)))
            .create_document_thumbnail(42)
            .await
            .unwrap();

        assert_eq!(outcome, ThumbnailOutcome::MissingRenderer);
        assert!(fixture.saved_thumbnail().is_none());
    }

    #[tokio::test]
    async fn empty_thumbnail_is_still_saved() {
        let fixture = Fixture::new("documents/plan.png", vec![]);
        fixture.write_local("documents/plan.png", b"png");

        let outcome = fixture
            .task(FakeRenderer::new(RenderMode::Fails), FakeThumbnailer::new(Ok(vec![])))
            .create_document_thumbnail(42)
            .await
            .unwrap();

        assert_eq!(outcome, saved(0));
        assert_eq!(fixture.saved_thumbnail(), Some(vec![]));
    }

    #[tokio::test]
    async fn link_only_document_uses_placeholder() {
        let fixture = Fixture::new("", vec![]);
        let placeholder = fixture.write_placeholder();
        let renderer = FakeRenderer::new(RenderMode::Fails);
        let thumbnailer = FakeThumbnailer::new(Ok(vec![4]));

        let outcome = fixture.task(renderer.clone(), thumbnailer.clone()).create_document_thumbnail(42).await.unwrap();

        assert_eq!(outcome, saved(1));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(thumbnailer.sources(), vec![placeholder]);
    }

    #[tokio::test]
    async fn work_maps_outcomes_to_acknowledgements() {
        let fixture = Fixture::new("documents/plan.png", vec![]);
        fixture.write_local("documents/plan.png", b"png");
        let task = fixture.task(FakeRenderer::new(RenderMode::Fails), FakeThumbnailer::new(Err(ThumbnailError::Failed("boom"))));

        assert_eq!(task.work(&TaskMessage::default()).await, Err(WorkError::NoRetry));
        assert_eq!(task.work(&TaskMessage::for_object(7)).await, Ok(()));
        assert_eq!(task.work(&TaskMessage::for_object(42)).await, Err(WorkError::Retry));
    }
}
