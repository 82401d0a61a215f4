//! Text and PDF content extraction.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use super::strategy::SamplingPlan;
use crate::constants::extraction::{LARGE_PDF_WARN_BYTES, PDF_EXTENSIONS, TEXT_EXTENSIONS};
use crate::types::{ExtractionErrorKind, FilerError, Result};

/// Page separator in plain-text exports
const FORM_FEED: char = '\u{0c}';

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if PDF_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Pdf)
        } else if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Text)
        } else {
            None
        }
    }

    pub fn is_supported(path: &Path) -> bool {
        Self::from_path(path).is_some()
    }
}

/// Size and shape of a document, gathered before sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentProbe {
    pub size_bytes: u64,
    /// `None` for formats without pages
    pub page_count: Option<usize>,
    pub format: DocumentFormat,
}

#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub text: String,
    pub plan: SamplingPlan,
    pub pages_read: usize,
    /// True when the character budget cut the text short
    pub truncated: bool,
}

/// Extraction collaborator
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<DocumentProbe>;

    async fn extract(&self, path: &Path, plan: SamplingPlan) -> Result<ExtractedContent>;
}

pub type SharedExtractor = Arc<dyn ContentExtractor>;

/// Filesystem-backed extractor: plain text is read directly, PDFs are
/// parsed with `lopdf` (page count) and `pdf-extract` (text layer).
#[derive(Debug, Default, Clone, Copy)]
pub struct FileExtractor;

impl FileExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn shared() -> SharedExtractor {
        Arc::new(Self)
    }
}

#[async_trait]
impl ContentExtractor for FileExtractor {
    async fn probe(&self, path: &Path) -> Result<DocumentProbe> {
        let owned = path.to_path_buf();
        run_blocking(path, move || probe_sync(&owned)).await
    }

    async fn extract(&self, path: &Path, plan: SamplingPlan) -> Result<ExtractedContent> {
        let owned = path.to_path_buf();
        run_blocking(path, move || extract_sync(&owned, plan)).await
    }
}

async fn run_blocking<T, F>(path: &Path, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        FilerError::extraction(
            path.display().to_string(),
            ExtractionErrorKind::UnreadableFile,
            format!("extraction task failed: {}", e),
        )
    })?
}

// =============================================================================
// Blocking Implementation
// =============================================================================

fn format_of(path: &Path) -> Result<DocumentFormat> {
    DocumentFormat::from_path(path).ok_or_else(|| {
        FilerError::extraction(
            path.display().to_string(),
            ExtractionErrorKind::UnsupportedFormat,
            format!(
                "extension '{}' is not supported",
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default()
            ),
        )
    })
}

fn unreadable(path: &Path, message: impl Into<String>) -> FilerError {
    FilerError::extraction(
        path.display().to_string(),
        ExtractionErrorKind::UnreadableFile,
        message,
    )
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| unreadable(path, e.to_string()))
}

fn probe_sync(path: &Path) -> Result<DocumentProbe> {
    let format = format_of(path)?;
    let metadata = std::fs::metadata(path).map_err(|e| unreadable(path, e.to_string()))?;
    if !metadata.is_file() {
        return Err(unreadable(path, "not a regular file"));
    }
    let size_bytes = metadata.len();

    let page_count = match format {
        DocumentFormat::Text => None,
        DocumentFormat::Pdf => {
            if size_bytes > LARGE_PDF_WARN_BYTES {
                warn!(
                    "Large PDF ({} MiB), parsing may be slow: {}",
                    size_bytes / (1024 * 1024),
                    path.display()
                );
            }
            let bytes = read_bytes(path)?;
            let document = lopdf::Document::load_mem(&bytes)
                .map_err(|e| unreadable(path, format!("invalid PDF: {}", e)))?;
            Some(document.get_pages().len())
        }
    };

    debug!(
        "Probed {}: {} bytes, {:?} pages",
        path.display(),
        size_bytes,
        page_count
    );

    Ok(DocumentProbe {
        size_bytes,
        page_count,
        format,
    })
}

fn extract_sync(path: &Path, plan: SamplingPlan) -> Result<ExtractedContent> {
    let bytes = read_bytes(path)?;

    let pages: Vec<String> = match format_of(path)? {
        DocumentFormat::Text => String::from_utf8_lossy(&bytes)
            .split(FORM_FEED)
            .map(str::to_string)
            .collect(),
        DocumentFormat::Pdf => pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| unreadable(path, format!("PDF text extraction failed: {}", e)))?,
    };

    let content = sample_pages(&pages, plan);
    if content.text.trim().is_empty() {
        return Err(unreadable(path, "document has no extractable text"));
    }

    debug!(
        "Extracted {} chars from {} of {} pages ({})",
        content.text.chars().count(),
        content.pages_read,
        pages.len(),
        plan
    );
    Ok(content)
}

/// Assemble the sampled pages into one string, honouring the plan's
/// character budget. Multi-page output labels each page.
pub(crate) fn sample_pages(pages: &[String], plan: SamplingPlan) -> ExtractedContent {
    let indices = plan.page_indices(pages.len());
    let labelled = pages.len() > 1;
    let budget = plan.char_budget();

    let mut text = String::new();
    let mut used = 0usize;
    let mut pages_read = 0usize;
    let mut truncated = false;

    for index in indices {
        let page = pages[index].trim();
        let chunk = if labelled {
            format!("[Page {}]\n{}\n\n", index + 1, page)
        } else {
            page.to_string()
        };
        let chunk_chars = chunk.chars().count();

        if let Some(max) = budget
            && used + chunk_chars > max
        {
            // Whole pages only, unless nothing has been read yet
            if pages_read == 0 {
                text.extend(chunk.chars().take(max));
                pages_read = 1;
            }
            truncated = true;
            break;
        }

        text.push_str(&chunk);
        used += chunk_chars;
        pages_read += 1;
    }

    ExtractedContent {
        text: text.trim_end().to_string(),
        plan,
        pages_read,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pages(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("content of page {}", i)).collect()
    }

    /// Multi-page PDF with one line of text per page
    fn make_test_pdf(texts: &[&str]) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::new();
        for text in texts {
            let content = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", text);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/Statement.PDF")),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("notes.md")),
            Some(DocumentFormat::Text)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("photo.jpg")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_sample_sparse_pages() {
        let content = sample_pages(&pages(10), SamplingPlan::Sparse { first: 2 });
        assert_eq!(content.pages_read, 4);
        assert!(content.text.contains("[Page 1]"));
        assert!(content.text.contains("[Page 6]"));
        assert!(content.text.contains("[Page 10]"));
        assert!(!content.text.contains("[Page 3]"));
        assert!(!content.truncated);
    }

    #[test]
    fn test_char_limit_respects_page_boundaries() {
        let content = sample_pages(&pages(5), SamplingPlan::CharLimit { max_chars: 60 });
        assert!(content.truncated);
        assert!(content.text.chars().count() <= 60);
        assert!(content.text.ends_with("content of page 2"));
    }

    #[test]
    fn test_char_limit_truncates_single_oversized_page() {
        let long = vec!["x".repeat(500)];
        let content = sample_pages(&long, SamplingPlan::CharLimit { max_chars: 100 });
        assert_eq!(content.text.len(), 100);
        assert_eq!(content.pages_read, 1);
        assert!(content.truncated);
    }

    #[tokio::test]
    async fn test_text_file_extraction() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("note.txt");
        std::fs::write(&path, "Chase Bank statement\nPeriod ending 2025-01-31").unwrap();

        let extractor = FileExtractor::new();
        let probe = extractor.probe(&path).await.unwrap();
        assert_eq!(probe.format, DocumentFormat::Text);
        assert_eq!(probe.page_count, None);

        let content = extractor.extract(&path, SamplingPlan::Full).await.unwrap();
        assert!(content.text.starts_with("Chase Bank statement"));
        assert!(!content.text.contains("[Page"));
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        std::fs::write(&path, [0xff, 0xd8, 0xff]).unwrap();

        let err = FileExtractor::new().probe(&path).await.unwrap_err();
        assert!(matches!(
            err,
            FilerError::Extraction {
                kind: ExtractionErrorKind::UnsupportedFormat,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_and_empty_files_are_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.txt");
        let err = FileExtractor::new().probe(&missing).await.unwrap_err();
        assert!(matches!(
            err,
            FilerError::Extraction {
                kind: ExtractionErrorKind::UnreadableFile,
                ..
            }
        ));

        let empty = temp_dir.path().join("empty.txt");
        std::fs::write(&empty, "   \n").unwrap();
        let err = FileExtractor::new()
            .extract(&empty, SamplingPlan::Full)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no extractable text"));
    }

    #[tokio::test]
    async fn test_pdf_probe_and_extract() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("statement.pdf");
        std::fs::write(&path, make_test_pdf(&["First page", "Second page", "Third page"])).unwrap();

        let extractor = FileExtractor::new();
        let probe = extractor.probe(&path).await.unwrap();
        assert_eq!(probe.format, DocumentFormat::Pdf);
        assert_eq!(probe.page_count, Some(3));

        let content = extractor
            .extract(
                &path,
                SamplingPlan::FirstNPages {
                    n: 1,
                    include_last: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(content.pages_read, 2);
        assert!(content.text.contains("[Page 1]"));
        assert!(content.text.contains("[Page 3]"));
        assert!(!content.text.contains("[Page 2]"));
    }

    #[tokio::test]
    async fn test_invalid_pdf() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();
        assert!(FileExtractor::new().probe(&path).await.is_err());
    }
}
