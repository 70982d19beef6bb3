//! Source document loading.
//!
//! Loaders supply raw text to the segmenter. Two shapes are supported: a
//! plain-text file read whole, and page-scoped text where a PDF-to-text
//! collaborator has already extracted pages separated by form feeds. Binary
//! PDF decoding itself is out of scope; this module only shapes the text.

use std::fs;
use std::path::Path;

use crate::core::errors::PipelineError;

/// Raw text for one source, optionally page-scoped.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Identifier attached to every chunk from this source (the file stem).
    pub source_id: String,
    pub text: String,
    /// Page texts when the source was page-scoped, in page order.
    pub pages: Option<Vec<String>>,
}

pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<SourceDocument, PipelineError>;
}

/// Reads a UTF-8 text file as a single block.
pub struct PlainTextLoader;

impl DocumentLoader for PlainTextLoader {
    fn load(&self, path: &Path) -> Result<SourceDocument, PipelineError> {
        let text = read_file(path)?;
        Ok(SourceDocument {
            source_id: source_id_for(path),
            text,
            pages: None,
        })
    }
}

/// Reads extracted PDF text and splits it into page blocks on form-feed
/// boundaries, the separator `pdftotext`-style extractors emit.
pub struct PageTextLoader;

impl DocumentLoader for PageTextLoader {
    fn load(&self, path: &Path) -> Result<SourceDocument, PipelineError> {
        let text = read_file(path)?;
        let pages: Vec<String> = text
            .split('\u{c}')
            .map(|page| page.trim().to_string())
            .filter(|page| !page.is_empty())
            .collect();

        Ok(SourceDocument {
            source_id: source_id_for(path),
            text: pages.join("\n\n"),
            pages: Some(pages),
        })
    }
}

/// Pick a loader from the file extension. Extracted-PDF text conventionally
/// keeps a `.pdf.txt` suffix; everything else is plain text.
pub fn loader_for(path: &Path) -> Box<dyn DocumentLoader> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if name.ends_with(".pdf.txt") || name.ends_with(".pages.txt") {
        Box::new(PageTextLoader)
    } else {
        Box::new(PlainTextLoader)
    }
}

fn read_file(path: &Path) -> Result<String, PipelineError> {
    fs::read_to_string(path).map_err(|e| {
        PipelineError::Configuration(format!("failed to read {}: {}", path.display(), e))
    })
}

fn source_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn plain_text_loads_whole_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "one\n\ntwo").expect("write");

        let doc = PlainTextLoader.load(file.path()).expect("load");
        assert_eq!(doc.text, "one\n\ntwo");
        assert!(doc.pages.is_none());
    }

    #[test]
    fn page_text_splits_on_form_feed() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "page one\u{c}page two\u{c}\u{c}page three").expect("write");

        let doc = PageTextLoader.load(file.path()).expect("load");
        let pages = doc.pages.expect("pages");
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0], "page one");
        assert!(doc.text.contains("page two"));
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let err = PlainTextLoader
            .load(Path::new("/nonexistent/docqa-input.txt"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
