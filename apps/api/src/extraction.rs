//! Text extraction from uploaded resumes. Only PDF and DOCX are accepted.

use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type! Only PDF or DOCX allowed.")]
    UnsupportedFileType,

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to extract text from PDF: {0}")]
    Pdf(String),

    #[error("Failed to read DOCX: {0}")]
    Docx(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Case-insensitive extension lookup.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("pdf") => Ok(DocumentKind::Pdf),
            Some("docx") => Ok(DocumentKind::Docx),
            _ => Err(ExtractError::UnsupportedFileType),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
        }
    }
}

/// Extracts plain text from a PDF or DOCX file. Blocking; call from
/// `spawn_blocking` inside async handlers.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    match DocumentKind::from_path(path)? {
        DocumentKind::Pdf => {
            pdf_extract::extract_text(path).map_err(|e| ExtractError::Pdf(e.to_string()))
        }
        DocumentKind::Docx => extract_docx(path),
    }
}

static PARAGRAPH_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</w:p>|<w:br\s*/>|<w:cr\s*/>").expect("paragraph pattern is valid"));
static TAB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:tab\s*/>").expect("tab pattern is valid"));
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut xml = String::new();
    document.read_to_string(&mut xml)?;
    Ok(document_xml_to_text(&xml))
}

/// Flattens WordprocessingML into text: paragraph ends and breaks become
/// newlines, tabs become tabs, everything else tagged is dropped.
fn document_xml_to_text(xml: &str) -> String {
    let text = PARAGRAPH_END.replace_all(xml, "\n");
    let text = TAB.replace_all(&text, "\t");
    let text = TAG.replace_all(&text, "");

    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");

    text.trim().to_string()
}

/// A minimal DOCX container holding one paragraph per entry.
#[cfg(test)]
pub(crate) fn docx_fixture(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;

    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!("<w:document><w:body>{body}</w:body></w:document>");

    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .expect("start docx entry");
    zip.write_all(xml.as_bytes()).expect("write docx entry");
    zip.finish().expect("finish docx").into_inner()
}
