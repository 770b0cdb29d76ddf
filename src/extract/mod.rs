//! Plain-text extraction from stored document files
//!
//! Uploads arrive as files on disk; indexing and reindexing need their text.
//! Markdown and anything with a `text/*` MIME type is read as-is. PDF
//! support is feature-gated behind `pdf`.

use crate::error::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Extract plain text from a stored file
pub fn extract_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::Extraction(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "md" | "markdown" => read_text(path),
        "pdf" => extract_pdf(path),
        "docx" | "doc" => Err(Error::UnsupportedFormat(format!(
            "{}: Word documents are not supported; convert to text or PDF",
            path.display()
        ))),
        _ => {
            // Unknown extension: accept anything that sniffs as text
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            if mime.type_() == mime_guess::mime::TEXT {
                read_text(path)
            } else {
                Err(Error::UnsupportedFormat(format!(
                    "{}: unsupported content type {}",
                    path.display(),
                    mime
                )))
            }
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    debug!("Reading text file: {}", path.display());
    let bytes = std::fs::read(path)
        .map_err(|e| Error::Extraction(format!("{}: {}", path.display(), e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path) -> Result<String> {
    debug!("Extracting PDF: {}", path.display());
    pdf_extract::extract_text(path)
        .map_err(|e| Error::Extraction(format!("{}: {}", path.display(), e)))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(path: &Path) -> Result<String> {
    Err(Error::UnsupportedFormat(format!(
        "{}: PDF support requires the 'pdf' feature",
        path.display()
    )))
}
