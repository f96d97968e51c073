#[cfg(feature = "pdf")]
mod pdf;
mod text;

use std::path::Path;

#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;
pub use text::TextLoader;

use super::{DocumentError, DocumentLoader};

/// Pick a loader for `path` by its extension.
///
/// # Errors
///
/// Returns [`DocumentError::UnsupportedFormat`] when no loader handles the extension
/// (including `.pdf` when the `pdf` feature is disabled).
pub fn loader_for_path(
    path: &Path,
    max_file_size: u64,
) -> Result<Box<dyn DocumentLoader>, DocumentError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let text = TextLoader { max_file_size };
    if text.supported_extensions().contains(&ext.as_str()) {
        return Ok(Box::new(text));
    }

    #[cfg(feature = "pdf")]
    {
        let pdf = PdfLoader { max_file_size };
        if pdf.supported_extensions().contains(&ext.as_str()) {
            return Ok(Box::new(pdf));
        }
    }

    Err(DocumentError::UnsupportedFormat(if ext.is_empty() {
        path.display().to_string()
    } else {
        ext
    }))
}
