//! Résumé text extraction.
//!
//! Uploads arrive as PDF or plain text. PDFs go through `pdf_extract`;
//! anything else is read as UTF-8. Downstream code only ever sees the
//! extracted text, never the file format.

use tracing::debug;

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF";

/// True when any of the upload's signals say PDF: declared content type,
/// file extension, or the file's own magic bytes.
fn looks_like_pdf(bytes: &[u8], content_type: Option<&str>, file_name: Option<&str>) -> bool {
    content_type.map_or(false, |ct| ct.contains("pdf"))
        || file_name.map_or(false, |name| name.to_ascii_lowercase().ends_with(".pdf"))
        || bytes.starts_with(PDF_MAGIC)
}

/// Extracts plain text from an uploaded résumé file.
pub fn extract_resume_text(
    bytes: &[u8],
    content_type: Option<&str>,
    file_name: Option<&str>,
) -> Result<String, AppError> {
    let text = if looks_like_pdf(bytes, content_type, file_name) {
        debug!("Extracting resume text from a {}-byte PDF", bytes.len());
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            AppError::Validation(format!("Could not extract text from the PDF: {e}"))
        })?
    } else {
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            AppError::Validation("Resume file is neither a PDF nor valid UTF-8 text".to_string())
        })?
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::Validation(
            "Resume file contained no extractable text".to_string(),
        ));
    }

    Ok(text)
}
