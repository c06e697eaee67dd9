//! Plain-text extraction from uploaded resume files.

use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// True for `application/pdf`, ignoring case and any media-type parameters.
pub fn is_pdf(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .eq_ignore_ascii_case(PDF_CONTENT_TYPE)
}

/// Returns the text of an uploaded resume.
///
/// PDFs are read page by page on a blocking thread; any other declared type is
/// decoded as UTF-8 with invalid sequences replaced, which cannot fail.
pub async fn extract_text(bytes: Bytes, content_type: &str) -> Result<String, AppError> {
    if !is_pdf(content_type) {
        let text = decode_text(&bytes);
        info!("Decoded {} characters from text resume", text.chars().count());
        return Ok(text);
    }

    let pages = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
    })
    .await
    // the parser panics on some malformed files
    .map_err(|e| AppError::Content(format!("Failed to extract text from PDF: {e}")))?
    .map_err(|e| AppError::Content(format!("Failed to extract text from PDF: {e}")))?;

    let page_count = pages.len();
    let text = join_pages(pages);
    info!(
        "Extracted {} characters from {page_count} PDF pages",
        text.chars().count()
    );
    Ok(text)
}

pub fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Joins page texts in order with a single newline, dropping pages with no text.
/// Text inside a kept page is passed through untouched.
fn join_pages(pages: Vec<String>) -> String {
    pages
        .into_iter()
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
