use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Turns raw document bytes into plain text. Empty text is a valid outcome;
/// the caller decides what to do with it.
///
/// Implementations are CPU-bound and synchronous; async callers run them
/// through `tokio::task::spawn_blocking`.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Text layer of a PDF via `pdf-extract`. Scanned PDFs without a text layer
/// come back empty.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        // pdf-extract panics on some malformed files instead of returning an error.
        match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
            Ok(result) => result.map_err(|e| ExtractionError::Pdf(e.to_string())),
            Err(_) => Err(ExtractionError::Pdf("parser panicked".to_string())),
        }
    }
}
