use gatekeeper_core::{Error, Result};

use crate::TextExtractor;

/// Text layer of a PDF; layout and formatting are dropped.
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        // The decoder panics on some malformed cross-reference tables.
        let decoded = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
            .map_err(|_| Error::Extraction("PDF decoder aborted on malformed input".into()))?;
        decoded.map_err(|e| Error::Extraction(format!("PDF decoding failed: {}", e)))
    }
}
