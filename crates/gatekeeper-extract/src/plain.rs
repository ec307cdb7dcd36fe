use gatekeeper_core::Result;

use crate::TextExtractor;

/// UTF-8 text files; invalid sequences are replaced rather than rejected.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bom_and_tolerates_bad_utf8() {
        assert_eq!(PlainTextExtractor.extract(b"\xEF\xBB\xBFhello").expect("text"), "hello");
        assert_eq!(PlainTextExtractor.extract(b"caf\xE9").expect("text"), "caf\u{FFFD}");
    }
}
