use std::path::Path;

use walkdir::WalkDir;

use gatekeeper_core::types::IngestRequest;
use gatekeeper_extract::ExtractorRegistry;

/// Turn one `--remember` value into ingestion requests.
///
/// - an existing directory: one `file` request per supported file inside it
/// - a path whose extension has a registered strategy: a `file` request
/// - anything else: a `text` request carrying the value itself
pub fn plan(value: &str, registry: &ExtractorRegistry) -> Vec<IngestRequest> {
    let path = Path::new(value);
    if path.is_dir() {
        let mut files: Vec<_> = WalkDir::new(path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && registry.supports(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        files.sort();
        return files.into_iter().map(IngestRequest::file).collect();
    }
    if !value.contains('\n') && registry.supports(path) {
        return vec![IngestRequest::file(path)];
    }
    vec![IngestRequest::text(value)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn known_extension_is_a_file_and_anything_else_is_text() {
        let registry = ExtractorRegistry::with_defaults();
        assert_eq!(plan("notes/ideas.MD", &registry), vec![IngestRequest::file("notes/ideas.MD")]);
        assert_eq!(plan("I like hiking.", &registry), vec![IngestRequest::text("I like hiking.")]);
        assert_eq!(plan("setup.exe", &registry), vec![IngestRequest::text("setup.exe")]);
    }

    #[test]
    fn directories_expand_to_supported_files() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir(dir.path().join("sub")).expect("mkdir");
        std::fs::write(dir.path().join("b.md"), "# B").expect("write");
        std::fs::write(dir.path().join("sub/a.pdf"), "x").expect("write");
        std::fs::write(dir.path().join("skip.bin"), "x").expect("write");

        let requests = plan(&dir.path().to_string_lossy(), &ExtractorRegistry::with_defaults());
        assert_eq!(
            requests,
            vec![IngestRequest::file(dir.path().join("b.md")), IngestRequest::file(dir.path().join("sub/a.pdf"))]
        );
    }
}
