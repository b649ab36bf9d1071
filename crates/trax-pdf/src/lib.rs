//! PDF collaborators: text extraction, creation-date metadata, and the
//! file-aware entry point to document date resolution.

mod error;
mod extract;
mod metadata;

pub use error::PdfError;
pub use extract::PdfTextSource;
pub use metadata::read_creation_date;

use std::path::Path;

use tracing::debug;
use trax_core::DocumentDate;
use trax_core::date::{DateSource, resolve_with_source};

/// Anything that can turn a report file into text and creation metadata.
///
/// The batch pipeline only sees this trait, so it can run against stubs.
pub trait TextSource {
    /// Full text of the document, page by page.
    fn extract_text(&self, path: &Path) -> Result<String, PdfError>;

    /// Raw `CreationDate` metadata string, if the document carries one.
    fn creation_date(&self, path: &Path) -> Option<String>;
}

/// Resolve the test date of a report: metadata, then text, then the file's
/// modification time, then today.
pub fn resolve_date(source: &impl TextSource, path: &Path, text: &str) -> DocumentDate {
    let creation = source.creation_date(path);
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();
    let (date, from) = resolve_with_source(creation.as_deref(), text, modified);
    if from == DateSource::Today {
        debug!(path = %path.display(), "no date evidence, using today");
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct FixedSource(Option<&'static str>);

    impl TextSource for FixedSource {
        fn extract_text(&self, _path: &Path) -> Result<String, PdfError> {
            Ok(String::new())
        }

        fn creation_date(&self, _path: &Path) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[test]
    fn metadata_date_preferred() {
        let source = FixedSource(Some("D:20210405120000Z"));
        let date = resolve_date(&source, Path::new("/nonexistent.pdf"), "Date: 01/02/2020");
        assert_eq!(date.to_string(), "2021-04-05");
    }

    #[test]
    fn text_date_when_metadata_missing() {
        let source = FixedSource(None);
        let date = resolve_date(&source, Path::new("/nonexistent.pdf"), "Date: 01/02/2020");
        assert_eq!(date.to_string(), "2020-01-02");
    }

    #[test]
    fn modified_time_when_no_other_evidence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a pdf").unwrap();
        let source = FixedSource(None);
        let date = resolve_date(&source, file.path(), "no dates");
        // Freshly written, so its mtime is today.
        assert_eq!(date, DocumentDate::today());
    }
}
