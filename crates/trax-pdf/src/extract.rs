//! Text extraction backed by `pdf-extract`, metadata by `lopdf`.

use std::path::Path;

use tracing::{debug, warn};

use crate::metadata::read_creation_date;
use crate::{PdfError, TextSource};

/// The production [`TextSource`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextSource;

impl TextSource for PdfTextSource {
    fn extract_text(&self, path: &Path) -> Result<String, PdfError> {
        let bytes = std::fs::read(path).map_err(|source| PdfError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        // pdf-extract panics on some malformed documents; one bad file must
        // not take down the batch.
        let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
            .map_err(|_| PdfError::Extract {
                path: path.to_path_buf(),
                message: "extractor panicked on malformed document".to_string(),
            })?
            .map_err(|e| PdfError::Extract {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        debug!(path = %path.display(), chars = text.len(), "extracted PDF text");
        Ok(text)
    }

    fn creation_date(&self, path: &Path) -> Option<String> {
        match read_creation_date(path) {
            Ok(date) => date,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read PDF metadata");
                None
            }
        }
    }
}
