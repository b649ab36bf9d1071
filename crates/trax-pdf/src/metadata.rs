//! `CreationDate` lookup in the document information dictionary.

use std::path::Path;

use lopdf::{Dictionary, Document, Object};

use crate::PdfError;

/// Read the raw `CreationDate` string from the PDF's `Info` dictionary.
///
/// Returns `Ok(None)` when the document has no `Info` dictionary or no
/// `CreationDate` entry.
pub fn read_creation_date(path: &Path) -> Result<Option<String>, PdfError> {
    let doc = Document::load(path)?;
    Ok(info_dictionary(&doc)
        .and_then(|info| info.get(b"CreationDate").ok())
        .and_then(pdf_text))
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with a byte-order mark, otherwise
/// treated as single-byte text.
fn pdf_text(object: &Object) -> Option<String> {
    let Object::String(bytes, _) = object else {
        return None;
    };
    if let Some(body) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units).ok();
    }
    Some(bytes.iter().map(|&b| char::from(b)).collect())
}
