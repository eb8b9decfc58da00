//! Reading text and document properties out of a PDF with lopdf.

use lopdf::{Dictionary, Document, Object};
use std::path::Path;

use super::ExtractError;
use super::record::DocumentInfo;

/// Raw contents of one PDF, before normalisation into a record.
#[derive(Debug, Clone, Default)]
pub struct PdfContents {
    /// Number of pages in the page tree.
    pub page_count: u32,

    /// Extracted text for every page, in page order (blank pages included).
    pub page_texts: Vec<String>,

    /// Info dictionary properties.
    pub info: DocumentInfo,
}

/// Load a PDF and pull out per-page text plus its Info dictionary.
///
/// The document is dropped before returning, so no handle outlives the call.
pub fn load_pdf(path: &Path) -> Result<PdfContents, ExtractError> {
    let doc = Document::load(path).map_err(|e| ExtractError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if doc.is_encrypted() {
        return Err(ExtractError::Encrypted(path.to_path_buf()));
    }

    let pages = doc.get_pages();
    let page_count = pages.len() as u32;
    let mut page_texts = Vec::with_capacity(pages.len());

    for &page_number in pages.keys() {
        let text = match doc.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    target: "extract",
                    "page {page_number} of {} has no decodable text: {e}",
                    path.display()
                );
                String::new()
            }
        };
        page_texts.push(text);
    }

    Ok(PdfContents {
        page_count,
        page_texts,
        info: read_info(&doc),
    })
}

/// Read Title/Author/Subject, defaulting each to an empty string.
fn read_info(doc: &Document) -> DocumentInfo {
    let Some(dict) = info_dictionary(doc) else {
        return DocumentInfo::default();
    };

    DocumentInfo {
        title: text_entry(dict, b"Title"),
        author: text_entry(dict, b"Author"),
        subject: text_entry(dict, b"Subject"),
    }
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    let info = doc.trailer.get(b"Info").ok()?;
    match info {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn text_entry(dict: &Dictionary, key: &[u8]) -> String {
    dict.get(key)
        .ok()
        .and_then(|value| value.as_str().ok())
        .map(decode_text_string)
        .unwrap_or_default()
}

/// Decode a PDF text string.
///
/// UTF-16BE when prefixed with the `FE FF` byte order mark, otherwise
/// PDFDocEncoding, which agrees with Latin-1 for printable characters.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_latin1_text_string() {
        assert_eq!(decode_text_string(b"Splicing"), "Splicing");
        assert_eq!(decode_text_string(&[0x53, 0xE9]), "Sé");
    }

    #[test]
    fn test_decode_utf16_text_string() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "RNA ß".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_text_string(&bytes), "RNA ß");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = load_pdf(Path::new("/nonexistent/paper.pdf"));
        assert!(matches!(result, Err(ExtractError::Load { .. })));
    }
}
