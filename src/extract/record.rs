//! Document records produced by the extractor.
//!
//! One [`PaperRecord`] is written per source PDF as `<doc_id>.json` and is
//! never modified afterwards. The JSON layout is the contract between the
//! extractor and the store.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use super::ExtractError;

/// Number of hex characters kept from the filename hash.
pub const DOC_ID_LEN: usize = 12;

/// Separator placed between page texts in `full_text`.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Derive the stable identifier for a source file.
///
/// Only the filename participates, so two different files sharing a name
/// map to the same identifier.
pub fn derive_doc_id(filename: &str) -> String {
    let digest = Sha256::digest(filename.as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(DOC_ID_LEN);
    hex
}

/// Document properties read from the PDF, plus the page count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    /// Source filename (no directory component).
    pub filename: String,

    /// Total pages in the PDF, blank ones included.
    pub pages: u32,

    pub title: String,
    pub author: String,
    pub subject: String,
}

/// Text of one non-blank page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based page number in the source document.
    pub page: u32,

    /// Trimmed page text.
    pub text: String,
}

/// Embedded document properties (Info dictionary).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub subject: String,
}

/// One extracted paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub doc_id: String,
    pub metadata: PaperMetadata,
    pub pages: Vec<PageText>,
    pub full_text: String,
}

impl PaperRecord {
    /// Build a record from raw per-page text in page order.
    ///
    /// Pages that are empty after trimming are dropped from `pages` but
    /// still counted through `page_count`.
    pub fn from_pages<I, S>(filename: &str, page_count: u32, info: DocumentInfo, page_texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pages: Vec<PageText> = page_texts
            .into_iter()
            .enumerate()
            .filter_map(|(idx, raw)| {
                let text = raw.as_ref().trim();
                if text.is_empty() {
                    None
                } else {
                    Some(PageText {
                        page: idx as u32 + 1,
                        text: text.to_string(),
                    })
                }
            })
            .collect();

        let full_text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);

        Self {
            doc_id: derive_doc_id(filename),
            metadata: PaperMetadata {
                filename: filename.to_string(),
                pages: page_count,
                title: info.title,
                author: info.author,
                subject: info.subject,
            },
            pages,
            full_text,
        }
    }

    /// Filename the record is stored under.
    pub fn json_filename(&self) -> String {
        format!("{}.json", self.doc_id)
    }

    /// Write the record into `dir`, returning the written path.
    pub fn write_json(&self, dir: &Path) -> Result<PathBuf, ExtractError> {
        let path = dir.join(self.json_filename());
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).map_err(|source| ExtractError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Read a record previously written by [`PaperRecord::write_json`].
    pub fn read_json(path: &Path) -> Result<Self, ExtractError> {
        let content = std::fs::read_to_string(path).map_err(|source| ExtractError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}
