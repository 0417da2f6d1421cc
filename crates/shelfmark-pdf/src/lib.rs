//! lopdf-backed [`DocumentSource`].
//!
//! Reads embedded Info-dictionary metadata and a bounded amount of page
//! text. Only a file that cannot be opened at all is an error; a missing
//! text layer or unreadable metadata degrades to empty fields per the
//! source contract.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::Document;
use tracing::{debug, warn};

use shelfmark_core::{DocumentSource, DocumentText, SourceError};

/// Pages of text taken as the "opening page" probe.
const FIRST_PAGES: u32 = 3;
/// Fraction of the document sampled for content classification.
const SAMPLE_FRACTION: f64 = 0.2;
/// Hard cap on sampled pages, so 2000-page tomes stay cheap.
const MAX_SAMPLE_PAGES: u32 = 30;

#[derive(Debug, Default)]
pub struct LopdfSource;

impl LopdfSource {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentSource for LopdfSource {
    fn read(&self, path: &Path) -> Result<DocumentText, SourceError> {
        let size_bytes = std::fs::metadata(path)?.len();
        let doc = Document::load(path).map_err(|e| SourceError::Open(e.to_string()))?;

        let page_count = doc.get_pages().len() as u32;
        let metadata = info_metadata(&doc);

        let first_page_text = extract_pages(&doc, path, 1, FIRST_PAGES.min(page_count));
        let sample_pages = ((page_count as f64 * SAMPLE_FRACTION).ceil() as u32)
            .clamp(FIRST_PAGES.min(page_count), MAX_SAMPLE_PAGES)
            .min(page_count);
        let full_text_sample = if sample_pages > 0 {
            Some(extract_pages(&doc, path, 1, sample_pages))
        } else {
            None
        };

        debug!(
            path = %path.display(),
            pages = page_count,
            metadata_keys = metadata.len(),
            "document read"
        );

        Ok(DocumentText {
            page_count,
            size_bytes,
            metadata,
            first_page_text,
            full_text_sample,
        })
    }
}

/// Extract text for pages `from..=to`; failures yield an empty string.
fn extract_pages(doc: &Document, path: &Path, from: u32, to: u32) -> String {
    if to < from {
        return String::new();
    }
    let pages: Vec<u32> = (from..=to).collect();
    match doc.extract_text(&pages) {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "text extraction failed, continuing without text");
            String::new()
        }
    }
}

/// Read the trailer Info dictionary into lowercased string keys
/// (`title`, `author`, `creationdate`, ...). Absent or malformed entries
/// are simply skipped.
fn info_metadata(doc: &Document) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();

    let info_ref = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|o| o.as_reference().ok());
    let Some(info) = info_ref.and_then(|r| {
        doc.get_object(r)
            .ok()
            .and_then(|obj| obj.as_dict().ok())
    }) else {
        return metadata;
    };

    for (key, value) in info.iter() {
        let Ok(key) = std::str::from_utf8(key) else {
            continue;
        };
        if let Ok(bytes) = value.as_str() {
            let decoded = decode_pdf_string(bytes);
            if !decoded.is_empty() {
                metadata.insert(key.to_lowercase(), decoded);
            }
        }
    }
    metadata
}

/// PDF text strings are UTF-16BE when they carry the 0xFE 0xFF BOM,
/// otherwise treated as (roughly) Latin-1/UTF-8.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (cow, ..) = encoding_rs::UTF_16BE.decode(&bytes[2..]);
        cow.into_owned()
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}
