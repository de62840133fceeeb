//! Input checks and basic document info
//!
//! Validation is advisory: it filters out files that are obviously not PDFs
//! before any parsing is attempted.

use crate::merge::load_source;
use crate::types::{MergeError, Result, SourceFile};
use lopdf::Document;

/// Default upper bound for a single input file
pub const DEFAULT_MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// The header may be preceded by junk; readers look within the first KiB
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Basic facts about a PDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInfo {
    pub page_count: usize,
    pub version: String,
    pub encrypted: bool,
    pub size_bytes: u64,
}

pub fn has_pdf_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
}

pub fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// Reject files that fail the extension, size or header checks
pub fn validate_source(file: &SourceFile, max_bytes: u64) -> Result<()> {
    let invalid = |reason: String| MergeError::InvalidInput {
        name: file.name.clone(),
        reason,
    };

    if !has_pdf_extension(&file.name) {
        return Err(invalid("only .pdf files are accepted".to_string()));
    }
    if file.size == 0 {
        return Err(invalid("file is empty".to_string()));
    }
    if file.size > max_bytes {
        return Err(invalid(format!(
            "file is {} bytes, limit is {} bytes",
            file.size, max_bytes
        )));
    }
    if !has_pdf_header(&file.bytes) {
        return Err(invalid("missing %PDF- header".to_string()));
    }
    Ok(())
}

/// Parse a file and report page count, version and encryption
pub fn inspect_pdf(file: &SourceFile) -> Result<PdfInfo> {
    let encrypted_info = || PdfInfo {
        page_count: 0,
        version: String::new(),
        encrypted: true,
        size_bytes: file.size,
    };

    let doc: Document = match load_source(&file.name, &file.bytes) {
        Ok(doc) => doc,
        Err(MergeError::Encrypted { .. }) => return Ok(encrypted_info()),
        Err(e) => return Err(e),
    };

    Ok(PdfInfo {
        page_count: doc.get_pages().len(),
        version: doc.version.clone(),
        encrypted: false,
        size_bytes: file.size,
    })
}
