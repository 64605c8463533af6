//! File body handling: save-time cleanup and the base64 transport encoding.

use super::error::{SyncError, SyncResult};
use crate::document::ConfigDocument;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A document ready to be written, with its serialized text.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPayload {
    /// Cleaned document (blank entries dropped, settings normalized)
    pub document: ConfigDocument,
    /// Pretty-printed JSON of `document`
    pub content: String,
}

/// Clean a document for writing and serialize it.
///
/// Keywords without a name and receivers without an e-mail are dropped,
/// keeping the order of the rest. Settings get their fallbacks applied.
/// The input is left untouched.
pub fn prepare_for_save(document: &ConfigDocument) -> SyncResult<PreparedPayload> {
    let mut cleaned = document.clone();
    cleaned.settings = document.settings.normalized();
    cleaned.keywords.retain(|k| !k.name.trim().is_empty());
    cleaned.receivers.retain(|r| !r.email.trim().is_empty());

    let content = cleaned.to_json_pretty()?;
    Ok(PreparedPayload {
        document: cleaned,
        content,
    })
}

/// Encode file text for the Contents API.
pub fn encode_content(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode file content returned by the Contents API.
///
/// GitHub wraps the base64 body at 60 columns, so whitespace is skipped.
pub fn decode_content(encoded: &str) -> SyncResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| SyncError::InvalidPayload(format!("content is not base64: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| SyncError::InvalidPayload(format!("content is not UTF-8: {}", e)))
}
