//! Input resolution: read a Dawwen export from disk and decode it.
//!
//! The whole file is decoded up front so a non-UTF-8 export fails before a
//! single row is written; a half-converted file is never handed to the
//! importer.

use crate::error::ImportError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Read `path` and return its text without a leading BOM.
pub async fn read_export(path: &Path) -> Result<String, ImportError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => ImportError::InputNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => ImportError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ImportError::InputReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    decode_export(path, bytes)
}

/// Decode raw export bytes as UTF-8.
pub fn decode_export(path: &Path, bytes: Vec<u8>) -> Result<String, ImportError> {
    let text = String::from_utf8(bytes).map_err(|e| ImportError::InvalidUtf8 {
        path: path.to_path_buf(),
        valid_up_to: e.utf8_error().valid_up_to(),
    })?;
    Ok(match text.strip_prefix('\u{FEFF}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}
