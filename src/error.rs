//! Error types for the dawwen-tsv library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ImportError`] — **Fatal**: the conversion cannot produce a trustworthy
//!   file (unreadable input, invalid UTF-8, a record boundary that cannot be
//!   determined). Returned as `Err(ImportError)` from the top-level
//!   `convert*` functions.
//!
//! * [`FetchError`] — **Non-fatal**: a single image field could not be
//!   downloaded or stored. The caller keeps that field's raw text and moves
//!   on; row and column counts are unaffected.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the dawwen-tsv library.
///
/// Per-field download failures use [`FetchError`] and never surface here.
#[derive(Debug, Error)]
pub enum ImportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Export file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed.
    #[error("Failed to read '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The export is not UTF-8 text.
    #[error(
        "'{path}' is not valid UTF-8 (first invalid byte at offset {valid_up_to}).\n\
Re-export the notes from Dawwen or save the file as UTF-8 before importing."
    )]
    InvalidUtf8 { path: PathBuf, valid_up_to: usize },

    // ── Parse errors ──────────────────────────────────────────────────────
    /// A record-start marker whose ordinal is not a number.
    #[error("Line {line}: malformed entry marker '{label}' (expected a number after the prefix)")]
    MalformedMarker { line: usize, label: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output TSV file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The media directory could not be created or is not a directory.
    #[error("Media directory '{path}' is unavailable: {source}")]
    MediaDirUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The cancel flag was raised between two records.
    #[error("Conversion cancelled after {cards} cards")]
    Cancelled { cards: usize },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A recoverable failure while post-processing a single field.
///
/// Returned by [`crate::pipeline::fetch::AssetFetcher::fetch`]; the
/// conversion keeps the field's raw text when it sees one.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The field was blank, nothing to fetch.
    #[error("empty media reference")]
    EmptyReference,

    /// A local-file reference could not be read.
    #[error("cannot read local file '{path}': {source}")]
    LocalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport-level failure (DNS, TLS, connection reset, bad URL…).
    #[error("request to '{url}' failed: {reason}")]
    Http { url: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("request to '{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// The server answered with something other than 200.
    #[error("unexpected response code {status} from '{url}'")]
    Status { url: String, status: u16 },

    /// The media store refused the bytes.
    #[error("cannot store media file '{name}': {source}")]
    Store {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_marker_display() {
        let e = ImportError::MalformedMarker {
            line: 12,
            label: "تدوينة رقم x".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Line 12"), "got: {msg}");
        assert!(msg.contains("تدوينة رقم x"));
    }

    #[test]
    fn invalid_utf8_display_mentions_offset() {
        let e = ImportError::InvalidUtf8 {
            path: PathBuf::from("notes.txt"),
            valid_up_to: 42,
        };
        let msg = e.to_string();
        assert!(msg.contains("offset 42"), "got: {msg}");
        assert!(msg.contains("UTF-8"));
    }

    #[test]
    fn status_display() {
        let e = FetchError::Status {
            url: "https://example.com/a.png".into(),
            status: 404,
        };
        assert!(e.to_string().contains("404"));
        assert!(e.to_string().contains("example.com"));
    }

    #[test]
    fn timeout_display() {
        let e = FetchError::Timeout {
            url: "https://example.com".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn cancelled_display() {
        let e = ImportError::Cancelled { cards: 7 };
        assert!(e.to_string().contains("7 cards"));
    }
}
