//! # dawwen-tsv
//!
//! Convert Dawwen note exports into a TSV file that a flashcard
//! application's bulk importer can load as one note per entry.
//!
//! ## Why this crate?
//!
//! A Dawwen export is a flat text file: each entry starts with a marker line
//! (`تدوينة رقم 12:`) followed by `label: value` lines, and a value may spill
//! over several lines. Importers want one row per note with a fixed column
//! order, so this crate groups the lines back into cards, keeps every row the
//! same width, and optionally downloads each entry's image into the media
//! directory.
//!
//! ## Pipeline Overview
//!
//! ```text
//! export.txt
//!  │
//!  ├─ 1. Input       read + strict UTF-8 decode
//!  ├─ 2. Sanitize    strip bidi marks, double quotes, HTML-escape
//!  ├─ 3. Tokenize    marker / known label / continuation text
//!  ├─ 4. Assemble    fixed-width cards, one per marker
//!  ├─ 5. Postprocess image URL → stored media + <img> markup
//!  └─ 6. Emit        quoted, tab-separated rows
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dawwen_tsv::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .media_dir("collection.media")
//!         .build()?;
//!     let stats = convert_to_file("export.txt", "import.tsv", &config).await?;
//!     eprintln!("{} cards, {} images kept as text", stats.cards, stats.fetch_failures);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `dawwen2tsv` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ```toml
//! dawwen-tsv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod manifest;
pub mod media;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod schema;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, MarkerPolicy};
pub use convert::{convert, convert_str, convert_sync, convert_to_file};
pub use error::{FetchError, ImportError};
pub use manifest::{ImportManifest, ImportMode, NoteField};
pub use media::{FsMediaStore, MediaStore};
pub use output::{Card, ConversionOutput, ConversionStats, FieldFallback, ProcessedCard};
pub use pipeline::fetch::StoredAsset;
pub use pipeline::postprocess::FieldPostProcessor;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use schema::{FieldSchema, SchemaVariant};
pub use stream::{card_stream, convert_stream, CardStream};
