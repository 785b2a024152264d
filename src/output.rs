//! Result types produced by a conversion.

use serde::{Deserialize, Serialize};

/// A completed card: one output row.
///
/// `columns[0]` is the entry ordinal; `columns[i]` for `i ≥ 1` holds schema
/// field `i - 1` or an empty placeholder. The length always equals the
/// schema's column count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Entry number from the record-start marker.
    pub ordinal: u64,
    /// 1-indexed input line of the marker.
    pub line: usize,
    pub columns: Vec<String>,
}

/// A field whose post-processing failed and kept its raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFallback {
    pub field: String,
    pub error: String,
}

/// A card after the post-processor has run over its fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedCard {
    pub card: Card,
    /// Fields replaced by a stored media reference.
    pub stored_assets: usize,
    pub fallbacks: Vec<FieldFallback>,
}

/// Aggregate statistics for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Lines in the decoded export.
    pub total_lines: usize,
    /// Rows written.
    pub cards: usize,
    /// Image fields replaced by media references.
    pub stored_assets: usize,
    /// Fields that fell back to their raw text.
    pub fetch_failures: usize,
    pub total_duration_ms: u64,
}

/// The in-memory result of [`crate::convert::convert`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The full TSV document.
    pub tsv: String,
    pub cards: Vec<Card>,
    pub stats: ConversionStats,
}
