//! Pipeline stages for export-to-TSV conversion.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ sanitize ──▶ tokenize ──▶ assemble ──▶ postprocess ──▶ emit
//! (UTF-8)   (escaping)   (label:…)    (cards)      (images)        (TSV)
//! ```
//!
//! 1. [`input`]       — read the export and reject non-UTF-8 files
//! 2. [`sanitize`]    — strip RTL marks, double quotes, HTML-escape
//! 3. [`tokenize`]    — split on the first colon and classify the label
//! 4. [`assemble`]    — state machine producing fixed-width cards
//! 5. [`postprocess`] — per-field hook; [`fetch`] is the only stage with
//!    network or media-store I/O
//! 6. [`emit`]        — quoted TSV rows

pub mod assemble;
pub mod emit;
pub mod fetch;
pub mod input;
pub mod postprocess;
pub mod sanitize;
pub mod tokenize;
