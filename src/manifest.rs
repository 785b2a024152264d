//! Import manifest: a JSON description of how the TSV maps onto the note type.
//!
//! The flashcard application's bulk importer needs to know which note type
//! and deck receive the rows, how each column maps onto a note field, and
//! what to do with notes that already exist. The converter does not drive
//! the importer; it only writes this file next to the TSV.

use crate::error::ImportError;
use crate::schema::FieldSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name shared by the note type and the deck.
pub const DEFAULT_NOTE_TYPE: &str = "dawwen";

/// What the importer does with a row whose first field matches an existing
/// note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Overwrite the existing note. (default)
    #[default]
    Update,
    /// Keep the existing note and drop the row.
    Ignore,
    /// Add the row as a new note anyway.
    Duplicate,
}

/// One note-type field and the TSV column feeding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteField {
    /// 0-based TSV column.
    pub column: usize,
    pub name: String,
    /// Render the field right-to-left in the editor.
    pub rtl: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportManifest {
    pub note_type: String,
    pub deck: String,
    pub tsv_path: PathBuf,
    pub mode: ImportMode,
    pub allow_html: bool,
    pub fields: Vec<NoteField>,
}

impl ImportManifest {
    /// Manifest for a TSV produced with `schema`.
    pub fn new(schema: &FieldSchema, tsv_path: impl Into<PathBuf>) -> Self {
        let fields = schema
            .note_fields()
            .iter()
            .enumerate()
            .map(|(column, name)| NoteField {
                column,
                name: name.clone(),
                rtl: true,
            })
            .collect();
        Self {
            note_type: DEFAULT_NOTE_TYPE.to_string(),
            deck: DEFAULT_NOTE_TYPE.to_string(),
            tsv_path: tsv_path.into(),
            mode: ImportMode::default(),
            allow_html: true,
            fields,
        }
    }

    pub fn with_mode(mut self, mode: ImportMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn to_json(&self) -> Result<String, ImportError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ImportError::Internal(format!("manifest serialisation: {e}")))
    }

    /// Write the manifest as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<(), ImportError> {
        let json = self.to_json()?;
        std::fs::write(path, json + "\n").map_err(|source| ImportError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}
