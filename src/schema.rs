//! Fixed field schemas for Dawwen exports.
//!
//! A [`FieldSchema`] fixes the column order of every output row. Column 0 is
//! reserved for the entry ordinal taken from the record-start marker; named
//! field `i` lands in column `i + 1`. The name→column map is built once at
//! construction so the tokenizer does a single hash lookup per labelled line.
//!
//! Two schemas ship with the crate:
//!
//! | Variant | Fields | Image support |
//! |---------|--------|---------------|
//! | [`SchemaVariant::Rich`]  | 14 | yes — `رابط تحميل الصورة` is downloaded |
//! | [`SchemaVariant::Plain`] | 11 | no |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label prefix of a record-start marker line, e.g. `تدوينة رقم 42:`.
pub const DAWWEN_MARKER_PREFIX: &str = "تدوينة رقم";

/// Note-type field that receives the entry ordinal.
pub const ORDINAL_FIELD: &str = "رقم التدوينة";

/// The field whose content is a downloadable image reference.
pub const IMAGE_URL_FIELD: &str = "رابط تحميل الصورة";

const RICH_FIELDS: [&str; 14] = [
    "العنوان",
    "النص",
    "اسم الصورة",
    IMAGE_URL_FIELD,
    "التخصص",
    "العلم",
    "المؤلف",
    "الكتاب",
    "الطبعة",
    "الصفحة",
    "الباب",
    "تعليق",
    "تاريخ الإضافة الهجري",
    "تاريخ الإضافة الميلادي",
];

// The note type renames two export labels: the downloaded image goes into
// "الصورة" and the comment into "التعليق".
const RICH_NOTE_FIELDS: [&str; 15] = [
    ORDINAL_FIELD,
    "العنوان",
    "النص",
    "اسم الصورة",
    "الصورة",
    "التخصص",
    "العلم",
    "المؤلف",
    "الكتاب",
    "الطبعة",
    "الصفحة",
    "الباب",
    "التعليق",
    "تاريخ الإضافة الهجري",
    "تاريخ الإضافة الميلادي",
];

const PLAIN_FIELDS: [&str; 11] = [
    "العنوان",
    "النص",
    "التخصص",
    "العلم",
    "المؤلف",
    "الكتاب",
    "الطبعة",
    "الصفحة",
    "الباب",
    "تاريخ الإضافة الهجري",
    "تاريخ الإضافة الميلادي",
];

/// Which built-in schema to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    /// Schema A: 14 fields including image name and image URL. (default)
    #[default]
    Rich,
    /// Schema B: 11 fields, no image support.
    Plain,
}

/// Ordered field names plus the marker prefix that separates records.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    marker_prefix: String,
    fields: Vec<String>,
    note_fields: Vec<String>,
    rich_field: Option<String>,
    columns: HashMap<String, usize>,
}

impl FieldSchema {
    /// Build a schema from a marker prefix and an ordered field list.
    ///
    /// Duplicate names keep their first position.
    pub fn new<I, S>(marker_prefix: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let mut columns = HashMap::with_capacity(fields.len());
        for (i, name) in fields.iter().enumerate() {
            columns.entry(name.clone()).or_insert(i + 1);
        }
        let note_fields = std::iter::once(ORDINAL_FIELD.to_string())
            .chain(fields.iter().cloned())
            .collect();
        Self {
            marker_prefix: marker_prefix.into(),
            fields,
            note_fields,
            rich_field: None,
            columns,
        }
    }

    /// Designate `name` as the field handed to the media post-processor.
    pub fn with_rich_field(mut self, name: impl Into<String>) -> Self {
        self.rich_field = Some(name.into());
        self
    }

    /// Schema A: the 14-field export with image support.
    pub fn rich() -> Self {
        let mut schema = Self::new(DAWWEN_MARKER_PREFIX, RICH_FIELDS).with_rich_field(IMAGE_URL_FIELD);
        schema.note_fields = RICH_NOTE_FIELDS.iter().map(|s| s.to_string()).collect();
        schema
    }

    /// Schema B: the 11-field export without images.
    pub fn plain() -> Self {
        Self::new(DAWWEN_MARKER_PREFIX, PLAIN_FIELDS)
    }

    pub fn for_variant(variant: SchemaVariant) -> Self {
        match variant {
            SchemaVariant::Rich => Self::rich(),
            SchemaVariant::Plain => Self::plain(),
        }
    }

    pub fn marker_prefix(&self) -> &str {
        &self.marker_prefix
    }

    /// Named fields in export order (without the ordinal slot).
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Width of every output row: the ordinal plus one column per field.
    pub fn column_count(&self) -> usize {
        self.fields.len() + 1
    }

    /// Output column of a trimmed label, if it names a schema field.
    pub fn column_of(&self, label: &str) -> Option<usize> {
        self.columns.get(label).copied()
    }

    /// Field name stored in `column`; `None` for the ordinal column.
    pub fn field_at(&self, column: usize) -> Option<&str> {
        column
            .checked_sub(1)
            .and_then(|i| self.fields.get(i))
            .map(String::as_str)
    }

    pub fn rich_field(&self) -> Option<&str> {
        self.rich_field.as_deref()
    }

    /// Note-type field names in column order, used for the import mapping.
    pub fn note_fields(&self) -> &[String] {
        &self.note_fields
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::rich()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rich_schema_shape() {
        let s = FieldSchema::rich();
        assert_eq!(s.fields().len(), 14);
        assert_eq!(s.column_count(), 15);
        assert_eq!(s.note_fields().len(), s.column_count());
        assert_eq!(s.rich_field(), Some(IMAGE_URL_FIELD));
        assert_eq!(s.column_of(IMAGE_URL_FIELD), Some(4));
    }

    #[test]
    fn plain_schema_has_no_image_field() {
        let s = FieldSchema::plain();
        assert_eq!(s.column_count(), 12);
        assert_eq!(s.rich_field(), None);
        assert_eq!(s.column_of(IMAGE_URL_FIELD), None);
        assert_eq!(s.column_of("تاريخ الإضافة الميلادي"), Some(11));
    }

    #[test]
    fn field_at_skips_ordinal_column() {
        let s = FieldSchema::new("Entry #", ["Title", "Body"]);
        assert_eq!(s.field_at(0), None);
        assert_eq!(s.field_at(1), Some("Title"));
        assert_eq!(s.field_at(2), Some("Body"));
        assert_eq!(s.field_at(3), None);
    }

    #[test]
    fn unknown_label_has_no_column() {
        let s = FieldSchema::new("Entry #", ["Title", "Body"]);
        assert_eq!(s.column_of("Footnote"), None);
        assert_eq!(s.column_of("title"), None);
    }

    #[test]
    fn duplicate_names_keep_first_position() {
        let s = FieldSchema::new("E", ["A", "B", "A"]);
        assert_eq!(s.column_of("A"), Some(1));
        assert_eq!(s.column_count(), 4);
    }

    #[test]
    fn variant_roundtrips_through_json() {
        let json = serde_json::to_string(&SchemaVariant::Plain).unwrap();
        assert_eq!(json, "\"plain\"");
        let back: SchemaVariant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SchemaVariant::Plain);
    }
}
