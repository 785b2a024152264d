//! Record tokenizer: split a sanitized line into `label: content` and decide
//! what the label means for the schema.

use crate::schema::FieldSchema;

/// A line split on its first colon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    /// Trimmed text before the first `:`; `None` when the line has no colon.
    pub label: Option<&'a str>,
    /// Text after the first `:`, or the whole line when there is no label.
    pub content: &'a str,
}

/// Split on the **first** colon only; later colons belong to the content.
pub fn split_label(line: &str) -> ParsedLine<'_> {
    match line.split_once(':') {
        Some((label, content)) => ParsedLine {
            label: Some(label.trim()),
            content,
        },
        None => ParsedLine {
            label: None,
            content: line,
        },
    }
}

/// What a line means once its label has been checked against the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Record-start marker carrying the entry ordinal.
    Marker(u64),
    /// Label starts with the marker prefix but the ordinal is not a number.
    MalformedMarker(&'a str),
    /// Start of a schema field stored in output `column`.
    Field { column: usize, content: &'a str },
    /// Continuation text: no label, or a label the schema doesn't know.
    Text(&'a str),
}

/// Classify one sanitized line.
pub fn classify<'a>(schema: &FieldSchema, line: &'a str) -> Token<'a> {
    let parsed = split_label(line);
    let prefix = schema.marker_prefix();

    match parsed.label {
        Some(label) => {
            if let Some(column) = schema.column_of(label) {
                return Token::Field {
                    column,
                    content: parsed.content,
                };
            }
            match label.strip_prefix(prefix) {
                Some(rest) => parse_ordinal(rest.trim())
                    .map_or(Token::MalformedMarker(label), Token::Marker),
                None => Token::Text(line),
            }
        }
        // A colon-less marker line ("Entry #1") counts only when the rest is
        // a clean number; anything else is ordinary body text.
        None => line
            .trim()
            .strip_prefix(prefix)
            .and_then(|rest| parse_ordinal(rest.trim()))
            .map_or(Token::Text(line), Token::Marker),
    }
}

/// Parse a run of decimal digits (ASCII, Arabic-Indic, or Extended Arabic-Indic).
///
/// Digits from any other script make the ordinal invalid.
pub fn parse_ordinal(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    text.chars().try_fold(0u64, |acc, c| {
        let digit = decimal_value(c)?;
        acc.checked_mul(10)?.checked_add(u64::from(digit))
    })
}

fn decimal_value(c: char) -> Option<u32> {
    match c {
        '0'..='9' => c.to_digit(10),
        '\u{0660}'..='\u{0669}' => Some(c as u32 - 0x0660),
        '\u{06F0}'..='\u{06F9}' => Some(c as u32 - 0x06F0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FieldSchema {
        FieldSchema::new("Entry #", ["Title", "Body"])
    }

    #[test]
    fn split_on_first_colon_only() {
        let p = split_label(" Title : a: b");
        assert_eq!(p.label, Some("Title"));
        assert_eq!(p.content, " a: b");
    }

    #[test]
    fn split_without_colon() {
        let p = split_label("just text");
        assert_eq!(p.label, None);
        assert_eq!(p.content, "just text");
    }

    #[test]
    fn known_label_is_field() {
        assert_eq!(
            classify(&schema(), "Body: World"),
            Token::Field {
                column: 2,
                content: " World"
            }
        );
    }

    #[test]
    fn unknown_label_is_text() {
        assert_eq!(classify(&schema(), "Note: 3:15 pm"), Token::Text("Note: 3:15 pm"));
    }

    #[test]
    fn marker_with_and_without_colon() {
        assert_eq!(classify(&schema(), "Entry #42:"), Token::Marker(42));
        assert_eq!(classify(&schema(), "Entry #7"), Token::Marker(7));
        assert_eq!(classify(&schema(), "  Entry # 8  "), Token::Marker(8));
    }

    #[test]
    fn colonless_prefix_with_words_is_text() {
        assert_eq!(classify(&schema(), "Entry #one"), Token::Text("Entry #one"));
    }

    #[test]
    fn labelled_prefix_without_number_is_malformed() {
        assert_eq!(
            classify(&schema(), "Entry #x1: body"),
            Token::MalformedMarker("Entry #x1")
        );
    }

    #[test]
    fn dawwen_marker() {
        let s = FieldSchema::rich();
        assert_eq!(classify(&s, "تدوينة رقم 12:"), Token::Marker(12));
        assert_eq!(classify(&s, "تدوينة رقم ١٢:"), Token::Marker(12));
    }

    #[test]
    fn ordinal_digits() {
        assert_eq!(parse_ordinal("0042"), Some(42));
        assert_eq!(parse_ordinal("٣٠"), Some(30));
        assert_eq!(parse_ordinal("۴"), Some(4));
        assert_eq!(parse_ordinal(""), None);
        assert_eq!(parse_ordinal("4a"), None);
        assert_eq!(parse_ordinal("99999999999999999999999"), None);
    }

    #[test]
    fn other_digit_scripts_are_rejected() {
        // Devanagari and fullwidth digits are Unicode decimals too.
        assert_eq!(parse_ordinal("१२"), None);
        assert_eq!(parse_ordinal("１２"), None);
        assert_eq!(
            classify(&schema(), "Entry #१२:"),
            Token::MalformedMarker("Entry #१२")
        );
    }
}
