//! Card assembler: a single-pass state machine from tokens to completed cards.
//!
//! ## States
//!
//! ```text
//!             marker N                     marker M
//! NoCardOpen ──────────▶ CardOpen(N) ────────────────▶ CardOpen(M)   (emits card N)
//!                          │    ▲
//!                          └────┘ field / text lines
//! ```
//!
//! Inside an open card the `cursor` is the column of the field currently
//! accumulating text (0 right after the marker). A field label only opens a
//! new column when it lies to the right of the cursor; gaps are padded with
//! empty placeholders so every row lines up with the schema.

use crate::config::MarkerPolicy;
use crate::error::ImportError;
use crate::output::Card;
use crate::pipeline::sanitize::sanitize_line;
use crate::pipeline::tokenize::{classify, Token};
use crate::schema::FieldSchema;
use tracing::{debug, warn};

struct OpenCard {
    ordinal: u64,
    line: usize,
    /// Finished columns; always `cursor` entries long.
    columns: Vec<String>,
    cursor: usize,
    /// Lines collected for the column at `cursor`.
    pending: Vec<String>,
}

impl OpenCard {
    fn new(ordinal: u64, line: usize, width: usize) -> Self {
        let mut columns = Vec::with_capacity(width);
        columns.push(ordinal.to_string());
        Self {
            ordinal,
            line,
            columns,
            cursor: 0,
            pending: Vec::new(),
        }
    }

    /// Store the pending text in its column, pad up to `column`, and start
    /// collecting for `column`.
    fn open_field(&mut self, column: usize, first_line: &str) {
        self.flush_pending();
        while self.columns.len() < column {
            self.columns.push(String::new());
        }
        self.cursor = column;
        self.pending.push(first_line.trim_start().to_string());
    }

    fn flush_pending(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let text = self.pending.join("\n");
        self.columns.push(text.trim_end().to_string());
        self.pending.clear();
    }

    fn close(mut self, width: usize) -> Card {
        self.flush_pending();
        self.columns.resize(width, String::new());
        Card {
            ordinal: self.ordinal,
            line: self.line,
            columns: self.columns,
        }
    }
}

enum State {
    NoCardOpen,
    CardOpen(OpenCard),
}

/// Accumulates sanitized lines into [`Card`]s.
pub struct CardAssembler {
    schema: FieldSchema,
    policy: MarkerPolicy,
    state: State,
}

impl CardAssembler {
    pub fn new(schema: FieldSchema, policy: MarkerPolicy) -> Self {
        Self {
            schema,
            policy,
            state: State::NoCardOpen,
        }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Feed one sanitized line. Returns the previous card when `line` starts
    /// a new record.
    pub fn feed(&mut self, line_no: usize, line: &str) -> Result<Option<Card>, ImportError> {
        match classify(&self.schema, line) {
            Token::Marker(ordinal) => {
                let width = self.schema.column_count();
                let next = OpenCard::new(ordinal, line_no, width);
                debug!("Line {}: entry #{} starts", line_no, ordinal);
                Ok(match std::mem::replace(&mut self.state, State::CardOpen(next)) {
                    State::CardOpen(prev) => Some(prev.close(width)),
                    State::NoCardOpen => None,
                })
            }
            Token::MalformedMarker(label) => match self.policy {
                MarkerPolicy::Abort => Err(ImportError::MalformedMarker {
                    line: line_no,
                    label: label.to_string(),
                }),
                MarkerPolicy::Skip => {
                    warn!(
                        "Line {}: '{}' is not an entry marker, kept as text",
                        line_no, label
                    );
                    self.push_text(line_no, line);
                    Ok(None)
                }
            },
            Token::Field { column, content } => {
                let State::CardOpen(card) = &mut self.state else {
                    debug!("Line {}: field before the first entry marker, dropped", line_no);
                    return Ok(None);
                };
                if column > card.cursor {
                    card.open_field(column, content);
                } else if column == card.cursor {
                    // Same label twice: the later value wins.
                    card.pending.clear();
                    card.pending.push(content.trim_start().to_string());
                } else {
                    card.pending.push(line.to_string());
                }
                Ok(None)
            }
            Token::Text(text) => {
                self.push_text(line_no, text);
                Ok(None)
            }
        }
    }

    /// Append continuation text to the pending field, if there is one.
    fn push_text(&mut self, line_no: usize, text: &str) {
        match &mut self.state {
            State::CardOpen(card) if card.cursor > 0 => card.pending.push(text.to_string()),
            _ => debug!("Line {}: text outside any field, dropped", line_no),
        }
    }

    /// End of input: close the open card, if any.
    pub fn finish(&mut self) -> Option<Card> {
        match std::mem::replace(&mut self.state, State::NoCardOpen) {
            State::CardOpen(card) => Some(card.close(self.schema.column_count())),
            State::NoCardOpen => None,
        }
    }
}

/// Iterator adapter: sanitize raw lines, feed them to a [`CardAssembler`],
/// and yield each completed card.
///
/// Stops after the first error.
pub struct Cards<I> {
    assembler: CardAssembler,
    lines: I,
    html_escape: bool,
    line_no: usize,
    done: bool,
}

impl<I, S> Cards<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    pub fn new(assembler: CardAssembler, lines: I, html_escape: bool) -> Self {
        Self {
            assembler,
            lines,
            html_escape,
            line_no: 0,
            done: false,
        }
    }
}

impl<I, S> Iterator for Cards<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Result<Card, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        for raw in self.lines.by_ref() {
            self.line_no += 1;
            let line = sanitize_line(raw.as_ref(), self.html_escape);
            match self.assembler.feed(self.line_no, &line) {
                Ok(Some(card)) => return Some(Ok(card)),
                Ok(None) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        self.done = true;
        self.assembler.finish().map(Ok)
    }
}

/// Assemble every card of an in-memory export.
pub fn assemble_str(
    text: &str,
    schema: &FieldSchema,
    policy: MarkerPolicy,
    html_escape: bool,
) -> Result<Vec<Card>, ImportError> {
    Cards::new(CardAssembler::new(schema.clone(), policy), text.lines(), html_escape).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FieldSchema {
        FieldSchema::new("Entry #", ["Title", "Body", "Source"])
    }

    fn cards(text: &str) -> Vec<Card> {
        assemble_str(text, &schema(), MarkerPolicy::Abort, true).unwrap()
    }

    #[test]
    fn two_cards_with_missing_fields() {
        let out = cards("Entry #1\nTitle: Hello\nBody: World\nEntry #2\nTitle: Bye\n");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].columns, ["1", "Hello", "World", ""]);
        assert_eq!(out[1].columns, ["2", "Bye", "", ""]);
        assert_eq!(out[1].line, 4);
    }

    #[test]
    fn multiline_value_joined_in_order() {
        let out = cards("Entry #1:\nBody: first\nsecond\n\nfourth\n\nEntry #2:\n");
        assert_eq!(out[0].columns[2], "first\nsecond\n\nfourth");
    }

    #[test]
    fn skipped_field_is_padded() {
        let out = cards("Entry #3:\nSource: book\n");
        assert_eq!(out[0].columns, ["3", "", "", "book"]);
    }

    #[test]
    fn marker_only_card_is_all_placeholders() {
        let out = cards("Entry #9:\n");
        assert_eq!(out[0].columns, ["9", "", "", ""]);
    }

    #[test]
    fn unknown_label_merges_into_pending_field() {
        let out = cards("Entry #1\nBody: text\nNote: 3:15\nSource: s\n");
        assert_eq!(out[0].columns.len(), 4);
        assert_eq!(out[0].columns[2], "text\nNote: 3:15");
    }

    #[test]
    fn duplicate_label_overwrites() {
        let out = cards("Entry #1\nTitle: old\nmore old\nTitle: new\n");
        assert_eq!(out[0].columns[1], "new");
    }

    #[test]
    fn out_of_order_label_is_continuation() {
        let out = cards("Entry #1\nBody: b\nTitle: late\n");
        assert_eq!(out[0].columns, ["1", "", "b\nTitle: late", ""]);
    }

    #[test]
    fn lines_before_first_marker_are_dropped() {
        let out = cards("preamble\nTitle: stray\nEntry #1\nTitle: t\n");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].columns[1], "t");
    }

    #[test]
    fn text_between_marker_and_first_field_is_dropped() {
        let out = cards("Entry #1\nloose\nTitle: t\n");
        assert_eq!(out[0].columns, ["1", "t", "", ""]);
    }

    #[test]
    fn malformed_marker_aborts_by_default() {
        let err = assemble_str("Entry #1\nEntry #x: y\n", &schema(), MarkerPolicy::Abort, true)
            .unwrap_err();
        assert!(matches!(err, ImportError::MalformedMarker { line: 2, .. }));
    }

    #[test]
    fn malformed_marker_kept_as_text_on_request() {
        let out = assemble_str(
            "Entry #1\nTitle: t\nEntry #x: y\nEntry #2\n",
            &schema(),
            MarkerPolicy::Skip,
            true,
        )
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].columns[1], "t\nEntry #x: y");
    }

    #[test]
    fn marker_lookalike_sentence_is_not_lost() {
        let s = FieldSchema::plain();
        let text = "تدوينة رقم 4:\nالنص: مقدمة\nتدوينة رقم 5 تتحدث عن: الصبر\n";
        let out = assemble_str(text, &s, MarkerPolicy::Skip, true).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].columns[2], "مقدمة\nتدوينة رقم 5 تتحدث عن: الصبر");
    }

    #[test]
    fn quotes_and_markup_are_escaped() {
        let out = cards("Entry #1\nTitle: say \"a<b\"\n");
        assert_eq!(out[0].columns[1], "say \"\"a&lt;b\"\"");
    }

    #[test]
    fn every_row_has_schema_width() {
        let text = "Entry #1\nEntry #2\nBody: x\nEntry #3\nSource: y\nTitle: z\nNote: n\n";
        for card in cards(text) {
            assert_eq!(card.columns.len(), schema().column_count());
        }
    }

    #[test]
    fn crlf_input() {
        let out = cards("Entry #1\r\nTitle: Hello\r\nBody: a\r\nb\r\n");
        assert_eq!(out[0].columns, ["1", "Hello", "a\nb", ""]);
    }

    #[test]
    fn dawwen_export() {
        let text = "\u{200F}تدوينة رقم 1:\nالعنوان: عنوان\nالنص: سطر\nسطر ثان\nتدوينة رقم 2:\nالكتاب: كتاب\n";
        let out = assemble_str(text, &FieldSchema::rich(), MarkerPolicy::Abort, true).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].columns.len(), 15);
        assert_eq!(out[0].columns[1], "عنوان");
        assert_eq!(out[0].columns[2], "سطر\nسطر ثان");
        assert_eq!(out[1].columns[8], "كتاب");
    }
}
