//! TSV emitter: one quoted, tab-separated row per card.
//!
//! Every column is wrapped in `"`; embedded quotes were already doubled by
//! the sanitizer, so the importer's CSV reader sees balanced fields.

use crate::output::Card;
use std::io::{self, Write};

/// Render one card as a `\n`-terminated row.
pub fn render_card(card: &Card) -> String {
    let width: usize = card.columns.iter().map(|c| c.len() + 3).sum();
    let mut row = String::with_capacity(width + 1);
    for (i, column) in card.columns.iter().enumerate() {
        if i > 0 {
            row.push('\t');
        }
        row.push('"');
        row.push_str(column);
        row.push('"');
    }
    row.push('\n');
    row
}

/// Streams rows into any [`Write`] sink.
pub struct TsvWriter<W: Write> {
    inner: W,
    width: usize,
    rows: usize,
}

impl<W: Write> TsvWriter<W> {
    /// `width` is the schema's column count; every row must match it.
    pub fn new(inner: W, width: usize) -> Self {
        Self {
            inner,
            width,
            rows: 0,
        }
    }

    pub fn write_card(&mut self, card: &Card) -> io::Result<()> {
        debug_assert_eq!(card.columns.len(), self.width, "row width drifted from schema");
        self.inner.write_all(render_card(card).as_bytes())?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(columns: &[&str]) -> Card {
        Card {
            ordinal: 1,
            line: 1,
            columns: columns.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn row_is_quoted_and_tab_joined() {
        assert_eq!(render_card(&card(&["1", "Hello", "World"])), "\"1\"\t\"Hello\"\t\"World\"\n");
    }

    #[test]
    fn empty_columns_are_empty_quotes() {
        assert_eq!(render_card(&card(&["2", "Bye", ""])), "\"2\"\t\"Bye\"\t\"\"\n");
    }

    #[test]
    fn multiline_column_stays_inside_quotes() {
        assert_eq!(render_card(&card(&["3", "a\nb"])), "\"3\"\t\"a\nb\"\n");
    }

    #[test]
    fn writer_counts_rows() {
        let mut w = TsvWriter::new(Vec::new(), 2);
        w.write_card(&card(&["1", "x"])).unwrap();
        w.write_card(&card(&["2", "y"])).unwrap();
        assert_eq!(w.rows(), 2);
        let bytes = w.finish().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "\"1\"\t\"x\"\n\"2\"\t\"y\"\n");
    }
}
