//! Line sanitizer: make one raw export line safe to embed in a quoted TSV column.
//!
//! Dawwen writes Arabic text with explicit right-to-left marks sprinkled
//! through labels and values. They are invisible but break exact label
//! matching, so they are removed before anything else looks at the line.

/// Directionality and byte-order marks stripped from every line.
const INVISIBLE_MARKS: [char; 4] = ['\u{200E}', '\u{200F}', '\u{061C}', '\u{FEFF}'];

/// Sanitize one line.
///
/// 1. Remove LRM / RLM / ALM and stray BOMs.
/// 2. Double embedded `"` so the emitter's quoting stays balanced.
/// 3. Optionally escape `&`, `<`, `>` (quotes are left alone).
pub fn sanitize_line(line: &str, html_escape: bool) -> String {
    let mut out = String::with_capacity(line.len() + 8);
    for c in line.chars() {
        match c {
            c if INVISIBLE_MARKS.contains(&c) => {}
            '"' => out.push_str("\"\""),
            '&' if html_escape => out.push_str("&amp;"),
            '<' if html_escape => out.push_str("&lt;"),
            '>' if html_escape => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Undo [`sanitize_line`] on a field value that is about to be used as a
/// URL or path rather than displayed.
pub fn unescape_reference(text: &str) -> String {
    text.replace("\"\"", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
