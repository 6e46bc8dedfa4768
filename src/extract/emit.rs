//! Entry emission.
//!
//! The [`Emitter`] owns the per-file result buffer. Handlers describe an
//! entry with [`Emitter::entry`], fill in extended columns on the returned
//! [`EntryBuilder`], and hand it back with [`EntryBuilder::emit`] (consults
//! the filter oracle) or [`EntryBuilder::emit_unfiltered`].

use tree_sitter::Node;

use super::ExtractOptions;
use super::typenorm::{Normalizer, TypeGap, TypeGapPolicy, TypeTable, truncate_in_place};
use crate::errors::ExtractError;
use crate::filter::FilterOracle;
use crate::types::{ContextType, Location, SymbolEntry};

/// Return `s` cut to at most `max` bytes on a char boundary.
pub fn truncate_to(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    &s[..cut]
}

/// Order `found` modifiers by `priority`, dropping duplicates. Modifiers
/// missing from `priority` follow in encounter order.
pub fn ordered_modifiers(found: &[&str], priority: &[&str]) -> Option<String> {
    let mut out: Vec<&str> = priority
        .iter()
        .copied()
        .filter(|p| found.contains(p))
        .collect();
    for m in found {
        if !out.contains(m) {
            out.push(m);
        }
    }
    if out.is_empty() { None } else { Some(out.join(" ")) }
}

/// Span of `node`: 1-based rows, 0-based columns.
pub fn location_of(node: Node) -> Location {
    let start = node.start_position();
    let end = node.end_position();
    Location {
        start_row: start.row + 1,
        start_col: start.column,
        end_row: end.row + 1,
        end_col: end.column,
    }
}

/// Values accepted by the extended-column setters. Empty strings and
/// `None` both leave the column absent.
pub trait IntoColumn {
    fn into_column(self) -> Option<String>;
}

impl IntoColumn for &str {
    fn into_column(self) -> Option<String> {
        (!self.is_empty()).then(|| self.to_string())
    }
}

impl IntoColumn for String {
    fn into_column(self) -> Option<String> {
        (!self.is_empty()).then_some(self)
    }
}

impl IntoColumn for &String {
    fn into_column(self) -> Option<String> {
        self.as_str().into_column()
    }
}

impl<T: IntoColumn> IntoColumn for Option<T> {
    fn into_column(self) -> Option<String> {
        self.and_then(IntoColumn::into_column)
    }
}

/// An entry under construction.
#[must_use = "an entry does nothing until emitted"]
pub struct EntryBuilder {
    entry: SymbolEntry,
    accepted: bool,
    max_type_len: usize,
}

impl EntryBuilder {
    pub fn parent(mut self, v: impl IntoColumn) -> Self {
        self.entry.parent = v.into_column();
        self
    }

    pub fn scope(mut self, v: impl IntoColumn) -> Self {
        self.entry.scope = v.into_column();
        self
    }

    pub fn modifier(mut self, v: impl IntoColumn) -> Self {
        self.entry.modifier = v.into_column();
        self
    }

    pub fn clue(mut self, v: impl IntoColumn) -> Self {
        self.entry.clue = v.into_column();
        self
    }

    pub fn namespace(mut self, v: impl IntoColumn) -> Self {
        self.entry.namespace = v.into_column();
        self
    }

    pub fn type_name(mut self, v: impl IntoColumn) -> Self {
        self.entry.type_name = v.into_column().map(|mut t| {
            truncate_in_place(&mut t, self.max_type_len);
            t
        });
        self
    }

    /// Emit if the filter oracle accepted the symbol text.
    pub fn emit(self, em: &mut Emitter) {
        if self.accepted {
            em.push(self.entry);
        }
    }

    /// Emit regardless of the filter oracle.
    pub fn emit_unfiltered(self, em: &mut Emitter) {
        em.push(self.entry);
    }
}

/// Per-file entry buffer and the services handlers share.
pub struct Emitter<'a> {
    src: &'a str,
    directory: String,
    filename: String,
    filter: &'a dyn FilterOracle,
    opts: &'a ExtractOptions,
    types: &'a TypeTable,
    entries: Vec<SymbolEntry>,
    gaps: Vec<TypeGap>,
}

impl<'a> Emitter<'a> {
    pub fn new(
        src: &'a str,
        directory: String,
        filename: String,
        filter: &'a dyn FilterOracle,
        opts: &'a ExtractOptions,
        types: &'a TypeTable,
    ) -> Self {
        Self {
            src,
            directory,
            filename,
            filter,
            opts,
            types,
            entries: Vec::new(),
            gaps: Vec::new(),
        }
    }

    /// Source text of `node`.
    pub fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.src.as_bytes()).unwrap_or("")
    }

    /// Source text of `node`'s `field` child.
    pub fn field_text(&self, node: Node, field: &str) -> Option<&'a str> {
        node.child_by_field_name(field).map(|n| self.text(n))
    }

    pub fn accepts(&self, text: &str) -> bool {
        self.filter.should_index(text)
    }

    /// Start an entry for `symbol` positioned at `node`.
    pub fn entry(&self, symbol: &str, node: Node, context: ContextType) -> EntryBuilder {
        let loc = location_of(node).to_string();
        let mut entry = SymbolEntry::new(
            truncate_to(symbol.trim(), self.opts.max_symbol_len),
            node.start_position().row + 1,
            context,
        );
        if context.is_definition() {
            entry.definition = Some(loc.clone());
        }
        entry.location = Some(loc);
        EntryBuilder {
            accepted: !symbol.trim().is_empty() && self.filter.should_index(symbol.trim()),
            entry,
            max_type_len: self.opts.max_type_len,
        }
    }

    /// Normalized type of a type-shaped node, or `None` when it renders empty.
    pub fn type_of(&mut self, node: Node) -> Option<String> {
        let norm = Normalizer::new(
            self.types,
            self.src.as_bytes(),
            self.opts.max_type_len,
            self.opts.max_type_depth,
        );
        let out = norm.normalize(node, &mut self.gaps);
        (!out.is_empty()).then_some(out)
    }

    /// Normalized type of `node`'s `field` child.
    pub fn field_type(&mut self, node: Node, field: &str) -> Option<String> {
        node.child_by_field_name(field).and_then(|t| self.type_of(t))
    }

    /// Emit one entry per cleaned word of a string or comment node.
    pub fn words(&mut self, node: Node, context: ContextType, parent: Option<&str>) {
        let text = self.text(node);
        let origin = node.start_position();
        for word in split_words(text) {
            if !self.filter.should_index(word.text) {
                continue;
            }
            let row = origin.row + word.row;
            let col = if word.row == 0 { origin.column + word.col } else { word.col };
            let mut entry = SymbolEntry::new(
                truncate_to(word.text, self.opts.max_symbol_len),
                row + 1,
                context,
            );
            entry.location = Some(
                Location {
                    start_row: row + 1,
                    start_col: col,
                    end_row: row + 1,
                    end_col: col + word.text.len(),
                }
                .to_string(),
            );
            entry.parent = parent.into_column();
            self.push(entry);
        }
    }

    /// The mandatory identity entry: file stem at line 1, never filtered.
    pub fn filename_entry(&mut self) {
        let stem = std::path::Path::new(&self.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filename.clone());
        let symbol = truncate_to(&stem, self.opts.max_symbol_len);
        let entry = SymbolEntry::new(symbol, 1, ContextType::Filename);
        self.push(entry);
    }

    fn push(&mut self, mut entry: SymbolEntry) {
        entry.directory.clone_from(&self.directory);
        entry.filename.clone_from(&self.filename);
        self.entries.push(entry);
    }

    /// Hand the buffer back, applying the type gap policy.
    pub fn finish(self, file: &str) -> Result<Vec<SymbolEntry>, ExtractError> {
        for gap in &self.gaps {
            match self.opts.type_gap_policy {
                TypeGapPolicy::Skip => tracing::debug!(
                    file,
                    row = gap.row,
                    column = gap.column,
                    kind = gap.kind,
                    "unclassified type node"
                ),
                TypeGapPolicy::Warn => tracing::warn!(
                    file,
                    row = gap.row,
                    column = gap.column,
                    kind = gap.kind,
                    "unclassified type node"
                ),
                TypeGapPolicy::Fail => {
                    return Err(ExtractError::UnclassifiedType {
                        file: file.to_string(),
                        row: gap.row,
                        column: gap.column,
                        kind: gap.kind.to_string(),
                    });
                }
            }
        }
        Ok(self.entries)
    }
}

// ---------------------------------------------------------------------------
// Word tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
struct Word<'a> {
    text: &'a str,
    /// Lines before the word, relative to the start of the text.
    row: usize,
    /// Byte column within its line.
    col: usize,
}

fn keeps(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '/' | '-' | ':')
}

fn flush<'t>(
    text: &'t str,
    from: usize,
    to: usize,
    row: usize,
    line_start: usize,
    words: &mut Vec<Word<'t>>,
) {
    let raw = &text[from..to];
    let body = raw.trim_start_matches([':', '-']);
    let lead = raw.len() - body.len();
    let cleaned = body.trim_end_matches(['.', ':', '-']);
    if cleaned.chars().any(char::is_alphanumeric) {
        words.push(Word {
            text: cleaned,
            row,
            col: from + lead - line_start,
        });
    }
}

/// Split on whitespace and on punctuation other than path separators, then
/// trim trailing `. : -` and leading `: -`. Runs without any letter or
/// digit are dropped.
fn split_words(text: &str) -> Vec<Word<'_>> {
    let mut words = Vec::new();
    let mut row = 0;
    let mut line_start = 0;
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if keeps(c) {
            if start.is_none() {
                start = Some(i);
            }
            continue;
        }
        if let Some(s) = start.take() {
            flush(text, s, i, row, line_start, &mut words);
        }
        if c == '\n' {
            row += 1;
            line_start = i + 1;
        }
    }
    if let Some(s) = start {
        flush(text, s, text.len(), row, line_start, &mut words);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(s: &str) -> Vec<&str> {
        split_words(s).into_iter().map(|w| w.text).collect()
    }

    #[test]
    fn truncate_to_is_char_safe() {
        assert_eq!(truncate_to("abcdef", 3), "abc");
        assert_eq!(truncate_to("héllo", 2), "h");
        assert_eq!(truncate_to("ab", 10), "ab");
    }

    #[test]
    fn modifiers_follow_priority_then_encounter_order() {
        let prio = ["abstract", "final", "static"];
        assert_eq!(
            ordered_modifiers(&["static", "weird", "abstract", "static"], &prio).as_deref(),
            Some("abstract static weird")
        );
        assert_eq!(ordered_modifiers(&[], &prio), None);
    }

    #[test]
    fn words_keep_path_separators() {
        assert_eq!(
            texts("// see src/net/conn.go: handle_read() now."),
            vec!["see", "src/net/conn.go", "handle_read", "now"]
        );
    }

    #[test]
    fn words_trim_edge_punctuation() {
        assert_eq!(texts("\"--verbose: -x ::ns\""), vec!["verbose", "x", "ns"]);
    }

    #[test]
    fn words_track_rows_and_columns() {
        let words = split_words("/* first\n   second */");
        assert_eq!(words[0], Word { text: "first", row: 0, col: 3 });
        assert_eq!(words[1], Word { text: "second", row: 1, col: 3 });
    }

    #[test]
    fn columns_accept_strings_and_options() {
        assert_eq!("".into_column(), None);
        assert_eq!("x".into_column().as_deref(), Some("x"));
        assert_eq!(Some(String::from("y")).into_column().as_deref(), Some("y"));
        assert_eq!(None::<&str>.into_column(), None);
    }
}
