//! Output formatting: grep-compatible (default) and JSON Lines (`--json`).
//!
//! Both formats are [`EntrySink`]s that write to an arbitrary
//! [`std::io::Write`] destination (typically stdout). Hints and errors
//! always go to stderr via [`print_hint`] and [`print_error`].

use std::io::Write;

use anyhow::Result;

use crate::errors::SymdexError;
use crate::pipeline::EntrySink;
use crate::types::{ContextType, FileEntries, SymbolEntry};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
/// File paths: magenta + bold.
const FILE: &str = "\x1b[35m\x1b[1m";
/// Line numbers: green.
const LINE_NO: &str = "\x1b[32m";
/// Separators (colons): cyan.
const SEP: &str = "\x1b[36m";
/// Context type: bold.
const CONTEXT: &str = "\x1b[1m";

/// Resolve the `[output] color` setting against the environment.
///
/// `NO_COLOR` always wins, then `CLICOLOR_FORCE=1`, then an explicit
/// `always`/`never`; `auto` follows whether stdout is a terminal.
pub fn resolve_color(setting: &str) -> bool {
    use std::io::IsTerminal;
    resolve_color_inner(
        std::env::var_os("NO_COLOR").is_some(),
        std::env::var("CLICOLOR_FORCE").ok().as_deref(),
        setting,
        std::io::stdout().is_terminal(),
    )
}

fn resolve_color_inner(no_color: bool, force: Option<&str>, setting: &str, is_tty: bool) -> bool {
    if no_color {
        return false;
    }
    if force == Some("1") {
        return true;
    }
    match setting {
        "always" | "true" => true,
        "never" | "false" => false,
        _ => is_tty,
    }
}

// ---------------------------------------------------------------------------
// JSON Lines
// ---------------------------------------------------------------------------

/// One JSON object per entry, absent columns omitted.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EntrySink for JsonLinesSink<W> {
    fn replace_file(&mut self, file: &FileEntries) -> Result<()> {
        for entry in &file.entries {
            serde_json::to_writer(&mut self.writer, entry)?;
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Grep
// ---------------------------------------------------------------------------

/// `path:line:CONTEXT symbol key=value...`, one entry per line.
pub struct GrepSink<W: Write> {
    writer: W,
    color: bool,
}

impl<W: Write> GrepSink<W> {
    pub fn new(writer: W, color: bool) -> Self {
        Self { writer, color }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn paint(&mut self, style: &str, text: &str) -> std::io::Result<()> {
        if self.color {
            write!(self.writer, "{style}{text}{RESET}")
        } else {
            write!(self.writer, "{text}")
        }
    }

    fn write_entry(&mut self, path: &str, entry: &SymbolEntry) -> std::io::Result<()> {
        self.paint(FILE, path)?;
        self.paint(SEP, ":")?;
        self.paint(LINE_NO, &entry.line.to_string())?;
        self.paint(SEP, ":")?;
        self.paint(CONTEXT, entry.context.as_str())?;
        write!(self.writer, " {}", entry.symbol)?;
        let columns = [
            ("parent", &entry.parent),
            ("scope", &entry.scope),
            ("modifier", &entry.modifier),
            ("clue", &entry.clue),
            ("namespace", &entry.namespace),
            ("type", &entry.type_name),
        ];
        for (key, value) in columns {
            if let Some(v) = value {
                if v.contains(' ') {
                    write!(self.writer, " {key}=\"{v}\"")?;
                } else {
                    write!(self.writer, " {key}={v}")?;
                }
            }
        }
        writeln!(self.writer)
    }
}

impl<W: Write> EntrySink for GrepSink<W> {
    fn replace_file(&mut self, file: &FileEntries) -> Result<()> {
        let path = file.rel_path();
        for entry in &file.entries {
            self.write_entry(&path, entry)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Kind filter
// ---------------------------------------------------------------------------

/// Forwards only entries of the given context types.
pub struct KindFilter<S> {
    inner: S,
    kinds: Vec<ContextType>,
}

impl<S: EntrySink> KindFilter<S> {
    pub fn new(inner: S, kinds: Vec<ContextType>) -> Self {
        Self { inner, kinds }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: EntrySink> EntrySink for KindFilter<S> {
    fn replace_file(&mut self, file: &FileEntries) -> Result<()> {
        if self.kinds.is_empty() {
            return self.inner.replace_file(file);
        }
        let kept = FileEntries {
            directory: file.directory.clone(),
            filename: file.filename.clone(),
            language: file.language.clone(),
            entries: file
                .entries
                .iter()
                .filter(|e| self.kinds.contains(&e.context))
                .cloned()
                .collect(),
        };
        self.inner.replace_file(&kept)
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.finish()
    }
}

// ---------------------------------------------------------------------------
// Stderr helpers
// ---------------------------------------------------------------------------

/// Print a hint message to stderr (suppressed when `json` is true).
pub fn print_hint(msg: &str, json: bool) {
    if !json {
        eprintln!("hint: {msg}");
    }
}

/// Print an error message to stderr.
pub fn print_error(msg: &str) {
    eprintln!("error: {msg}");
}

/// Format a [`SymdexError`] to stderr with structured `error:` / `hint:` lines.
///
/// * Always prints `error: <message>` to stderr.
/// * When `json` is `false` and the error carries a contextual hint, also
///   prints `hint: <suggestion>` to stderr.
/// * Returns the appropriate process exit code.
pub fn format_error(err: &SymdexError, json: bool) -> i32 {
    print_error(&format!("{err}"));
    if let Some(hint) = err.hint() {
        print_hint(hint, json);
    }
    err.exit_code()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileEntries {
        let mut name = SymbolEntry::new("conn", 1, ContextType::Filename);
        name.directory = "pkg/net".into();
        name.filename = "conn.go".into();

        let mut func = SymbolEntry::new("Dial", 7, ContextType::Function);
        func.directory = "pkg/net".into();
        func.filename = "conn.go".into();
        func.scope = Some("public".into());
        func.type_name = Some("*Conn".into());
        func.location = Some("7:0 - 9:1".into());
        func.definition = Some("7:0 - 9:1".into());

        let mut call = SymbolEntry::new("Printf", 8, ContextType::Call);
        call.directory = "pkg/net".into();
        call.filename = "conn.go".into();
        call.parent = Some("fmt".into());
        call.modifier = Some("async static".into());

        FileEntries {
            directory: "pkg/net".into(),
            filename: "conn.go".into(),
            language: "Go".into(),
            entries: vec![name, func, call],
        }
    }

    fn grep(color: bool, file: &FileEntries) -> String {
        let mut sink = GrepSink::new(Vec::new(), color);
        sink.replace_file(file).unwrap();
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn grep_format() {
        let out = grep(false, &sample());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "pkg/net/conn.go:1:FILENAME conn");
        assert_eq!(lines[1], "pkg/net/conn.go:7:FUNCTION Dial scope=public type=*Conn");
        assert_eq!(lines[2], "pkg/net/conn.go:8:CALL Printf parent=fmt modifier=\"async static\"");
    }

    #[test]
    fn grep_color_wraps_path_and_line() {
        let out = grep(true, &sample());
        assert!(out.starts_with(&format!(
            "{FILE}pkg/net/conn.go{RESET}{SEP}:{RESET}{LINE_NO}1{RESET}"
        )));
    }

    #[test]
    fn json_lines_one_object_per_entry() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.replace_file(&sample()).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        let rows: Vec<serde_json::Value> =
            out.lines().map(|l| serde_json::from_str(l).unwrap()).collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["symbol"], "Dial");
        assert_eq!(rows[1]["context"], "FUNCTION");
        assert_eq!(rows[1]["type"], "*Conn");
        assert_eq!(rows[1]["directory"], "pkg/net");
        assert!(rows[1].get("parent").is_none());
        assert!(rows[0].get("location").is_none());
    }

    #[test]
    fn json_output_has_no_ansi_codes() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.replace_file(&sample()).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn kind_filter_keeps_selected_contexts() {
        let mut sink = KindFilter::new(GrepSink::new(Vec::new(), false), vec![ContextType::Call]);
        sink.replace_file(&sample()).unwrap();
        let out = String::from_utf8(sink.into_inner().into_inner()).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("CALL Printf"));
    }

    #[test]
    fn empty_kind_filter_passes_everything() {
        let mut sink = KindFilter::new(GrepSink::new(Vec::new(), false), Vec::new());
        sink.replace_file(&sample()).unwrap();
        let out = String::from_utf8(sink.into_inner().into_inner()).unwrap();
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn color_resolution_order() {
        assert!(!resolve_color_inner(true, Some("1"), "always", true));
        assert!(resolve_color_inner(false, Some("1"), "never", false));
        assert!(resolve_color_inner(false, None, "always", false));
        assert!(!resolve_color_inner(false, None, "never", true));
        assert!(resolve_color_inner(false, None, "auto", true));
        assert!(!resolve_color_inner(false, None, "auto", false));
    }

    #[test]
    fn format_error_returns_exit_codes() {
        assert_eq!(format_error(&SymdexError::Config("bad".into()), true), 1);
        assert_eq!(format_error(&SymdexError::Usage("bad flag".into()), true), 2);
    }
}
