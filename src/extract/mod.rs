//! Symbol extraction engine.
//!
//! Provides language detection by file extension, parser construction with
//! the correct grammar, and the [`Extractor`], which walks one parsed file
//! and produces its normalized [`SymbolEntry`] stream. Every grammar's
//! classification tables are built once in [`Extractor::new`]; the value is
//! immutable afterwards and can be shared across threads, one file per call.
//!
//! [`SymbolEntry`]: crate::types::SymbolEntry

pub mod context;
pub mod emit;
pub mod table;
pub mod typenorm;

mod c;
mod go;
mod php;
mod python;
mod typescript;

use std::path::{Component, Path};
use std::sync::Arc;

use tree_sitter::{Language, Node, Parser};

use crate::errors::ExtractError;
use crate::filter::FilterOracle;
use crate::types::FileEntries;
use emit::Emitter;
use typenorm::{TypeGapPolicy, TypeTable};

/// Supported programming languages with bundled Tree-sitter grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    C,
    Go,
    Php,
    Python,
    TypeScript,
    Tsx,
}

impl Lang {
    pub const ALL: [Lang; 6] = [
        Lang::C,
        Lang::Go,
        Lang::Php,
        Lang::Python,
        Lang::TypeScript,
        Lang::Tsx,
    ];

    /// Returns the human-readable name for this language.
    pub fn name(self) -> &'static str {
        match self {
            Lang::C => "C",
            Lang::Go => "Go",
            Lang::Php => "PHP",
            Lang::Python => "Python",
            Lang::TypeScript => "TypeScript",
            Lang::Tsx => "TSX",
        }
    }

    /// File extensions mapped to this language.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Lang::C => &["c", "h"],
            Lang::Go => &["go"],
            Lang::Php => &["php", "phtml", "inc"],
            Lang::Python => &["py", "pyi"],
            Lang::TypeScript => &["ts", "mts", "cts"],
            Lang::Tsx => &["tsx", "js", "jsx", "mjs", "cjs"],
        }
    }
}

/// Detect the programming language of a file based on its extension.
///
/// Returns `None` for unsupported or missing extensions.
pub fn detect_language(path: &Path) -> Option<Lang> {
    let ext = path.extension()?.to_str()?;
    Lang::ALL.into_iter().find(|l| l.extensions().contains(&ext))
}

/// Return the Tree-sitter [`Language`] grammar for the given language.
fn grammar_for(lang: Lang) -> Language {
    match lang {
        Lang::C => tree_sitter_c::LANGUAGE.into(),
        Lang::Go => tree_sitter_go::LANGUAGE.into(),
        Lang::Php => tree_sitter_php::LANGUAGE_PHP.into(),
        Lang::Python => tree_sitter_python::LANGUAGE.into(),
        Lang::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Lang::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
    }
}

/// Create a new [`Parser`] configured for the given language.
pub fn get_parser(lang: Lang) -> Result<Parser, ExtractError> {
    let mut parser = Parser::new();
    parser
        .set_language(&grammar_for(lang))
        .map_err(|e| ExtractError::Grammar {
            lang: lang.name(),
            reason: e.to_string(),
        })?;
    Ok(parser)
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Engine limits and policies.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Maximum bytes kept of any symbol text.
    pub max_symbol_len: usize,
    /// Maximum bytes kept of any rendered type.
    pub max_type_len: usize,
    /// Nesting depth the type normalizer renders.
    pub max_type_depth: usize,
    pub type_gap_policy: TypeGapPolicy,
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_symbol_len: 128,
            max_type_len: 64,
            max_type_depth: 8,
            type_gap_policy: TypeGapPolicy::Warn,
            max_file_size: 1024 * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-grammar dispatch
// ---------------------------------------------------------------------------

/// One grammar's classification tables and visitor.
trait Grammar: Send + Sync {
    fn types(&self) -> &TypeTable;

    /// Walk the tree rooted at `root`, emitting entries in pre-order.
    fn walk(&self, root: Node, em: &mut Emitter);
}

/// Extracts symbol entries from source files.
pub struct Extractor {
    opts: ExtractOptions,
    filter: Arc<dyn FilterOracle>,
    c: c::Tables,
    go: go::Tables,
    php: php::Tables,
    python: python::Tables,
    typescript: typescript::Tables,
    tsx: typescript::Tables,
}

impl Extractor {
    /// Build every grammar's tables.
    pub fn new(opts: ExtractOptions, filter: Arc<dyn FilterOracle>) -> Self {
        Self {
            c: c::Tables::new(&grammar_for(Lang::C)),
            go: go::Tables::new(&grammar_for(Lang::Go)),
            php: php::Tables::new(&grammar_for(Lang::Php)),
            python: python::Tables::new(&grammar_for(Lang::Python)),
            typescript: typescript::Tables::new(&grammar_for(Lang::TypeScript)),
            tsx: typescript::Tables::new(&grammar_for(Lang::Tsx)),
            opts,
            filter,
        }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.opts
    }

    fn grammar(&self, lang: Lang) -> &dyn Grammar {
        match lang {
            Lang::C => &self.c,
            Lang::Go => &self.go,
            Lang::Php => &self.php,
            Lang::Python => &self.python,
            Lang::TypeScript => &self.typescript,
            Lang::Tsx => &self.tsx,
        }
    }

    /// Extract entries from in-memory source. `rel_path` is the
    /// `/`-separated path relative to the project root.
    pub fn extract_source(
        &self,
        lang: Lang,
        source: &str,
        rel_path: &str,
    ) -> Result<FileEntries, ExtractError> {
        let mut parser = get_parser(lang)?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ExtractError::ParseFailed(rel_path.into()))?;

        let (directory, filename) = split_rel_path(rel_path);
        let grammar = self.grammar(lang);
        let mut em = Emitter::new(
            source,
            directory.clone(),
            filename.clone(),
            self.filter.as_ref(),
            &self.opts,
            grammar.types(),
        );
        em.filename_entry();
        grammar.walk(tree.root_node(), &mut em);
        let entries = em.finish(rel_path)?;

        tracing::debug!(file = rel_path, lang = lang.name(), entries = entries.len(), "extracted");
        Ok(FileEntries {
            directory,
            filename,
            language: lang.name().to_string(),
            entries,
        })
    }

    /// Read and extract one file. `root` is the project root that entry
    /// paths are made relative to.
    pub fn extract_file(&self, path: &Path, root: &Path) -> Result<FileEntries, ExtractError> {
        let lang = detect_language(path)
            .ok_or_else(|| ExtractError::Unsupported(path.to_path_buf()))?;
        let meta = std::fs::metadata(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.is_file() {
            return Err(ExtractError::NotRegularFile(path.to_path_buf()));
        }
        if meta.len() > self.opts.max_file_size {
            return Err(ExtractError::TooLarge {
                path: path.to_path_buf(),
                size: meta.len(),
                limit: self.opts.max_file_size,
            });
        }
        let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = String::from_utf8_lossy(&bytes);
        self.extract_source(lang, &source, &relative_path(path, root))
    }
}

/// `/`-joined path of `path` below `root`; just the file name when `path`
/// is not under `root`.
pub fn relative_path(path: &Path, root: &Path) -> String {
    let rel = match path.strip_prefix(root) {
        Ok(rel) => rel,
        Err(_) => {
            return path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
    };
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn split_rel_path(rel_path: &str) -> (String, String) {
    let trimmed = rel_path.trim_start_matches("./");
    match trimmed.rsplit_once('/') {
        Some((dir, file)) => (dir.to_string(), file.to_string()),
        None => (String::new(), trimmed.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Helpers shared by the language visitors
// ---------------------------------------------------------------------------

/// Children of `node`, in order.
pub(crate) fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Named children of `node`, in order.
pub(crate) fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Every child of `node` attached under `field`.
pub(crate) fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Text between matching quotes, or the text unchanged.
pub(crate) fn unquote(text: &str) -> &str {
    let t = text.trim();
    for q in ['"', '\'', '`'] {
        if let Some(inner) = t.strip_prefix(q).and_then(|s| s.strip_suffix(q)) {
            return inner;
        }
    }
    t
}

/// First named child of `node` with the given kind.
pub(crate) fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    named_children(node).into_iter().find(|c| c.kind() == kind)
}

/// Rightmost identifier-like segment of a dotted or scoped name
/// (`a.b.c` -> `c`, `A::B` -> `B`, `ns\Foo` -> `Foo`).
pub(crate) fn last_segment(text: &str) -> &str {
    text.rsplit(['.', ':', '\\', '>'])
        .find(|s| !s.is_empty())
        .unwrap_or(text)
        .trim()
}

/// Name of the object a member access or call hangs off: trailing call or
/// index suffixes are dropped, then the rightmost identifier is kept
/// (`a.b` -> `b`, `self.items[0]` -> `items`, `get()` -> `get`).
pub(crate) fn receiver_name(text: &str) -> Option<&str> {
    let mut t = text.trim();
    while let Some(close) = t.chars().last().filter(|c| matches!(c, ')' | ']')) {
        let open = if close == ')' { '(' } else { '[' };
        let mut depth = 0usize;
        let mut cut = None;
        for (i, c) in t.char_indices().rev() {
            if c == close {
                depth += 1;
            } else if c == open {
                depth -= 1;
                if depth == 0 {
                    cut = Some(i);
                    break;
                }
            }
        }
        t = t[..cut?].trim_end();
    }
    let start = t
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric() || matches!(c, '_' | '$'))
        .last()
        .map(|(i, _)| i)?;
    let name = t[start..].trim_start_matches('$');
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::AcceptAll;
    use crate::types::ContextType;

    #[test]
    fn receiver_name_strips_calls_and_indexes() {
        assert_eq!(receiver_name("a.b"), Some("b"));
        assert_eq!(receiver_name("self.items[0]"), Some("items"));
        assert_eq!(receiver_name("client.get(url)"), Some("get"));
        assert_eq!(receiver_name("$this->db"), Some("db"));
        assert_eq!(receiver_name("$user"), Some("user"));
        assert_eq!(receiver_name("(a + b)"), None);
    }

    #[test]
    fn detect_by_extension() {
        assert_eq!(detect_language(Path::new("a.c")), Some(Lang::C));
        assert_eq!(detect_language(Path::new("a.h")), Some(Lang::C));
        assert_eq!(detect_language(Path::new("a.go")), Some(Lang::Go));
        assert_eq!(detect_language(Path::new("a.phtml")), Some(Lang::Php));
        assert_eq!(detect_language(Path::new("a.pyi")), Some(Lang::Python));
        assert_eq!(detect_language(Path::new("a.mts")), Some(Lang::TypeScript));
        assert_eq!(detect_language(Path::new("a.jsx")), Some(Lang::Tsx));
    }

    #[test]
    fn detect_unsupported_returns_none() {
        assert_eq!(detect_language(Path::new("a.rs")), None);
        assert_eq!(detect_language(Path::new("Makefile")), None);
    }

    #[test]
    fn parser_loads_all_grammars() {
        for lang in Lang::ALL {
            assert!(get_parser(lang).is_ok(), "{}", lang.name());
        }
    }

    #[test]
    fn every_grammar_classifies_nodes() {
        let ex = Extractor::new(ExtractOptions::default(), Arc::new(AcceptAll));
        for lang in Lang::ALL {
            let _ = ex.grammar(lang).types();
        }
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Extractor>();
    }

    #[test]
    fn rel_path_splits_directory_and_file() {
        assert_eq!(split_rel_path("src/a/b.go"), ("src/a".into(), "b.go".into()));
        assert_eq!(split_rel_path("b.go"), (String::new(), "b.go".into()));
    }

    #[test]
    fn relative_path_never_absolute() {
        let root = Path::new("/repo");
        assert_eq!(relative_path(Path::new("/repo/src/x.c"), root), "src/x.c");
        assert_eq!(relative_path(Path::new("/elsewhere/y.c"), root), "y.c");
    }

    #[test]
    fn last_segment_of_qualified_names() {
        assert_eq!(last_segment("a.b.c"), "c");
        assert_eq!(last_segment("A::B"), "B");
        assert_eq!(last_segment("App\\Models\\User"), "User");
        assert_eq!(last_segment("this->db"), "db");
        assert_eq!(last_segment("plain"), "plain");
    }

    #[test]
    fn extract_file_reports_input_errors() {
        let dir = tempfile::tempdir().unwrap();
        let ex = Extractor::new(ExtractOptions::default(), Arc::new(AcceptAll));

        let missing = dir.path().join("gone.go");
        assert!(matches!(ex.extract_file(&missing, dir.path()), Err(ExtractError::Io { .. })));

        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, "hello").unwrap();
        assert!(matches!(ex.extract_file(&txt, dir.path()), Err(ExtractError::Unsupported(_))));

        let folder = dir.path().join("pkg.go");
        std::fs::create_dir(&folder).unwrap();
        assert!(matches!(
            ex.extract_file(&folder, dir.path()),
            Err(ExtractError::NotRegularFile(_))
        ));
    }

    #[test]
    fn extract_file_enforces_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let opts = ExtractOptions {
            max_file_size: 8,
            ..ExtractOptions::default()
        };
        let ex = Extractor::new(opts, Arc::new(AcceptAll));
        let big = dir.path().join("big.py");
        std::fs::write(&big, "x = 1\ny = 2\n").unwrap();
        assert!(matches!(ex.extract_file(&big, dir.path()), Err(ExtractError::TooLarge { .. })));
    }

    #[test]
    fn extract_file_uses_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pkg/net")).unwrap();
        let file = dir.path().join("pkg/net/conn.go");
        std::fs::write(&file, "package net\n").unwrap();

        let ex = Extractor::new(ExtractOptions::default(), Arc::new(AcceptAll));
        let out = ex.extract_file(&file, dir.path()).unwrap();
        assert_eq!(out.directory, "pkg/net");
        assert_eq!(out.filename, "conn.go");
        assert_eq!(out.entries[0].context, ContextType::Filename);
        assert_eq!(out.entries[0].symbol, "conn");
        assert!(out.entries.iter().all(|e| e.directory == "pkg/net"));
    }

    fn strict() -> Extractor {
        let opts = ExtractOptions {
            type_gap_policy: TypeGapPolicy::Fail,
            ..ExtractOptions::default()
        };
        Extractor::new(opts, Arc::new(AcceptAll))
    }

    #[test]
    fn fail_policy_rejects_unclassified_type_nodes() {
        let err = strict()
            .extract_source(Lang::Python, "ready: not done = True\n", "flags.py")
            .unwrap_err();
        match err {
            ExtractError::UnclassifiedType { file, row, kind, .. } => {
                assert_eq!(file, "flags.py");
                assert_eq!(row, 1);
                assert_eq!(kind, "not_operator");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn implicit_string_concatenation_is_a_known_type() {
        let out = strict()
            .extract_source(Lang::Python, "x: 'A' 'B' = 1\n", "x.py")
            .unwrap();
        let x = out.entries.iter().find(|e| e.symbol == "x").unwrap();
        assert_eq!(x.context, ContextType::Variable);
        assert_eq!(x.type_name.as_deref(), Some("'A' 'B'"));
    }
}
