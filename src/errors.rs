//! Application error types and user-facing error formatting.
//!
//! Provides structured error types for each layer:
//! - [`ExtractError`] for per-file extraction failures (the batch continues)
//! - [`SymdexError`] as the unified top-level error type
//!
//! The [`SymdexError`] type carries contextual hints and exit codes so that
//! `main()` can present human-readable diagnostics on stderr without ever
//! exposing raw panics or debug formatting.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

/// Process exit codes.
///
/// * `0` - success
/// * `1` - general runtime error
/// * `2` - usage / argument error (bad CLI invocation)
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

// ---------------------------------------------------------------------------
// Layer-specific error types
// ---------------------------------------------------------------------------

/// Errors arising while extracting a single file.
///
/// None of these abort a batch: the pipeline reports the error, skips the
/// file and moves on to the next one.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path exists but is a directory, socket, or similar.
    #[error("not a regular file: {}", .0.display())]
    NotRegularFile(PathBuf),

    /// The file extension does not map to a supported language.
    #[error("unsupported language: {}", .0.display())]
    Unsupported(PathBuf),

    /// The file exceeds the configured size limit.
    #[error("{} is {size} bytes, over the {limit} byte limit", .path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    /// The parser gave up without producing a tree.
    #[error("parse failed: {}", .0.display())]
    ParseFailed(PathBuf),

    /// The grammar could not be loaded into a parser (ABI mismatch).
    #[error("cannot load {lang} grammar: {reason}")]
    Grammar { lang: &'static str, reason: String },

    /// A type-shaped node whose kind has no entry in the type table.
    #[error("unclassified type node `{kind}` at {file}:{row}:{column}")]
    UnclassifiedType {
        file: String,
        row: usize,
        column: usize,
        kind: String,
    },
}

// ---------------------------------------------------------------------------
// Unified application error
// ---------------------------------------------------------------------------

/// Unified error type for the entire application.
#[derive(Error, Debug)]
pub enum SymdexError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// A malformed or unreadable configuration file.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A usage / argument error (exit code 2).
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SymdexError {
    /// Return the appropriate process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SymdexError::Usage(_) => EXIT_USAGE,
            _ => EXIT_ERROR,
        }
    }

    /// Return an optional human-readable hint that may help the user fix
    /// the problem.  Returns `None` when no specific guidance applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            SymdexError::Extract(ExtractError::Unsupported(_)) => {
                Some("supported extensions: c h go php py pyi ts tsx js jsx mjs cjs")
            }
            SymdexError::Extract(ExtractError::UnclassifiedType { .. }) => {
                Some("set `type_gap_policy = \"warn\"` under [extract] to skip unknown type nodes")
            }
            SymdexError::Extract(ExtractError::TooLarge { .. }) => {
                Some("raise `max_file_size_kb` under [extract] in .symdex/config.toml")
            }
            SymdexError::Extract(ExtractError::Grammar { .. }) => {
                Some("the bundled grammar does not match the tree-sitter runtime version")
            }
            SymdexError::Config(_) => Some("check .symdex/config.toml for syntax errors"),
            SymdexError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Some("verify the file or directory exists")
            }
            SymdexError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Some("check file permissions")
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_usage() {
        let err = SymdexError::Usage("bad flag".into());
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }

    #[test]
    fn exit_code_general() {
        let err = SymdexError::Extract(ExtractError::ParseFailed("a.go".into()));
        assert_eq!(err.exit_code(), EXIT_ERROR);
    }

    #[test]
    fn hint_unsupported_lists_extensions() {
        let err = SymdexError::Extract(ExtractError::Unsupported("notes.txt".into()));
        assert!(err.hint().unwrap().contains("go"));
    }

    #[test]
    fn hint_type_gap_mentions_policy() {
        let err = SymdexError::Extract(ExtractError::UnclassifiedType {
            file: "a.ts".into(),
            row: 3,
            column: 9,
            kind: "mystery_type".into(),
        });
        assert!(err.hint().unwrap().contains("type_gap_policy"));
    }

    #[test]
    fn hint_io_not_found() {
        let err = SymdexError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(err.hint().unwrap().contains("exists"));
    }

    #[test]
    fn hint_none_for_other() {
        let err = SymdexError::Other(anyhow::anyhow!("something went wrong"));
        assert!(err.hint().is_none());
    }

    #[test]
    fn unclassified_display_carries_node_context() {
        let err = ExtractError::UnclassifiedType {
            file: "src/a.ts".into(),
            row: 12,
            column: 4,
            kind: "mystery_type".into(),
        };
        assert_eq!(
            err.to_string(),
            "unclassified type node `mystery_type` at src/a.ts:12:4"
        );
    }

    #[test]
    fn io_error_keeps_path_and_source() {
        let err = ExtractError::Io {
            path: "missing.c".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("missing.c"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn symdex_error_from_extract_error() {
        let err: SymdexError = ExtractError::NotRegularFile("dir".into()).into();
        assert!(matches!(err, SymdexError::Extract(ExtractError::NotRegularFile(_))));
    }

    #[test]
    fn display_no_debug_formatting() {
        let err = SymdexError::Extract(ExtractError::ParseFailed("x.py".into()));
        let msg = format!("{err}");
        assert_eq!(msg, "parse failed: x.py");
        assert!(!msg.contains("ParseFailed"));
    }
}
