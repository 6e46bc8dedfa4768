//! Language-parameterized symbol extraction.
//!
//! Source files in C, Go, PHP, Python and TypeScript/TSX are parsed with
//! tree-sitter and normalized into one stream of typed [`SymbolEntry`]
//! records. [`extract::Extractor`] handles one file at a time;
//! [`pipeline::extract_paths`] runs a batch in parallel and hands results
//! to an [`pipeline::EntrySink`].
//!
//! [`SymbolEntry`]: types::SymbolEntry

pub mod config;
pub mod errors;
pub mod extract;
pub mod filter;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod walker;
