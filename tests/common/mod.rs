//! Shared helpers for the per-language extraction tests.

#![allow(dead_code)]

use std::sync::Arc;

use symdex::extract::{ExtractOptions, Extractor, Lang};
use symdex::filter::AcceptAll;
use symdex::types::{ContextType, SymbolEntry};

pub fn extractor() -> Extractor {
    Extractor::new(ExtractOptions::default(), Arc::new(AcceptAll))
}

/// Extract `src` as `rel_path` with every word accepted.
pub fn extract(lang: Lang, src: &str, rel_path: &str) -> Vec<SymbolEntry> {
    extractor().extract_source(lang, src, rel_path).unwrap().entries
}

/// Symbols of every entry with the given context, in emission order.
pub fn symbols(entries: &[SymbolEntry], ctx: ContextType) -> Vec<&str> {
    entries
        .iter()
        .filter(|e| e.context == ctx)
        .map(|e| e.symbol.as_str())
        .collect()
}

/// The first entry with this context and symbol; panics with the full
/// entry list when there is none.
pub fn find<'e>(entries: &'e [SymbolEntry], ctx: ContextType, symbol: &str) -> &'e SymbolEntry {
    entries
        .iter()
        .find(|e| e.context == ctx && e.symbol == symbol)
        .unwrap_or_else(|| panic!("no {ctx:?} entry for {symbol:?} in {entries:#?}"))
}

/// Like [`find`], additionally matching the entry's parent.
pub fn find_child<'e>(
    entries: &'e [SymbolEntry],
    ctx: ContextType,
    symbol: &str,
    parent: &str,
) -> &'e SymbolEntry {
    entries
        .iter()
        .find(|e| e.context == ctx && e.symbol == symbol && e.parent.as_deref() == Some(parent))
        .unwrap_or_else(|| panic!("no {ctx:?} entry for {symbol:?} under {parent:?}"))
}

pub fn has(entries: &[SymbolEntry], ctx: ContextType, symbol: &str) -> bool {
    entries.iter().any(|e| e.context == ctx && e.symbol == symbol)
}
