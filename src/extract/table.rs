//! Node classification tables.
//!
//! A [`NodeTable`] maps a grammar's node kinds to a compact, caller-defined
//! code. It is built once per grammar by scanning every kind id the grammar
//! declares, so aliased kinds (several ids sharing one name) all resolve to
//! the same code. Lookups are a single indexed load on `kind_id`.

use tree_sitter::{Language, Node};

/// Immutable kind-id to code lookup for one grammar.
#[derive(Debug, Clone)]
pub struct NodeTable<K> {
    codes: Vec<Option<K>>,
}

impl<K: Copy> NodeTable<K> {
    /// Build a table from `(kind name, code)` pairs.
    ///
    /// Only named node kinds are matched. Names the grammar does not declare
    /// are ignored so that one entry list can serve closely related grammars
    /// (TypeScript and TSX).
    pub fn build(language: &Language, entries: &[(&str, K)]) -> Self {
        let count = language.node_kind_count();
        let mut codes = vec![None; count];
        let mut matched = vec![false; entries.len()];

        for id in 0..count {
            let id = id as u16;
            if !language.node_kind_is_named(id) {
                continue;
            }
            let Some(name) = language.node_kind_for_id(id) else {
                continue;
            };
            if let Some(pos) = entries.iter().position(|(n, _)| *n == name) {
                codes[id as usize] = Some(entries[pos].1);
                matched[pos] = true;
            }
        }

        for ((name, _), found) in entries.iter().zip(&matched) {
            if !found {
                tracing::debug!(kind = name, "node kind not declared by grammar");
            }
        }

        Self { codes }
    }

    /// Code of `node`'s kind, or `None` when the kind is not classified.
    pub fn get(&self, node: Node) -> Option<K> {
        self.codes.get(node.kind_id() as usize).copied().flatten()
    }

    /// Number of kind ids that resolved to a code.
    pub fn len(&self) -> usize {
        self.codes.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
