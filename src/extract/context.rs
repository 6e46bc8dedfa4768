//! Context resolution: recovering the enclosing class, function or namespace
//! of a node.
//!
//! Two policies cover every supported grammar. Wrapper constructs (classes,
//! functions, block namespaces) are found by walking parent links. Statement
//! constructs that govern the rest of the file without wrapping it (PHP
//! `namespace Foo;`, Go `package foo`) are found among the root's children
//! that start before the target. Each lookup is independent and uncached.

use tree_sitter::Node;

use super::table::NodeTable;

/// Nearest ancestor of `node` whose code satisfies `accept`.
pub fn enclosing<'t, K: Copy>(
    node: Node<'t>,
    table: &NodeTable<K>,
    accept: impl Fn(K) -> bool,
) -> Option<(Node<'t>, K)> {
    let mut current = node.parent();
    while let Some(n) = current {
        if let Some(code) = table.get(n)
            && accept(code)
        {
            return Some((n, code));
        }
        current = n.parent();
    }
    None
}

/// Last top-level child of `root` that starts before `target` and whose code
/// satisfies `accept`.
pub fn preceding_sibling<'t, K: Copy>(
    root: Node<'t>,
    target: Node<'t>,
    table: &NodeTable<K>,
    accept: impl Fn(K) -> bool,
) -> Option<(Node<'t>, K)> {
    let start = target.start_byte();
    let mut found = None;
    for i in 0..root.child_count() {
        let Some(child) = root.child(i as u32) else {
            continue;
        };
        if child.start_byte() >= start {
            break;
        }
        if let Some(code) = table.get(child)
            && accept(code)
        {
            found = Some((child, code));
        }
    }
    found
}

/// Whether `node` lies inside an ancestor whose code satisfies `accept`,
/// stopping at the first ancestor that satisfies `stop`.
pub fn within<K: Copy>(
    node: Node,
    table: &NodeTable<K>,
    accept: impl Fn(K) -> bool,
    stop: impl Fn(K) -> bool,
) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        if let Some(code) = table.get(n) {
            if accept(code) {
                return true;
            }
            if stop(code) {
                return false;
            }
        }
        current = n.parent();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::{Language, Parser};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Code {
        Namespace,
        Class,
        Method,
    }

    fn php() -> (Language, NodeTable<Code>) {
        let lang: Language = tree_sitter_php::LANGUAGE_PHP.into();
        let table = NodeTable::build(
            &lang,
            &[
                ("namespace_definition", Code::Namespace),
                ("class_declaration", Code::Class),
                ("method_declaration", Code::Method),
            ],
        );
        (lang, table)
    }

    fn find<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
        let mut out = Vec::new();
        if node.kind() == kind {
            out.push(node);
        }
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i as u32) {
                out.extend(find(child, kind));
            }
        }
        out
    }

    #[test]
    fn ancestor_search_finds_enclosing_class() {
        let (lang, table) = php();
        let mut parser = Parser::new();
        parser.set_language(&lang).unwrap();
        let src = "<?php class Foo { function bar() { baz(); } }";
        let tree = parser.parse(src, None).unwrap();
        let call = find(tree.root_node(), "function_call_expression")[0];

        let (class, code) = enclosing(call, &table, |k| k == Code::Class).unwrap();
        assert_eq!(code, Code::Class);
        let name = class.child_by_field_name("name").unwrap();
        assert_eq!(name.utf8_text(src.as_bytes()).unwrap(), "Foo");
        assert!(enclosing(call, &table, |k| k == Code::Namespace).is_none());
    }

    #[test]
    fn sibling_search_takes_last_preceding_namespace() {
        let (lang, table) = php();
        let mut parser = Parser::new();
        parser.set_language(&lang).unwrap();
        let src = "<?php\nnamespace A;\nclass X {}\nnamespace B;\nclass Y {}\n";
        let tree = parser.parse(src, None).unwrap();
        let classes = find(tree.root_node(), "class_declaration");
        let ns_of = |target: Node| {
            preceding_sibling(tree.root_node(), target, &table, |k| k == Code::Namespace)
                .and_then(|(n, _)| n.child_by_field_name("name"))
                .map(|n| n.utf8_text(src.as_bytes()).unwrap().to_string())
        };
        assert_eq!(ns_of(classes[0]).as_deref(), Some("A"));
        assert_eq!(ns_of(classes[1]).as_deref(), Some("B"));
    }

    #[test]
    fn within_stops_at_barrier() {
        let (lang, table) = php();
        let mut parser = Parser::new();
        parser.set_language(&lang).unwrap();
        let src = "<?php class Foo { function bar() { baz(); } }";
        let tree = parser.parse(src, None).unwrap();
        let call = find(tree.root_node(), "function_call_expression")[0];
        assert!(within(call, &table, |k| k == Code::Method, |k| k == Code::Class));
        assert!(!within(call, &table, |k| k == Code::Namespace, |k| k == Code::Method));
    }
}
