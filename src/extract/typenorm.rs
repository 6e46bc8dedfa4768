//! Type normalization.
//!
//! Every type-shaped node is classified purely by its kind into a
//! [`TypeStrategy`] before any of its text is read. The strategy decides how
//! the node renders: verbatim, collapsed to a keyword, or rebuilt from its
//! normalized children. Rendering is bounded in both nesting depth and output
//! length, so arbitrarily deep or wide type expressions produce short strings.

use serde::Deserialize;
use tree_sitter::{Language, Node};

use super::table::NodeTable;

/// What to do when a named type node has no entry in the type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeGapPolicy {
    /// Render nothing and log at debug level.
    Skip,
    /// Render nothing and log a warning with the node's position.
    #[default]
    Warn,
    /// Finish the file, then fail it with [`ExtractError::UnclassifiedType`].
    ///
    /// [`ExtractError::UnclassifiedType`]: crate::errors::ExtractError::UnclassifiedType
    Fail,
}

/// How a collection-like type collapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collapse {
    /// Render as a fixed keyword (`struct`, `map`, `tuple`).
    Keyword(&'static str),
    /// Keyword followed by the `name` field when present (`struct point`).
    Tagged(&'static str),
    /// Marker followed by the normalized element type (`[]int`).
    Prefix(&'static str),
    /// Normalized element type followed by a marker (`string[]`).
    Suffix(&'static str),
}

/// How a union-like type collapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widen {
    /// Render as a fixed keyword (`union`).
    Keyword(&'static str),
    /// Widen a literal type to the scalar type of its value.
    Literal,
}

/// Where a generic type keeps its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgList {
    /// Arguments are the named children of a child node of this kind.
    Child(&'static str),
    /// Arguments are the named children following the head.
    Inline,
}

/// Shape of a generic type rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericShape {
    pub args: ArgList,
    pub open: &'static str,
    pub close: &'static str,
}

/// Closed classification of type-shaped nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeStrategy {
    Simple,
    Qualified,
    WrappedPointer(&'static str),
    StructuredCollapse(Collapse),
    UnionCollapse(Widen),
    Generic(GenericShape),
    UnwrapRecurse,
    Skip,
}

/// A type node whose kind the table does not classify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeGap {
    pub row: usize,
    pub column: usize,
    pub kind: &'static str,
}

/// Per-grammar type classification table.
#[derive(Debug, Clone)]
pub struct TypeTable {
    strategies: NodeTable<TypeStrategy>,
}

impl TypeTable {
    pub fn new(language: &Language, entries: &[(&str, TypeStrategy)]) -> Self {
        Self {
            strategies: NodeTable::build(language, entries),
        }
    }

    /// Strategy for `node`. Anonymous tokens are punctuation and skip;
    /// a named node missing from the table is a classification gap (`None`).
    pub fn classify(&self, node: Node) -> Option<TypeStrategy> {
        match self.strategies.get(node) {
            Some(s) => Some(s),
            None if !node.is_named() => Some(TypeStrategy::Skip),
            None => None,
        }
    }
}

/// Bounded renderer over one source buffer.
pub struct Normalizer<'a> {
    table: &'a TypeTable,
    src: &'a [u8],
    max_len: usize,
    max_depth: usize,
}

impl<'a> Normalizer<'a> {
    pub fn new(table: &'a TypeTable, src: &'a [u8], max_len: usize, max_depth: usize) -> Self {
        Self {
            table,
            src,
            max_len,
            max_depth,
        }
    }

    /// Render `node` as a display type, recording any classification gaps.
    /// The result never exceeds the configured maximum length.
    pub fn normalize(&self, node: Node, gaps: &mut Vec<TypeGap>) -> String {
        let mut out = self.render(node, 0, gaps);
        truncate_in_place(&mut out, self.max_len);
        out
    }

    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.src).unwrap_or("")
    }

    fn render(&self, node: Node, depth: usize, gaps: &mut Vec<TypeGap>) -> String {
        let Some(strategy) = self.table.classify(node) else {
            let pos = node.start_position();
            gaps.push(TypeGap {
                row: pos.row + 1,
                column: pos.column,
                kind: node.kind(),
            });
            return String::new();
        };
        if depth > self.max_depth {
            return match strategy {
                TypeStrategy::Simple | TypeStrategy::Qualified => self.verbatim(node),
                _ => String::new(),
            };
        }

        match strategy {
            TypeStrategy::Simple | TypeStrategy::Qualified => self.verbatim(node),
            TypeStrategy::WrappedPointer(marker) => match inner(node, "type") {
                Some(inner) => format!("{marker}{}", self.render(inner, depth + 1, gaps)),
                None => marker.to_string(),
            },
            TypeStrategy::StructuredCollapse(collapse) => {
                self.collapse(node, collapse, depth, gaps)
            }
            TypeStrategy::UnionCollapse(widen) => {
                let mut cursor = node.walk();
                let named: Vec<Node> = node.named_children(&mut cursor).collect();
                match (widen, named.as_slice()) {
                    (Widen::Literal, _) => widen_literal(node).to_string(),
                    (Widen::Keyword(_), [only]) => self.render(*only, depth + 1, gaps),
                    (Widen::Keyword(k), _) => k.to_string(),
                }
            }
            TypeStrategy::Generic(shape) => self.generic(node, shape, depth, gaps),
            TypeStrategy::UnwrapRecurse => match inner(node, "type") {
                Some(inner) => self.render(inner, depth + 1, gaps),
                None => String::new(),
            },
            TypeStrategy::Skip => String::new(),
        }
    }

    fn verbatim(&self, node: Node) -> String {
        // Multi-line qualified names are rare but legal; keep one line.
        let text = self.text(node);
        if text.contains(char::is_whitespace) {
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            text.to_string()
        }
    }

    fn collapse(
        &self,
        node: Node,
        collapse: Collapse,
        depth: usize,
        gaps: &mut Vec<TypeGap>,
    ) -> String {
        match collapse {
            Collapse::Keyword(k) => k.to_string(),
            Collapse::Tagged(k) => match node.child_by_field_name("name") {
                Some(name) => format!("{k} {}", self.text(name)),
                None => k.to_string(),
            },
            Collapse::Prefix(marker) => match inner(node, "element") {
                Some(el) => format!("{marker}{}", self.render(el, depth + 1, gaps)),
                None => marker.to_string(),
            },
            Collapse::Suffix(marker) => match inner(node, "element") {
                Some(el) => format!("{}{marker}", self.render(el, depth + 1, gaps)),
                None => marker.to_string(),
            },
        }
    }

    fn generic(
        &self,
        node: Node,
        shape: GenericShape,
        depth: usize,
        gaps: &mut Vec<TypeGap>,
    ) -> String {
        let mut cursor = node.walk();
        let named: Vec<Node> = node.named_children(&mut cursor).collect();
        let Some(head) = node
            .child_by_field_name("name")
            .or_else(|| node.child_by_field_name("type"))
            .or_else(|| node.child_by_field_name("value"))
            .or_else(|| named.first().copied())
        else {
            return String::new();
        };
        let mut out = self.render(head, depth + 1, gaps);
        if depth >= self.max_depth {
            return out;
        }

        let args: Vec<Node> = match shape.args {
            ArgList::Child(kind) => named
                .iter()
                .find(|n| n.kind() == kind)
                .map(|list| {
                    let mut c = list.walk();
                    list.named_children(&mut c).collect()
                })
                .unwrap_or_default(),
            ArgList::Inline => named.iter().copied().filter(|n| n.id() != head.id()).collect(),
        };
        if args.is_empty() {
            return out;
        }

        out.push_str(shape.open);
        for (i, arg) in args.iter().enumerate() {
            if out.len() > self.max_len {
                break;
            }
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&self.render(*arg, depth + 1, gaps));
        }
        out.push_str(shape.close);
        out
    }
}

/// Inner type of a wrapper: the named field if present, else the first
/// named child.
fn inner<'t>(node: Node<'t>, field: &str) -> Option<Node<'t>> {
    node.child_by_field_name(field).or_else(|| node.named_child(0))
}

fn widen_literal(node: Node) -> &'static str {
    let Some(value) = node.named_child(0).or_else(|| node.child(0)) else {
        return "literal";
    };
    match value.kind() {
        "string" | "template_string" => "string",
        "number" | "unary_expression" => "number",
        "true" | "false" => "boolean",
        "null" => "null",
        "undefined" => "undefined",
        _ => "literal",
    }
}

/// Truncate `s` to at most `max` bytes on a char boundary.
pub(crate) fn truncate_in_place(s: &mut String, max: usize) {
    if s.len() > max {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn ts_table(lang: &Language) -> TypeTable {
        TypeTable::new(
            lang,
            &[
                ("type_annotation", TypeStrategy::UnwrapRecurse),
                ("predefined_type", TypeStrategy::Simple),
                ("type_identifier", TypeStrategy::Simple),
                ("nested_type_identifier", TypeStrategy::Qualified),
                ("array_type", TypeStrategy::StructuredCollapse(Collapse::Suffix("[]"))),
                ("union_type", TypeStrategy::UnionCollapse(Widen::Keyword("union"))),
                ("literal_type", TypeStrategy::UnionCollapse(Widen::Literal)),
                (
                    "generic_type",
                    TypeStrategy::Generic(GenericShape {
                        args: ArgList::Child("type_arguments"),
                        open: "<",
                        close: ">",
                    }),
                ),
            ],
        )
    }

    /// Render the annotation of `let x: <ty>;`.
    fn render(ty: &str, max_len: usize, max_depth: usize) -> (String, Vec<TypeGap>) {
        let lang: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        let table = ts_table(&lang);
        let mut parser = Parser::new();
        parser.set_language(&lang).unwrap();
        let src = format!("let x: {ty};");
        let tree = parser.parse(&src, None).unwrap();
        let decl = tree.root_node().named_child(0).unwrap();
        let declarator = decl.named_child(0).unwrap();
        let annotation = declarator.child_by_field_name("type").unwrap();
        let norm = Normalizer::new(&table, src.as_bytes(), max_len, max_depth);
        let mut gaps = Vec::new();
        let out = norm.normalize(annotation, &mut gaps);
        (out, gaps)
    }

    #[test]
    fn simple_types_copy_verbatim() {
        assert_eq!(render("string", 64, 8).0, "string");
        assert_eq!(render("ns.Thing", 64, 8).0, "ns.Thing");
    }

    #[test]
    fn arrays_compose_with_element() {
        assert_eq!(render("string[]", 64, 8).0, "string[]");
        assert_eq!(render("Foo[][]", 64, 8).0, "Foo[][]");
    }

    #[test]
    fn unions_collapse_to_keyword() {
        assert_eq!(render("string | number", 64, 8).0, "union");
    }

    #[test]
    fn literal_types_widen() {
        assert_eq!(render("'on'", 64, 8).0, "string");
        assert_eq!(render("42", 64, 8).0, "number");
        assert_eq!(render("true", 64, 8).0, "boolean");
    }

    #[test]
    fn generics_normalize_arguments() {
        assert_eq!(render("Map<string, Foo[]>", 64, 8).0, "Map<string, Foo[]>");
        assert_eq!(render("Promise<'a' | 'b'>", 64, 8).0, "Promise<union>");
    }

    #[test]
    fn depth_cap_drops_arguments() {
        let (out, _) = render("A<B<C<D<E>>>>", 64, 3);
        assert_eq!(out, "A<B<C>>");
    }

    #[test]
    fn output_is_bounded() {
        let wide = (0..200).map(|i| format!("T{i}")).collect::<Vec<_>>().join(", ");
        let (out, _) = render(&format!("Tuple<{wide}>"), 32, 8);
        assert!(out.len() <= 32);
        assert!(out.starts_with("Tuple<T0, T1"));
    }

    #[test]
    fn unknown_named_kinds_are_gaps() {
        let (out, gaps) = render("{ a: number }", 64, 8);
        assert_eq!(out, "");
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].kind, "object_type");
        assert_eq!(gaps[0].row, 1);
        assert_eq!(gaps[0].column, 7);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut s = "héllo".to_string();
        truncate_in_place(&mut s, 2);
        assert_eq!(s, "h");
        let mut t = "abc".to_string();
        truncate_in_place(&mut t, 10);
        assert_eq!(t, "abc");
    }
}
