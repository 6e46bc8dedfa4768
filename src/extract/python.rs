//! Python extraction.
//!
//! Python has no declarations for variables, so every simple assignment
//! target is indexed. Leading underscores decide `scope`; decorators become
//! CALL entries and known ones (`staticmethod`, `property`, ...) also feed
//! the `modifier` column of the function they decorate.

use tree_sitter::{Language, Node};

use super::context::{enclosing, within};
use super::emit::{Emitter, ordered_modifiers};
use super::table::NodeTable;
use super::typenorm::{ArgList, Collapse, GenericShape, TypeStrategy, TypeTable, Widen};
use super::{Grammar, children, last_segment, named_children, receiver_name};
use crate::types::ContextType as Ctx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Construct {
    Function,
    Class,
    Lambda,
    Parameters,
    Assignment,
    AugmentedAssignment,
    NamedExpression,
    For,
    Import,
    ImportFrom,
    Call,
    Attribute,
    Decorator,
    Except,
    Raise,
    Comment,
    Str,
}

const NODES: &[(&str, Construct)] = &[
    ("function_definition", Construct::Function),
    ("class_definition", Construct::Class),
    ("lambda", Construct::Lambda),
    ("parameters", Construct::Parameters),
    ("lambda_parameters", Construct::Parameters),
    ("assignment", Construct::Assignment),
    ("augmented_assignment", Construct::AugmentedAssignment),
    ("named_expression", Construct::NamedExpression),
    ("for_statement", Construct::For),
    ("for_in_clause", Construct::For),
    ("import_statement", Construct::Import),
    ("import_from_statement", Construct::ImportFrom),
    ("call", Construct::Call),
    ("attribute", Construct::Attribute),
    ("decorator", Construct::Decorator),
    ("except_clause", Construct::Except),
    ("except_group_clause", Construct::Except),
    ("raise_statement", Construct::Raise),
    ("comment", Construct::Comment),
    ("string", Construct::Str),
];

const TYPES: &[(&str, TypeStrategy)] = &[
    ("type", TypeStrategy::UnwrapRecurse),
    ("identifier", TypeStrategy::Simple),
    ("none", TypeStrategy::Simple),
    ("string", TypeStrategy::Simple),
    ("integer", TypeStrategy::Simple),
    ("float", TypeStrategy::Simple),
    ("true", TypeStrategy::Simple),
    ("false", TypeStrategy::Simple),
    ("ellipsis", TypeStrategy::Simple),
    ("attribute", TypeStrategy::Qualified),
    ("member_type", TypeStrategy::Qualified),
    (
        "generic_type",
        TypeStrategy::Generic(GenericShape {
            args: ArgList::Child("type_parameter"),
            open: "[",
            close: "]",
        }),
    ),
    (
        "subscript",
        TypeStrategy::Generic(GenericShape {
            args: ArgList::Inline,
            open: "[",
            close: "]",
        }),
    ),
    ("union_type", TypeStrategy::UnionCollapse(Widen::Keyword("union"))),
    ("binary_operator", TypeStrategy::UnionCollapse(Widen::Keyword("union"))),
    ("list", TypeStrategy::StructuredCollapse(Collapse::Keyword("list"))),
    ("tuple", TypeStrategy::StructuredCollapse(Collapse::Keyword("tuple"))),
    ("dictionary", TypeStrategy::StructuredCollapse(Collapse::Keyword("dict"))),
    ("constrained_type", TypeStrategy::UnwrapRecurse),
    ("parenthesized_expression", TypeStrategy::UnwrapRecurse),
    ("splat_type", TypeStrategy::Skip),
    ("call", TypeStrategy::Skip),
    ("concatenated_string", TypeStrategy::Simple),
];

/// Modifier order: decorators first, then `async`.
const MODIFIERS: &[&str] = &["abstract", "static", "classmethod", "property", "async"];

pub(crate) struct Tables {
    nodes: NodeTable<Construct>,
    types: TypeTable,
}

impl Tables {
    pub(crate) fn new(language: &Language) -> Self {
        Self {
            nodes: NodeTable::build(language, NODES),
            types: TypeTable::new(language, TYPES),
        }
    }
}

impl Grammar for Tables {
    fn types(&self) -> &TypeTable {
        &self.types
    }

    fn walk(&self, root: Node, em: &mut Emitter) {
        Visitor { t: self, em }.visit(root);
    }
}

/// `_x` and `__x` are private; dunder names are public.
fn underscore_scope(name: &str) -> &'static str {
    if name.starts_with('_') && !(name.starts_with("__") && name.ends_with("__")) {
        "private"
    } else {
        "public"
    }
}

struct Visitor<'v, 'a> {
    t: &'v Tables,
    em: &'v mut Emitter<'a>,
}

impl<'a, 't> Visitor<'_, 'a> {
    fn visit(&mut self, node: Node<'t>) {
        let Some(construct) = self.t.nodes.get(node) else {
            self.recurse(node);
            return;
        };
        match construct {
            Construct::Function => self.function(node),
            Construct::Class => self.class(node),
            Construct::Lambda => self.recurse(node),
            Construct::Parameters => self.parameters(node),
            Construct::Assignment => self.assignment(node),
            Construct::AugmentedAssignment => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.visit(left);
                }
                if let Some(right) = node.child_by_field_name("right") {
                    self.visit(right);
                }
            }
            Construct::NamedExpression => self.named_expression(node),
            Construct::For => self.for_loop(node),
            Construct::Import => self.import(node),
            Construct::ImportFrom => self.import_from(node),
            Construct::Call => {
                self.call(node, None);
            }
            Construct::Attribute => self.attribute(node),
            Construct::Decorator => self.decorator(node),
            Construct::Except => self.except(node),
            Construct::Raise => self.raise(node),
            Construct::Comment => self.em.words(node, Ctx::Comment, None),
            Construct::Str => {
                let parent = self.parent(node);
                self.em.words(node, Ctx::String, parent);
            }
        }
    }

    fn recurse(&mut self, node: Node<'t>) {
        for child in children(node) {
            self.visit(child);
        }
    }

    /// Name of the enclosing function or class.
    fn parent(&self, node: Node<'t>) -> Option<&'a str> {
        enclosing(node, &self.t.nodes, |k| matches!(k, Construct::Function | Construct::Class))
            .and_then(|(n, _)| self.em.field_text(n, "name"))
    }

    fn enclosing_kind(&self, node: Node<'t>) -> Option<Construct> {
        enclosing(node, &self.t.nodes, |k| {
            matches!(k, Construct::Function | Construct::Class | Construct::Lambda)
        })
        .map(|(_, k)| k)
    }

    fn is_local(&self, node: Node<'t>) -> bool {
        within(
            node,
            &self.t.nodes,
            |k| matches!(k, Construct::Function | Construct::Lambda),
            |k| k == Construct::Class,
        )
    }

    fn function(&mut self, node: Node<'t>) {
        if let Some(name) = self.em.field_text(node, "name") {
            let mut found: Vec<&str> = Vec::new();
            if let Some(decorated) = node.parent().filter(|p| p.kind() == "decorated_definition") {
                let decorators =
                    named_children(decorated).into_iter().filter(|c| c.kind() == "decorator");
                for dec in decorators {
                    match last_segment(self.em.text(dec).trim_start_matches('@').trim()) {
                        "abstractmethod" => found.push("abstract"),
                        "staticmethod" => found.push("static"),
                        "classmethod" => found.push("classmethod"),
                        "property" => found.push("property"),
                        _ => {}
                    }
                }
            }
            if children(node).iter().any(|c| c.kind() == "async") {
                found.push("async");
            }
            let ty = self.em.field_type(node, "return_type");
            let local = self.is_local(node);
            self.em
                .entry(name, node, Ctx::Function)
                .parent(self.parent(node))
                .scope(if local { "local" } else { underscore_scope(name) })
                .modifier(ordered_modifiers(&found, MODIFIERS))
                .type_name(ty)
                .emit(self.em);
        }
        for field in ["parameters", "body"] {
            if let Some(child) = node.child_by_field_name(field) {
                self.visit(child);
            }
        }
    }

    fn class(&mut self, node: Node<'t>) {
        if let Some(name) = self.em.field_text(node, "name") {
            let base = node
                .child_by_field_name("superclasses")
                .and_then(|s| {
                    named_children(s).into_iter().find(|c| c.kind() != "keyword_argument")
                })
                .map(|b| self.em.text(b));
            self.em
                .entry(name, node, Ctx::Class)
                .parent(self.parent(node))
                .scope(underscore_scope(name))
                .type_name(base)
                .emit(self.em);
        }
        if let Some(sup) = node.child_by_field_name("superclasses") {
            self.visit(sup);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body);
        }
    }

    fn parameters(&mut self, node: Node<'t>) {
        let parent = self.parent(node);
        for param in named_children(node) {
            let (name_node, type_node, default, variadic) = match param.kind() {
                "identifier" => (Some(param), None, None, false),
                "typed_parameter" => {
                    let inner = named_children(param).into_iter().next();
                    let variadic = inner.is_some_and(|n| n.kind().ends_with("splat_pattern"));
                    let name = if variadic { inner.and_then(|n| n.named_child(0)) } else { inner };
                    (name, param.child_by_field_name("type"), None, variadic)
                }
                "default_parameter" | "typed_default_parameter" => (
                    param.child_by_field_name("name"),
                    param.child_by_field_name("type"),
                    param.child_by_field_name("value"),
                    false,
                ),
                "list_splat_pattern" | "dictionary_splat_pattern" => {
                    (param.named_child(0), None, None, true)
                }
                _ => (None, None, None, false),
            };
            if let Some(n) = name_node.filter(|n| n.kind() == "identifier") {
                let name = self.em.text(n);
                let ty = type_node.and_then(|t| self.em.type_of(t));
                self.em
                    .entry(name, n, Ctx::Argument)
                    .parent(parent)
                    .clue(variadic.then_some("variadic"))
                    .type_name(ty)
                    .emit(self.em);
            }
            if let Some(value) = default {
                self.visit(value);
            }
        }
    }

    /// Emit one binding per identifier of an assignment target.
    fn bind(&mut self, target: Node<'t>, ty: Option<String>, value: Option<Node<'t>>) {
        match target.kind() {
            "identifier" => {
                let name = self.em.text(target);
                let lambda = value.is_some_and(|v| v.kind() == "lambda");
                let in_class = self.enclosing_kind(target) == Some(Construct::Class);
                let (context, scope) = if lambda {
                    (Ctx::Lambda, None)
                } else if in_class {
                    (Ctx::Property, Some(underscore_scope(name)))
                } else {
                    (Ctx::Variable, None)
                };
                let scope = if self.is_local(target) {
                    Some("local")
                } else {
                    scope.or(Some(underscore_scope(name)))
                };
                self.em
                    .entry(name, target, context)
                    .parent(self.parent(target))
                    .scope(scope)
                    .type_name(ty)
                    .emit(self.em);
            }
            "pattern_list" | "tuple_pattern" | "list_pattern" => {
                for inner in named_children(target) {
                    self.bind(inner, None, None);
                }
            }
            "list_splat_pattern" => {
                if let Some(inner) = target.named_child(0) {
                    self.bind(inner, None, None);
                }
            }
            // Attribute and subscript targets are references, not bindings.
            _ => self.visit(target),
        }
    }

    fn assignment(&mut self, node: Node<'t>) {
        let right = node.child_by_field_name("right");
        if let Some(left) = node.child_by_field_name("left") {
            let ty = self.em.field_type(node, "type");
            self.bind(left, ty, right);
        }
        if let Some(r) = right {
            self.visit(r);
        }
    }

    fn named_expression(&mut self, node: Node<'t>) {
        let value = node.child_by_field_name("value");
        if let Some(name) = node.child_by_field_name("name") {
            self.bind(name, None, value);
        }
        if let Some(v) = value {
            self.visit(v);
        }
    }

    fn for_loop(&mut self, node: Node<'t>) {
        if let Some(left) = node.child_by_field_name("left") {
            self.bind(left, None, None);
        }
        for child in named_children(node) {
            if Some(child) != node.child_by_field_name("left") {
                self.visit(child);
            }
        }
    }

    fn import(&mut self, node: Node<'t>) {
        for name in named_children(node) {
            self.import_name(name, None);
        }
    }

    fn import_from(&mut self, node: Node<'t>) {
        let module_node = node.child_by_field_name("module_name");
        let module = module_node.map(|m| self.em.text(m));
        if let (Some(m), Some(text)) = (module_node, module) {
            self.em.entry(text, m, Ctx::Import).emit_unfiltered(self.em);
        }
        for name in named_children(node) {
            if Some(name) == module_node {
                continue;
            }
            self.import_name(name, module);
        }
    }

    fn import_name(&mut self, node: Node<'t>, module: Option<&str>) {
        let (target, alias) = match node.kind() {
            "dotted_name" => (node, None),
            "aliased_import" => match node.child_by_field_name("name") {
                Some(n) => (n, self.em.field_text(node, "alias")),
                None => return,
            },
            _ => return,
        };
        let text = self.em.text(target);
        self.em
            .entry(text, target, Ctx::Import)
            .parent(module)
            .clue(alias)
            .emit_unfiltered(self.em);
    }

    /// Emit the CALL entry for `node` and visit its receiver and arguments.
    /// Returns the called name.
    fn call(&mut self, node: Node<'t>, clue: Option<&str>) -> Option<&'a str> {
        let clue = clue.or_else(|| node.parent().filter(|p| p.kind() == "await").map(|_| "await"));
        let function = node.child_by_field_name("function");
        let mut name = None;
        match function {
            Some(f) if f.kind() == "identifier" => {
                let text = self.em.text(f);
                name = Some(text);
                self.em.entry(text, f, Ctx::Call).clue(clue).emit(self.em);
            }
            Some(f) if f.kind() == "attribute" => {
                let object = f.child_by_field_name("object");
                if let Some(attr) = f.child_by_field_name("attribute") {
                    let text = self.em.text(attr);
                    name = Some(text);
                    let receiver = object.and_then(|o| receiver_name(self.em.text(o)));
                    self.em
                        .entry(text, attr, Ctx::Call)
                        .parent(receiver)
                        .clue(clue)
                        .emit(self.em);
                }
                if let Some(o) = object {
                    self.visit(o);
                }
            }
            Some(f) => self.visit(f),
            None => {}
        }
        if let Some(args) = node.child_by_field_name("arguments") {
            self.arguments(args, name);
        }
        name
    }

    fn arguments(&mut self, args: Node<'t>, callee: Option<&str>) {
        for arg in named_children(args) {
            let bare = match arg.kind() {
                "identifier" => Some(arg),
                "keyword_argument" => arg
                    .child_by_field_name("value")
                    .filter(|v| v.kind() == "identifier"),
                _ => None,
            };
            match bare {
                Some(id) => {
                    let text = self.em.text(id);
                    self.em
                        .entry(text, id, Ctx::Argument)
                        .parent(self.parent(id))
                        .clue(callee)
                        .emit_unfiltered(self.em);
                }
                None if arg.kind() == "keyword_argument" => {
                    if let Some(v) = arg.child_by_field_name("value") {
                        self.visit(v);
                    }
                }
                None => self.visit(arg),
            }
        }
    }

    fn attribute(&mut self, node: Node<'t>) {
        let object = node.child_by_field_name("object");
        if let Some(attr) = node.child_by_field_name("attribute") {
            let name = self.em.text(attr);
            let receiver = object.and_then(|o| receiver_name(self.em.text(o)));
            self.em.entry(name, attr, Ctx::Property).parent(receiver).emit(self.em);
        }
        if let Some(o) = object {
            self.visit(o);
        }
    }

    fn decorator(&mut self, node: Node<'t>) {
        let Some(expr) = node.named_child(0) else {
            return;
        };
        match expr.kind() {
            "call" => {
                self.call(expr, Some("decorator"));
            }
            "identifier" => {
                let text = self.em.text(expr);
                self.em.entry(text, expr, Ctx::Call).clue("decorator").emit(self.em);
            }
            "attribute" => {
                let object = expr.child_by_field_name("object");
                if let Some(attr) = expr.child_by_field_name("attribute") {
                    let text = self.em.text(attr);
                    let receiver = object.and_then(|o| receiver_name(self.em.text(o)));
                    self.em
                        .entry(text, attr, Ctx::Call)
                        .parent(receiver)
                        .clue("decorator")
                        .emit(self.em);
                }
            }
            _ => self.visit(expr),
        }
    }

    /// Emit an EXCEPTION entry for every class named by `node`.
    fn exception_types(&mut self, node: Node<'t>, clue: &str) {
        match node.kind() {
            "identifier" | "attribute" => {
                let name = last_segment(self.em.text(node));
                self.em
                    .entry(name, node, Ctx::Exception)
                    .parent(self.parent(node))
                    .clue(clue)
                    .emit(self.em);
            }
            "tuple" | "parenthesized_expression" | "expression_list" => {
                for inner in named_children(node) {
                    self.exception_types(inner, clue);
                }
            }
            _ => self.visit(node),
        }
    }

    fn except(&mut self, node: Node<'t>) {
        for child in named_children(node) {
            match child.kind() {
                "as_pattern" => {
                    if let Some(ty) = child.named_child(0) {
                        self.exception_types(ty, "except");
                    }
                    let alias = child.child_by_field_name("alias").and_then(|a| a.named_child(0));
                    if let Some(alias) = alias {
                        self.bind(alias, None, None);
                    }
                }
                "block" => self.visit(child),
                _ if child.kind() == "identifier" && node.named_child(0) != Some(child) => {
                    // `except E, e:` style alias
                    self.bind(child, None, None);
                }
                _ => self.exception_types(child, "except"),
            }
        }
    }

    fn raise(&mut self, node: Node<'t>) {
        let Some(expr) = node.named_child(0) else {
            return;
        };
        match expr.kind() {
            "call" => {
                if let Some(f) = expr.child_by_field_name("function") {
                    self.exception_types(f, "raise");
                }
                if let Some(args) = expr.child_by_field_name("arguments") {
                    self.arguments(args, None);
                }
            }
            _ => self.exception_types(expr, "raise"),
        }
        for rest in named_children(node).into_iter().skip(1) {
            self.visit(rest);
        }
    }
}
