//! TypeScript and TSX extraction.
//!
//! The TSX grammar also parses plain JavaScript and JSX, so this visitor
//! serves `.js` files too. Namespaces (`namespace X {}`, `declare module`)
//! wrap their members and are found by ancestor search.

use tree_sitter::{Language, Node};

use super::context::{enclosing, within};
use super::emit::{Emitter, ordered_modifiers};
use super::table::NodeTable;
use super::typenorm::{ArgList, Collapse, GenericShape, TypeStrategy, TypeTable, Widen};
use super::{Grammar, child_of_kind, children, last_segment, named_children, receiver_name, unquote};
use crate::types::ContextType as Ctx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Construct {
    Function,
    Class,
    Interface,
    TypeAlias,
    Enum,
    Module,
    Method,
    PropertySignature,
    Field,
    Declarator,
    Parameter,
    Arrow,
    FunctionExpr,
    Call,
    New,
    Member,
    Import,
    Export,
    Catch,
    Throw,
    Labeled,
    Break,
    Continue,
    Decorator,
    Comment,
    Str,
}

const NODES: &[(&str, Construct)] = &[
    ("function_declaration", Construct::Function),
    ("generator_function_declaration", Construct::Function),
    ("function_signature", Construct::Function),
    ("class_declaration", Construct::Class),
    ("abstract_class_declaration", Construct::Class),
    ("class", Construct::Class),
    ("interface_declaration", Construct::Interface),
    ("type_alias_declaration", Construct::TypeAlias),
    ("enum_declaration", Construct::Enum),
    ("internal_module", Construct::Module),
    ("module", Construct::Module),
    ("method_definition", Construct::Method),
    ("method_signature", Construct::Method),
    ("abstract_method_signature", Construct::Method),
    ("property_signature", Construct::PropertySignature),
    ("public_field_definition", Construct::Field),
    ("field_definition", Construct::Field),
    ("variable_declarator", Construct::Declarator),
    ("required_parameter", Construct::Parameter),
    ("optional_parameter", Construct::Parameter),
    ("arrow_function", Construct::Arrow),
    ("function_expression", Construct::FunctionExpr),
    ("function", Construct::FunctionExpr),
    ("generator_function", Construct::FunctionExpr),
    ("call_expression", Construct::Call),
    ("new_expression", Construct::New),
    ("member_expression", Construct::Member),
    ("import_statement", Construct::Import),
    ("export_statement", Construct::Export),
    ("catch_clause", Construct::Catch),
    ("throw_statement", Construct::Throw),
    ("labeled_statement", Construct::Labeled),
    ("break_statement", Construct::Break),
    ("continue_statement", Construct::Continue),
    ("decorator", Construct::Decorator),
    ("comment", Construct::Comment),
    ("string", Construct::Str),
    ("template_string", Construct::Str),
];

const TYPES: &[(&str, TypeStrategy)] = &[
    ("type_annotation", TypeStrategy::UnwrapRecurse),
    ("opting_type_annotation", TypeStrategy::UnwrapRecurse),
    ("omitting_type_annotation", TypeStrategy::UnwrapRecurse),
    ("type_predicate_annotation", TypeStrategy::UnwrapRecurse),
    ("asserts_annotation", TypeStrategy::Skip),
    ("predefined_type", TypeStrategy::Simple),
    ("type_identifier", TypeStrategy::Simple),
    ("identifier", TypeStrategy::Simple),
    ("this_type", TypeStrategy::Simple),
    ("existential_type", TypeStrategy::Simple),
    ("nested_type_identifier", TypeStrategy::Qualified),
    (
        "generic_type",
        TypeStrategy::Generic(GenericShape {
            args: ArgList::Child("type_arguments"),
            open: "<",
            close: ">",
        }),
    ),
    ("array_type", TypeStrategy::StructuredCollapse(Collapse::Suffix("[]"))),
    ("tuple_type", TypeStrategy::StructuredCollapse(Collapse::Keyword("tuple"))),
    ("object_type", TypeStrategy::StructuredCollapse(Collapse::Keyword("object"))),
    ("function_type", TypeStrategy::StructuredCollapse(Collapse::Keyword("function"))),
    ("constructor_type", TypeStrategy::StructuredCollapse(Collapse::Keyword("constructor"))),
    ("type_query", TypeStrategy::StructuredCollapse(Collapse::Keyword("typeof"))),
    ("index_type_query", TypeStrategy::StructuredCollapse(Collapse::Keyword("keyof"))),
    ("conditional_type", TypeStrategy::StructuredCollapse(Collapse::Keyword("conditional"))),
    ("template_literal_type", TypeStrategy::StructuredCollapse(Collapse::Keyword("string"))),
    ("type_predicate", TypeStrategy::StructuredCollapse(Collapse::Keyword("boolean"))),
    ("union_type", TypeStrategy::UnionCollapse(Widen::Keyword("union"))),
    ("intersection_type", TypeStrategy::UnionCollapse(Widen::Keyword("intersection"))),
    ("literal_type", TypeStrategy::UnionCollapse(Widen::Literal)),
    ("parenthesized_type", TypeStrategy::UnwrapRecurse),
    ("readonly_type", TypeStrategy::UnwrapRecurse),
    ("optional_type", TypeStrategy::UnwrapRecurse),
    ("rest_type", TypeStrategy::UnwrapRecurse),
    ("lookup_type", TypeStrategy::Skip),
    ("infer_type", TypeStrategy::Skip),
];

const MODIFIERS: &[&str] = &[
    "export",
    "default",
    "declare",
    "abstract",
    "static",
    "override",
    "readonly",
    "const",
    "async",
    "get",
    "set",
    "generator",
];

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

/// Keyword children that feed the `modifier` column, plus the export
/// context of the declaration.
fn modifiers(node: Node) -> Vec<&'static str> {
    let mut found = Vec::new();
    let export = node
        .parent()
        .filter(|p| p.kind() == "export_statement")
        .or_else(|| {
            // `export const x = ...` wraps the declaration, not the declarator.
            node.parent()
                .filter(|p| matches!(p.kind(), "lexical_declaration" | "variable_declaration"))
                .and_then(|p| p.parent())
                .filter(|p| p.kind() == "export_statement")
        });
    if let Some(stmt) = export {
        found.push("export");
        if children(stmt).iter().any(|c| c.kind() == "default") {
            found.push("default");
        }
    }
    if node.parent().is_some_and(|p| p.kind() == "ambient_declaration") {
        found.push("declare");
    }
    if node.kind() == "abstract_class_declaration" {
        found.push("abstract");
    }
    for child in children(node) {
        match child.kind() {
            "static" => found.push("static"),
            "async" => found.push("async"),
            "readonly" => found.push("readonly"),
            "abstract" => found.push("abstract"),
            "declare" => found.push("declare"),
            "override_modifier" => found.push("override"),
            "get" => found.push("get"),
            "set" => found.push("set"),
            "*" => found.push("generator"),
            _ => {}
        }
    }
    found
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
            Construct::Interface => self.interface(node),
            Construct::TypeAlias => self.type_alias(node),
            Construct::Enum => self.enumeration(node),
            Construct::Module => self.module(node),
            Construct::Method => self.method(node),
            Construct::PropertySignature | Construct::Field => self.field(node),
            Construct::Declarator => self.declarator(node),
            Construct::Parameter => self.parameter(node),
            Construct::Arrow => self.arrow(node),
            Construct::FunctionExpr => self.recurse(node),
            Construct::Call => self.call(node, None),
            Construct::New => self.new_expression(node, None),
            Construct::Member => self.member(node),
            Construct::Import => self.import(node),
            Construct::Export => self.export(node),
            Construct::Catch => self.catch(node),
            Construct::Throw => self.throw(node),
            Construct::Labeled => self.labeled(node),
            Construct::Break => self.jump(node, "break"),
            Construct::Continue => self.jump(node, "continue"),
            Construct::Decorator => self.decorator(node),
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

    fn visit_field(&mut self, node: Node<'t>, field: &str) {
        if let Some(child) = node.child_by_field_name(field) {
            self.visit(child);
        }
    }

    /// Name of the enclosing class, interface, enum or named function.
    fn parent(&self, node: Node<'t>) -> Option<&'a str> {
        enclosing(node, &self.t.nodes, |k| {
            matches!(
                k,
                Construct::Function
                    | Construct::Class
                    | Construct::Interface
                    | Construct::TypeAlias
                    | Construct::Enum
                    | Construct::Method
            )
        })
        .and_then(|(n, _)| self.em.field_text(n, "name"))
    }

    fn namespace(&self, node: Node<'t>) -> Option<&'a str> {
        enclosing(node, &self.t.nodes, |k| k == Construct::Module)
            .and_then(|(n, _)| self.em.field_text(n, "name"))
            .map(unquote)
    }

    fn is_local(&self, node: Node<'t>) -> bool {
        within(
            node,
            &self.t.nodes,
            |k| {
                matches!(
                    k,
                    Construct::Function
                        | Construct::Method
                        | Construct::Arrow
                        | Construct::FunctionExpr
                )
            },
            |k| matches!(k, Construct::Class | Construct::Interface | Construct::Module),
        )
    }

    fn function(&mut self, node: Node<'t>) {
        if let Some(name) = self.em.field_text(node, "name") {
            let ty = self.em.field_type(node, "return_type");
            let found = modifiers(node);
            let scope = self.is_local(node).then_some("local");
            let ns = self.namespace(node);
            self.em
                .entry(name, node, Ctx::Function)
                .parent(self.parent(node))
                .scope(scope)
                .modifier(ordered_modifiers(&found, MODIFIERS))
                .namespace(ns)
                .type_name(ty)
                .emit(self.em);
        }
        self.visit_field(node, "parameters");
        self.visit_field(node, "body");
    }

    fn class(&mut self, node: Node<'t>) {
        if let Some(name) = self.em.field_text(node, "name") {
            let base = child_of_kind(node, "class_heritage")
                .and_then(|h| child_of_kind(h, "extends_clause"))
                .and_then(|e| e.child_by_field_name("value").or_else(|| e.named_child(0)))
                .map(|v| self.em.text(v));
            let found = modifiers(node);
            let ns = self.namespace(node);
            self.em
                .entry(name, node, Ctx::Class)
                .parent(self.parent(node))
                .modifier(ordered_modifiers(&found, MODIFIERS))
                .namespace(ns)
                .type_name(base)
                .emit(self.em);
        }
        for child in named_children(node) {
            if child.kind() == "decorator" {
                self.visit(child);
            }
        }
        self.visit_field(node, "body");
    }

    fn interface(&mut self, node: Node<'t>) {
        if let Some(name) = self.em.field_text(node, "name") {
            let base = child_of_kind(node, "extends_type_clause")
                .and_then(|c| c.named_child(0))
                .map(|v| self.em.text(v));
            let found = modifiers(node);
            let ns = self.namespace(node);
            self.em
                .entry(name, node, Ctx::Interface)
                .parent(self.parent(node))
                .modifier(ordered_modifiers(&found, MODIFIERS))
                .namespace(ns)
                .type_name(base)
                .emit(self.em);
        }
        self.visit_field(node, "body");
    }

    fn type_alias(&mut self, node: Node<'t>) {
        if let Some(name) = self.em.field_text(node, "name") {
            let ty = self.em.field_type(node, "value");
            let found = modifiers(node);
            let ns = self.namespace(node);
            self.em
                .entry(name, node, Ctx::Type)
                .parent(self.parent(node))
                .modifier(ordered_modifiers(&found, MODIFIERS))
                .namespace(ns)
                .type_name(ty)
                .emit(self.em);
        }
        // Object type literals declare members just like an interface body.
        self.visit_field(node, "value");
    }

    fn enumeration(&mut self, node: Node<'t>) {
        let name = self.em.field_text(node, "name");
        if let Some(name) = name {
            let mut found = modifiers(node);
            if children(node).iter().any(|c| c.kind() == "const") {
                found.push("const");
            }
            let ns = self.namespace(node);
            self.em
                .entry(name, node, Ctx::Enum)
                .parent(self.parent(node))
                .modifier(ordered_modifiers(&found, MODIFIERS))
                .namespace(ns)
                .emit(self.em);
        }
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        for member in named_children(body) {
            let (name_node, value) = match member.kind() {
                "property_identifier" | "string" => (Some(member), None),
                "enum_assignment" => (
                    member.child_by_field_name("name"),
                    member.child_by_field_name("value"),
                ),
                _ => (None, None),
            };
            if let Some(n) = name_node {
                let case = unquote(self.em.text(n));
                self.em.entry(case, member, Ctx::EnumCase).parent(name).emit(self.em);
            }
            if let Some(v) = value {
                self.visit(v);
            }
        }
    }

    fn module(&mut self, node: Node<'t>) {
        if let Some(name) = self.em.field_text(node, "name") {
            let outer = self.namespace(node);
            self.em
                .entry(unquote(name), node, Ctx::Namespace)
                .namespace(outer)
                .emit(self.em);
        }
        self.visit_field(node, "body");
    }

    fn method(&mut self, node: Node<'t>) {
        if let Some(name_node) = node.child_by_field_name("name") {
            let name = self.em.text(name_node);
            let scope = child_of_kind(node, "accessibility_modifier")
                .map(|m| self.em.text(m))
                .or_else(|| {
                    (name_node.kind() == "private_property_identifier").then_some("private")
                });
            let ty = self.em.field_type(node, "return_type");
            let found = modifiers(node);
            let ns = self.namespace(node);
            self.em
                .entry(name.trim_start_matches('#'), node, Ctx::Function)
                .parent(self.parent(node))
                .scope(scope)
                .modifier(ordered_modifiers(&found, MODIFIERS))
                .namespace(ns)
                .type_name(ty)
                .emit(self.em);
        }
        for child in named_children(node) {
            if child.kind() == "decorator" {
                self.visit(child);
            }
        }
        self.visit_field(node, "parameters");
        self.visit_field(node, "body");
    }

    fn field(&mut self, node: Node<'t>) {
        let name_node = node
            .child_by_field_name("name")
            .or_else(|| node.child_by_field_name("property"));
        if let Some(name_node) = name_node {
            let name = self.em.text(name_node);
            let scope = child_of_kind(node, "accessibility_modifier")
                .map(|m| self.em.text(m))
                .or_else(|| {
                    (name_node.kind() == "private_property_identifier").then_some("private")
                });
            let ty = self.em.field_type(node, "type");
            let found = modifiers(node);
            self.em
                .entry(name.trim_start_matches('#'), node, Ctx::Property)
                .parent(self.parent(node))
                .scope(scope)
                .modifier(ordered_modifiers(&found, MODIFIERS))
                .type_name(ty)
                .emit(self.em);
        }
        for child in named_children(node) {
            if child.kind() == "decorator" {
                self.visit(child);
            }
        }
        self.visit_field(node, "value");
    }

    fn declarator(&mut self, node: Node<'t>) {
        let value = node.child_by_field_name("value");
        if let Some(name_node) = node.child_by_field_name("name")
            && name_node.kind() == "identifier"
        {
            let name = self.em.text(name_node);
            let lambda = value.is_some_and(|v| {
                matches!(
                    v.kind(),
                    "arrow_function" | "function_expression" | "function" | "generator_function"
                )
            });
            let mut found = modifiers(node);
            if let Some(kind) = node.parent().and_then(|p| p.child_by_field_name("kind")) {
                if self.em.text(kind) == "const" {
                    found.push("const");
                }
            }
            let ty = if lambda {
                value.and_then(|v| self.em.field_type(v, "return_type"))
            } else {
                self.em.field_type(node, "type")
            };
            let local = self.is_local(node);
            let ns = if local { None } else { self.namespace(node) };
            self.em
                .entry(name, node, if lambda { Ctx::Lambda } else { Ctx::Variable })
                .parent(self.parent(node))
                .scope(local.then_some("local"))
                .modifier(ordered_modifiers(&found, MODIFIERS))
                .namespace(ns)
                .type_name(ty)
                .emit(self.em);
        }
        // Destructuring patterns bind no single name; their defaults and the
        // initializer are still visited.
        if let Some(name_node) = node.child_by_field_name("name")
            && name_node.kind() != "identifier"
        {
            self.recurse(name_node);
        }
        if let Some(v) = value {
            self.visit(v);
        }
    }

    fn parameter(&mut self, node: Node<'t>) {
        let Some(pattern) = node.child_by_field_name("pattern") else {
            return self.recurse(node);
        };
        let (name_node, variadic) = match pattern.kind() {
            "identifier" => (Some(pattern), false),
            "rest_pattern" => (pattern.named_child(0).filter(|n| n.kind() == "identifier"), true),
            _ => (None, false),
        };
        if let Some(n) = name_node {
            let name = self.em.text(n);
            let ty = self.em.field_type(node, "type");
            let parent = self.parent(node);
            let modifier = child_of_kind(node, "accessibility_modifier");
            self.em
                .entry(name, n, Ctx::Argument)
                .parent(parent)
                .clue(variadic.then_some("variadic"))
                .type_name(ty.clone())
                .emit(self.em);
            // Constructor parameter properties also declare a class member.
            if let Some(m) = modifier {
                let class = enclosing(node, &self.t.nodes, |k| k == Construct::Class)
                    .and_then(|(c, _)| self.em.field_text(c, "name"));
                let scope = self.em.text(m);
                let readonly = children(node).iter().any(|c| c.kind() == "readonly");
                self.em
                    .entry(name, n, Ctx::Property)
                    .parent(class)
                    .scope(scope)
                    .modifier(readonly.then_some("readonly"))
                    .type_name(ty)
                    .emit(self.em);
            }
        } else if pattern.kind() != "this" {
            self.recurse(pattern);
        }
        self.visit_field(node, "value");
    }

    fn arrow(&mut self, node: Node<'t>) {
        if let Some(param) = node.child_by_field_name("parameter")
            && param.kind() == "identifier"
        {
            let name = self.em.text(param);
            self.em
                .entry(name, param, Ctx::Argument)
                .parent(self.parent(node))
                .emit(self.em);
        }
        self.visit_field(node, "parameters");
        self.visit_field(node, "body");
    }

    /// Emit the CALL entry for a call's callee. Returns the called name.
    fn callee(&mut self, function: Node<'t>, clue: Option<&str>) -> Option<&'a str> {
        match function.kind() {
            "identifier" => {
                let text = self.em.text(function);
                self.em.entry(text, function, Ctx::Call).clue(clue).emit(self.em);
                Some(text)
            }
            "member_expression" => {
                let object = function.child_by_field_name("object");
                let name = function.child_by_field_name("property").map(|p| self.em.text(p));
                if let Some(text) = name {
                    let receiver = object.and_then(|o| receiver_name(self.em.text(o)));
                    self.em
                        .entry(text.trim_start_matches('#'), function, Ctx::Call)
                        .parent(receiver)
                        .clue(clue)
                        .emit(self.em);
                }
                if let Some(o) = object {
                    self.visit(o);
                }
                name
            }
            _ => {
                self.visit(function);
                None
            }
        }
    }

    fn call(&mut self, node: Node<'t>, clue: Option<&str>) {
        let clue = clue.or_else(|| {
            node.parent()
                .filter(|p| p.kind() == "await_expression")
                .map(|_| "await")
        });
        let name = match node.child_by_field_name("function") {
            Some(f) => self.callee(f, clue),
            None => None,
        };
        if let Some(args) = node.child_by_field_name("arguments") {
            self.arguments(args, name);
        }
    }

    fn new_expression(&mut self, node: Node<'t>, context: Option<(Ctx, &str)>) {
        let constructor = node.child_by_field_name("constructor");
        let mut name = None;
        if let Some(c) = constructor {
            match c.kind() {
                "identifier" | "member_expression" | "nested_identifier" => {
                    let text = self.em.text(c);
                    let short = last_segment(text);
                    name = Some(short);
                    let receiver = c
                        .child_by_field_name("object")
                        .and_then(|o| receiver_name(self.em.text(o)));
                    let (ctx, clue) = context.unwrap_or((Ctx::Call, "new"));
                    self.em
                        .entry(short, c, ctx)
                        .parent(receiver)
                        .clue(clue)
                        .emit(self.em);
                    if let Some(o) = c.child_by_field_name("object") {
                        self.visit(o);
                    }
                }
                _ => self.visit(c),
            }
        }
        if let Some(args) = node.child_by_field_name("arguments") {
            self.arguments(args, name);
        }
    }

    /// Bare identifiers passed to a call are indexed with the callee as clue,
    /// bypassing the filter.
    fn arguments(&mut self, args: Node<'t>, callee: Option<&str>) {
        for arg in named_children(args) {
            if arg.kind() == "identifier" {
                let text = self.em.text(arg);
                self.em
                    .entry(text, arg, Ctx::Argument)
                    .parent(self.parent(arg))
                    .clue(callee)
                    .emit_unfiltered(self.em);
            } else {
                self.visit(arg);
            }
        }
    }

    fn member(&mut self, node: Node<'t>) {
        let object = node.child_by_field_name("object");
        if let Some(prop) = node.child_by_field_name("property") {
            let name = self.em.text(prop);
            let receiver = object.and_then(|o| receiver_name(self.em.text(o)));
            self.em
                .entry(name.trim_start_matches('#'), prop, Ctx::Property)
                .parent(receiver)
                .emit(self.em);
        }
        if let Some(o) = object {
            self.visit(o);
        }
    }

    fn import(&mut self, node: Node<'t>) {
        let source = node.child_by_field_name("source").map(|s| unquote(self.em.text(s)));
        if let (Some(src), Some(s)) = (source, node.child_by_field_name("source")) {
            self.em.entry(src, s, Ctx::Import).emit_unfiltered(self.em);
        }
        let Some(clause) = child_of_kind(node, "import_clause") else {
            return;
        };
        for part in named_children(clause) {
            match part.kind() {
                "identifier" => {
                    let text = self.em.text(part);
                    self.em
                        .entry(text, part, Ctx::Import)
                        .parent(source)
                        .clue("default")
                        .emit_unfiltered(self.em);
                }
                "namespace_import" => {
                    if let Some(id) = part.named_child(0) {
                        let text = self.em.text(id);
                        self.em
                            .entry(text, id, Ctx::Import)
                            .parent(source)
                            .clue("*")
                            .emit_unfiltered(self.em);
                    }
                }
                "named_imports" => {
                    let specs =
                        named_children(part).into_iter().filter(|s| s.kind() == "import_specifier");
                    for spec in specs {
                        let Some(n) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let text = unquote(self.em.text(n));
                        let alias = self.em.field_text(spec, "alias");
                        self.em
                            .entry(text, spec, Ctx::Import)
                            .parent(source)
                            .clue(alias)
                            .emit_unfiltered(self.em);
                    }
                }
                _ => {}
            }
        }
    }

    fn export(&mut self, node: Node<'t>) {
        let source = node.child_by_field_name("source");
        if let Some(clause) = child_of_kind(node, "export_clause") {
            let specs =
                named_children(clause).into_iter().filter(|s| s.kind() == "export_specifier");
            for spec in specs {
                let Some(n) = spec.child_by_field_name("name") else {
                    continue;
                };
                let text = unquote(self.em.text(n));
                let alias = self.em.field_text(spec, "alias");
                self.em.entry(text, spec, Ctx::Export).clue(alias).emit(self.em);
            }
        } else if let Some(s) = source {
            // `export * from './x'` and `export * as ns from './x'`
            let text = unquote(self.em.text(s));
            let alias = child_of_kind(node, "namespace_export")
                .and_then(|ns| ns.named_child(0))
                .map(|id| self.em.text(id));
            self.em
                .entry(text, s, Ctx::Export)
                .clue(alias.unwrap_or("*"))
                .emit(self.em);
        }
        if let Some(value) = node.child_by_field_name("value") {
            if value.kind() == "identifier" {
                let text = self.em.text(value);
                self.em.entry(text, value, Ctx::Export).clue("default").emit(self.em);
            } else {
                self.visit(value);
            }
        }
        for child in named_children(node) {
            if child.kind() == "decorator" {
                self.visit(child);
            }
        }
        self.visit_field(node, "declaration");
    }

    fn catch(&mut self, node: Node<'t>) {
        let param = node.child_by_field_name("parameter");
        let ty = node.child_by_field_name("type").and_then(|t| t.named_child(0));
        match (param, ty) {
            (_, Some(t)) => {
                let text = self.em.text(t);
                self.em
                    .entry(text, t, Ctx::Exception)
                    .parent(self.parent(node))
                    .clue("catch")
                    .emit(self.em);
            }
            (Some(p), None) if p.kind() == "identifier" => {
                let text = self.em.text(p);
                self.em
                    .entry(text, p, Ctx::Exception)
                    .parent(self.parent(node))
                    .clue("catch")
                    .emit(self.em);
            }
            _ => {}
        }
        self.visit_field(node, "body");
    }

    fn throw(&mut self, node: Node<'t>) {
        for child in named_children(node) {
            match child.kind() {
                "new_expression" => self.new_expression(child, Some((Ctx::Exception, "throw"))),
                "identifier" => {
                    let text = self.em.text(child);
                    self.em
                        .entry(text, child, Ctx::Exception)
                        .parent(self.parent(node))
                        .clue("throw")
                        .emit(self.em);
                }
                _ => self.visit(child),
            }
        }
    }

    fn labeled(&mut self, node: Node<'t>) {
        if let Some(label) = node.child_by_field_name("label") {
            let name = self.em.text(label);
            self.em.entry(name, label, Ctx::Label).parent(self.parent(node)).emit(self.em);
        }
        self.visit_field(node, "body");
    }

    fn jump(&mut self, node: Node<'t>, clue: &str) {
        if let Some(label) = node.child_by_field_name("label") {
            let name = self.em.text(label);
            self.em
                .entry(name, label, Ctx::Goto)
                .parent(self.parent(node))
                .clue(clue)
                .emit(self.em);
        }
    }

    fn decorator(&mut self, node: Node<'t>) {
        let Some(expr) = node.named_child(0) else {
            return;
        };
        match expr.kind() {
            "call_expression" => self.call(expr, Some("decorator")),
            "identifier" | "member_expression" => {
                self.callee(expr, Some("decorator"));
            }
            _ => self.visit(expr),
        }
    }
}
