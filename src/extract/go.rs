//! Go extraction.
//!
//! Package membership comes from the `package` clause, found by scanning the
//! file's top-level children. Methods take their receiver's type name as
//! `parent`; exported-ness by capitalisation fills `scope`.

use tree_sitter::{Language, Node};

use super::context::{enclosing, preceding_sibling, within};
use super::emit::Emitter;
use super::table::NodeTable;
use super::typenorm::{ArgList, Collapse, GenericShape, TypeStrategy, TypeTable, Widen};
use super::{Grammar, children, field_children, named_children, receiver_name, unquote};
use crate::types::ContextType as Ctx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Construct {
    Package,
    ImportSpec,
    Function,
    Method,
    TypeSpec,
    TypeAlias,
    VarSpec,
    ConstSpec,
    ShortVar,
    RangeClause,
    FieldDecl,
    MethodElem,
    TypeElem,
    Parameter,
    VariadicParameter,
    FuncLiteral,
    Call,
    Selector,
    Labeled,
    Goto,
    Break,
    Continue,
    Comment,
    Str,
}

const NODES: &[(&str, Construct)] = &[
    ("package_clause", Construct::Package),
    ("import_spec", Construct::ImportSpec),
    ("function_declaration", Construct::Function),
    ("method_declaration", Construct::Method),
    ("type_spec", Construct::TypeSpec),
    ("type_alias", Construct::TypeAlias),
    ("var_spec", Construct::VarSpec),
    ("const_spec", Construct::ConstSpec),
    ("short_var_declaration", Construct::ShortVar),
    ("range_clause", Construct::RangeClause),
    ("field_declaration", Construct::FieldDecl),
    ("method_elem", Construct::MethodElem),
    ("method_spec", Construct::MethodElem),
    ("type_elem", Construct::TypeElem),
    ("parameter_declaration", Construct::Parameter),
    ("variadic_parameter_declaration", Construct::VariadicParameter),
    ("func_literal", Construct::FuncLiteral),
    ("call_expression", Construct::Call),
    ("selector_expression", Construct::Selector),
    ("labeled_statement", Construct::Labeled),
    ("goto_statement", Construct::Goto),
    ("break_statement", Construct::Break),
    ("continue_statement", Construct::Continue),
    ("comment", Construct::Comment),
    ("interpreted_string_literal", Construct::Str),
    ("raw_string_literal", Construct::Str),
];

const TYPES: &[(&str, TypeStrategy)] = &[
    ("type_identifier", TypeStrategy::Simple),
    ("negated_type", TypeStrategy::Simple),
    ("qualified_type", TypeStrategy::Qualified),
    ("pointer_type", TypeStrategy::WrappedPointer("*")),
    ("slice_type", TypeStrategy::StructuredCollapse(Collapse::Prefix("[]"))),
    ("array_type", TypeStrategy::StructuredCollapse(Collapse::Prefix("[]"))),
    ("implicit_length_array_type", TypeStrategy::StructuredCollapse(Collapse::Prefix("[]"))),
    ("map_type", TypeStrategy::StructuredCollapse(Collapse::Keyword("map"))),
    ("channel_type", TypeStrategy::StructuredCollapse(Collapse::Keyword("chan"))),
    ("struct_type", TypeStrategy::StructuredCollapse(Collapse::Keyword("struct"))),
    ("interface_type", TypeStrategy::StructuredCollapse(Collapse::Keyword("interface"))),
    ("function_type", TypeStrategy::StructuredCollapse(Collapse::Keyword("func"))),
    ("parameter_list", TypeStrategy::StructuredCollapse(Collapse::Keyword("tuple"))),
    (
        "generic_type",
        TypeStrategy::Generic(GenericShape {
            args: ArgList::Child("type_arguments"),
            open: "[",
            close: "]",
        }),
    ),
    ("parenthesized_type", TypeStrategy::UnwrapRecurse),
    ("type_elem", TypeStrategy::UnionCollapse(Widen::Keyword("union"))),
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
        Visitor { t: self, em, root }.visit(root);
    }
}

fn exported(name: &str) -> &'static str {
    if name.chars().next().is_some_and(char::is_uppercase) {
        "public"
    } else {
        "private"
    }
}

/// Name of a type expression with pointers and type arguments removed.
fn base_type_name<'t>(node: Node<'t>) -> Node<'t> {
    match node.kind() {
        "pointer_type" | "parenthesized_type" => node.named_child(0).map_or(node, base_type_name),
        "generic_type" => node.child_by_field_name("type").map_or(node, base_type_name),
        "qualified_type" => node.child_by_field_name("name").unwrap_or(node),
        _ => node,
    }
}

struct Visitor<'v, 'a, 't> {
    t: &'v Tables,
    em: &'v mut Emitter<'a>,
    root: Node<'t>,
}

impl<'a, 't> Visitor<'_, 'a, 't> {
    fn visit(&mut self, node: Node<'t>) {
        let Some(construct) = self.t.nodes.get(node) else {
            self.recurse(node);
            return;
        };
        match construct {
            Construct::Package => self.package(node),
            Construct::ImportSpec => self.import_spec(node),
            Construct::Function => self.function(node, false),
            Construct::Method => self.function(node, true),
            Construct::TypeSpec => self.type_spec(node),
            Construct::TypeAlias => self.type_alias(node),
            Construct::VarSpec => self.var_spec(node, false),
            Construct::ConstSpec => self.var_spec(node, true),
            Construct::ShortVar => self.short_var(node),
            Construct::RangeClause => self.range_clause(node),
            Construct::FieldDecl => self.field_decl(node),
            Construct::MethodElem => self.method_elem(node),
            Construct::TypeElem => self.type_elem(node),
            Construct::Parameter => self.parameter(node, false),
            Construct::VariadicParameter => self.parameter(node, true),
            Construct::Call => self.call(node),
            Construct::Selector => self.selector(node),
            Construct::Labeled => self.labeled(node),
            Construct::Goto => self.jump(node, None),
            Construct::Break => self.jump(node, Some("break")),
            Construct::Continue => self.jump(node, Some("continue")),
            Construct::Comment => self.em.words(node, Ctx::Comment, None),
            Construct::Str => self.em.words(node, Ctx::String, None),
            Construct::FuncLiteral => self.recurse(node),
        }
    }

    fn recurse(&mut self, node: Node<'t>) {
        for child in children(node) {
            self.visit(child);
        }
    }

    fn namespace(&self, node: Node<'t>) -> Option<&'a str> {
        preceding_sibling(self.root, node, &self.t.nodes, |k| k == Construct::Package)
            .and_then(|(clause, _)| named_children(clause).into_iter().next())
            .map(|id| self.em.text(id))
    }

    /// Name of the enclosing function, method or type.
    fn parent(&self, node: Node<'t>) -> Option<&'a str> {
        enclosing(node, &self.t.nodes, |k| {
            matches!(
                k,
                Construct::Function
                    | Construct::Method
                    | Construct::TypeSpec
                    | Construct::MethodElem
            )
        })
        .and_then(|(n, _)| self.em.field_text(n, "name"))
    }

    /// Type or variable declaring the struct a field belongs to.
    fn owner(&self, node: Node<'t>) -> Option<&'a str> {
        enclosing(node, &self.t.nodes, |k| {
            matches!(
                k,
                Construct::Function | Construct::Method | Construct::TypeSpec | Construct::VarSpec
            )
        })
        .and_then(|(n, _)| self.em.field_text(n, "name"))
    }

    fn is_local(&self, node: Node<'t>) -> bool {
        within(
            node,
            &self.t.nodes,
            |k| matches!(k, Construct::Function | Construct::Method | Construct::FuncLiteral),
            |_| false,
        )
    }

    fn package(&mut self, node: Node<'t>) {
        if let Some(id) = named_children(node).into_iter().next() {
            let name = self.em.text(id);
            self.em.entry(name, node, Ctx::Namespace).emit(self.em);
        }
    }

    fn import_spec(&mut self, node: Node<'t>) {
        let Some(path) = self.em.field_text(node, "path") else {
            return;
        };
        let alias = self.em.field_text(node, "name");
        let ns = self.namespace(node);
        self.em
            .entry(unquote(path), node, Ctx::Import)
            .clue(alias)
            .namespace(ns)
            .emit_unfiltered(self.em);
    }

    fn function(&mut self, node: Node<'t>, method: bool) {
        if let Some(name) = self.em.field_text(node, "name") {
            let parent = if method {
                node.child_by_field_name("receiver")
                    .and_then(|r| named_children(r).into_iter().next())
                    .and_then(|p| p.child_by_field_name("type"))
                    .map(|t| self.em.text(base_type_name(t)))
            } else {
                None
            };
            let ty = self.em.field_type(node, "result");
            let ns = self.namespace(node);
            self.em
                .entry(name, node, Ctx::Function)
                .parent(parent)
                .scope(exported(name))
                .namespace(ns)
                .type_name(ty)
                .emit(self.em);
        }
        self.recurse(node);
    }

    fn type_spec(&mut self, node: Node<'t>) {
        let Some(name) = self.em.field_text(node, "name") else {
            return self.recurse(node);
        };
        let type_node = node.child_by_field_name("type");
        let context = match type_node.map(|t| t.kind()) {
            Some("struct_type") => Ctx::Class,
            Some("interface_type") => Ctx::Interface,
            _ => Ctx::Type,
        };
        let ty = match context {
            Ctx::Type => type_node.and_then(|t| self.em.type_of(t)),
            _ => None,
        };
        let local = self.is_local(node);
        let ns = self.namespace(node);
        self.em
            .entry(name, node, context)
            .parent(self.parent(node))
            .scope(if local { "local" } else { exported(name) })
            .namespace(ns)
            .type_name(ty)
            .emit(self.em);
        if let Some(t) = type_node {
            self.visit(t);
        }
    }

    fn type_alias(&mut self, node: Node<'t>) {
        let Some(name) = self.em.field_text(node, "name") else {
            return;
        };
        let ty = self.em.field_type(node, "type");
        let ns = self.namespace(node);
        self.em
            .entry(name, node, Ctx::Type)
            .scope(exported(name))
            .clue("alias")
            .namespace(ns)
            .type_name(ty)
            .emit(self.em);
    }

    fn var_spec(&mut self, node: Node<'t>, constant: bool) {
        let names = field_children(node, "name");
        let ty = self.em.field_type(node, "type");
        let value = node.child_by_field_name("value");
        let values = value.map(named_children).unwrap_or_default();
        let local = self.is_local(node);
        let parent = self.parent(node);
        let ns = if local { None } else { self.namespace(node) };

        for (i, name_node) in names.iter().enumerate() {
            let name = self.em.text(*name_node);
            if name == "_" {
                continue;
            }
            let lambda = names.len() == values.len() && values[i].kind() == "func_literal";
            self.em
                .entry(name, *name_node, if lambda { Ctx::Lambda } else { Ctx::Variable })
                .parent(parent)
                .scope(if local { "local" } else { exported(name) })
                .modifier(constant.then_some("const"))
                .namespace(ns)
                .type_name(ty.clone())
                .emit(self.em);
        }
        // Anonymous struct and interface types declare members.
        if let Some(t) = node.child_by_field_name("type") {
            self.visit(t);
        }
        if let Some(v) = value {
            self.visit(v);
        }
    }

    /// Declare every identifier of an expression list as a local binding.
    fn declare_locals(&mut self, left: Node<'t>, right: Option<Node<'t>>) {
        let names = named_children(left);
        let values = right.map(named_children).unwrap_or_default();
        let parent = self.parent(left);
        for (i, name_node) in names.iter().enumerate() {
            if name_node.kind() != "identifier" {
                continue;
            }
            let name = self.em.text(*name_node);
            if name == "_" {
                continue;
            }
            let lambda = names.len() == values.len() && values[i].kind() == "func_literal";
            self.em
                .entry(name, *name_node, if lambda { Ctx::Lambda } else { Ctx::Variable })
                .parent(parent)
                .scope("local")
                .emit(self.em);
        }
    }

    fn short_var(&mut self, node: Node<'t>) {
        let right = node.child_by_field_name("right");
        if let Some(left) = node.child_by_field_name("left") {
            self.declare_locals(left, right);
        }
        if let Some(r) = right {
            self.visit(r);
        }
    }

    fn range_clause(&mut self, node: Node<'t>) {
        let declares = children(node).iter().any(|c| c.kind() == ":=");
        if declares && let Some(left) = node.child_by_field_name("left") {
            self.declare_locals(left, None);
        }
        if let Some(r) = node.child_by_field_name("right") {
            self.visit(r);
        }
    }

    fn field_decl(&mut self, node: Node<'t>) {
        let names = field_children(node, "name");
        let type_node = node.child_by_field_name("type");
        let parent = self.owner(node);

        if names.is_empty() {
            // Embedded field: indexed under the type name.
            if let Some(t) = type_node {
                let name = self.em.text(base_type_name(t));
                let ty = self.em.type_of(t);
                self.em
                    .entry(name, node, Ctx::Property)
                    .parent(parent)
                    .scope(exported(name))
                    .clue("embedded")
                    .type_name(ty)
                    .emit(self.em);
            }
            return;
        }

        let ty = type_node.and_then(|t| self.em.type_of(t));
        for name_node in names {
            let name = self.em.text(name_node);
            self.em
                .entry(name, name_node, Ctx::Property)
                .parent(parent)
                .scope(exported(name))
                .type_name(ty.clone())
                .emit(self.em);
        }
        if let Some(t) = type_node {
            self.visit(t);
        }
    }

    fn method_elem(&mut self, node: Node<'t>) {
        if let Some(name) = self.em.field_text(node, "name") {
            let ty = self.em.field_type(node, "result");
            self.em
                .entry(name, node, Ctx::Function)
                .parent(self.parent(node))
                .scope(exported(name))
                .type_name(ty)
                .emit(self.em);
        }
        self.recurse(node);
    }

    /// Embedded interface (`io.Reader` inside `interface { ... }`).
    fn type_elem(&mut self, node: Node<'t>) {
        let inside_interface = node.parent().is_some_and(|p| p.kind() == "interface_type");
        let named = named_children(node);
        if let ([only], true) = (named.as_slice(), inside_interface)
            && matches!(only.kind(), "type_identifier" | "qualified_type" | "generic_type")
        {
            let name = self.em.text(base_type_name(*only));
            self.em
                .entry(name, node, Ctx::Property)
                .parent(self.parent(node))
                .scope(exported(name))
                .clue("embedded")
                .emit(self.em);
            return;
        }
        self.recurse(node);
    }

    fn parameter(&mut self, node: Node<'t>, variadic: bool) {
        let ty = self.em.field_type(node, "type");
        let parent = self.parent(node);
        for name_node in field_children(node, "name") {
            let name = self.em.text(name_node);
            if name == "_" {
                continue;
            }
            self.em
                .entry(name, name_node, Ctx::Argument)
                .parent(parent)
                .clue(variadic.then_some("variadic"))
                .type_name(ty.clone())
                .emit(self.em);
        }
        if let Some(t) = node.child_by_field_name("type") {
            self.visit(t);
        }
    }

    fn call(&mut self, node: Node<'t>) {
        let clue = match node.parent().map(|p| p.kind()) {
            Some("go_statement") => Some("go"),
            Some("defer_statement") => Some("defer"),
            _ => None,
        };
        let callee = node.child_by_field_name("function");
        let mut name = None;
        match callee {
            Some(f) if f.kind() == "identifier" => {
                let text = self.em.text(f);
                name = Some(text);
                self.em.entry(text, f, Ctx::Call).clue(clue).emit(self.em);
            }
            Some(f) if f.kind() == "selector_expression" => {
                let field = f.child_by_field_name("field").map(|n| self.em.text(n));
                let operand = f.child_by_field_name("operand");
                if let Some(text) = field {
                    name = Some(text);
                    let receiver = operand.and_then(|o| receiver_name(self.em.text(o)));
                    self.em
                        .entry(text, f, Ctx::Call)
                        .parent(receiver)
                        .clue(clue)
                        .emit(self.em);
                }
                if let Some(o) = operand {
                    self.visit(o);
                }
            }
            Some(f) => self.visit(f),
            None => {}
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

    fn selector(&mut self, node: Node<'t>) {
        let operand = node.child_by_field_name("operand");
        if let Some(field) = node.child_by_field_name("field") {
            let name = self.em.text(field);
            let receiver = operand.and_then(|o| receiver_name(self.em.text(o)));
            self.em.entry(name, field, Ctx::Property).parent(receiver).emit(self.em);
        }
        if let Some(o) = operand {
            self.visit(o);
        }
    }

    fn labeled(&mut self, node: Node<'t>) {
        if let Some(label) = node.child_by_field_name("label") {
            let name = self.em.text(label);
            self.em.entry(name, label, Ctx::Label).parent(self.parent(node)).emit(self.em);
        }
        for child in named_children(node).into_iter().skip(1) {
            self.visit(child);
        }
    }

    fn jump(&mut self, node: Node<'t>, clue: Option<&str>) {
        let Some(label) = named_children(node).into_iter().find(|c| c.kind() == "label_name") else {
            return;
        };
        let name = self.em.text(label);
        self.em
            .entry(name, label, Ctx::Goto)
            .parent(self.parent(node))
            .clue(clue)
            .emit(self.em);
    }
}
