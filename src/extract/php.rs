//! PHP extraction.
//!
//! `namespace Foo;` governs every following top-level statement until the
//! next namespace statement, so it is found among the root's earlier
//! children. The braced form `namespace Foo { ... }` wraps its members and
//! is found by ancestor search. Variable names are indexed without `$`.

use tree_sitter::{Language, Node};

use super::context::{enclosing, preceding_sibling, within};
use super::emit::{Emitter, ordered_modifiers};
use super::table::NodeTable;
use super::typenorm::{TypeStrategy, TypeTable, Widen};
use super::{Grammar, child_of_kind, children, last_segment, named_children, receiver_name, unquote};
use crate::types::ContextType as Ctx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Construct {
    Namespace,
    Use,
    Include,
    Class,
    Interface,
    Trait,
    Enum,
    EnumCase,
    Method,
    Function,
    Property,
    Const,
    Parameter,
    Closure,
    Assignment,
    FunctionCall,
    MemberCall,
    ScopedCall,
    New,
    MemberAccess,
    Catch,
    Throw,
    Attribute,
    Label,
    Goto,
    Comment,
    Str,
}

const NODES: &[(&str, Construct)] = &[
    ("namespace_definition", Construct::Namespace),
    ("namespace_use_declaration", Construct::Use),
    ("include_expression", Construct::Include),
    ("include_once_expression", Construct::Include),
    ("require_expression", Construct::Include),
    ("require_once_expression", Construct::Include),
    ("class_declaration", Construct::Class),
    ("interface_declaration", Construct::Interface),
    ("trait_declaration", Construct::Trait),
    ("enum_declaration", Construct::Enum),
    ("enum_case", Construct::EnumCase),
    ("method_declaration", Construct::Method),
    ("function_definition", Construct::Function),
    ("property_declaration", Construct::Property),
    ("const_declaration", Construct::Const),
    ("simple_parameter", Construct::Parameter),
    ("variadic_parameter", Construct::Parameter),
    ("property_promotion_parameter", Construct::Parameter),
    ("anonymous_function", Construct::Closure),
    ("anonymous_function_creation_expression", Construct::Closure),
    ("arrow_function", Construct::Closure),
    ("assignment_expression", Construct::Assignment),
    ("function_call_expression", Construct::FunctionCall),
    ("member_call_expression", Construct::MemberCall),
    ("nullsafe_member_call_expression", Construct::MemberCall),
    ("scoped_call_expression", Construct::ScopedCall),
    ("object_creation_expression", Construct::New),
    ("member_access_expression", Construct::MemberAccess),
    ("nullsafe_member_access_expression", Construct::MemberAccess),
    ("catch_clause", Construct::Catch),
    ("throw_expression", Construct::Throw),
    ("attribute", Construct::Attribute),
    ("named_label_statement", Construct::Label),
    ("goto_statement", Construct::Goto),
    ("comment", Construct::Comment),
    ("string", Construct::Str),
    ("encapsed_string", Construct::Str),
    ("heredoc", Construct::Str),
    ("nowdoc", Construct::Str),
];

const TYPES: &[(&str, TypeStrategy)] = &[
    ("named_type", TypeStrategy::Simple),
    ("primitive_type", TypeStrategy::Simple),
    ("name", TypeStrategy::Simple),
    ("bottom_type", TypeStrategy::Simple),
    ("cast_type", TypeStrategy::Simple),
    ("qualified_name", TypeStrategy::Qualified),
    ("optional_type", TypeStrategy::WrappedPointer("?")),
    ("union_type", TypeStrategy::UnionCollapse(Widen::Keyword("union"))),
    ("disjunctive_normal_form_type", TypeStrategy::UnionCollapse(Widen::Keyword("union"))),
    ("type_list", TypeStrategy::UnionCollapse(Widen::Keyword("union"))),
    ("intersection_type", TypeStrategy::UnionCollapse(Widen::Keyword("intersection"))),
];

const MODIFIERS: &[&str] = &["abstract", "final", "static", "readonly"];

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

/// Modifier keywords and visibility of a class member or class.
fn member_modifiers<'a>(node: Node, em: &Emitter<'a>) -> (Vec<&'static str>, Option<&'a str>) {
    let mut found = Vec::new();
    let mut visibility = None;
    for child in children(node) {
        match child.kind() {
            "visibility_modifier" => visibility = Some(em.text(child)),
            "abstract_modifier" => found.push("abstract"),
            "final_modifier" => found.push("final"),
            "static_modifier" => found.push("static"),
            "readonly_modifier" => found.push("readonly"),
            _ => {}
        }
    }
    (found, visibility)
}

fn class_like(k: Construct) -> bool {
    matches!(k, Construct::Class | Construct::Interface | Construct::Trait | Construct::Enum)
}

/// `$name` without the sigil.
fn bare(text: &str) -> &str {
    text.trim().trim_start_matches('$')
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
            Construct::Namespace => self.namespace_definition(node),
            Construct::Use => self.use_declaration(node),
            Construct::Include => self.include(node),
            Construct::Class => self.type_declaration(node, Ctx::Class),
            Construct::Interface => self.type_declaration(node, Ctx::Interface),
            Construct::Trait => self.type_declaration(node, Ctx::Trait),
            Construct::Enum => self.type_declaration(node, Ctx::Enum),
            Construct::EnumCase => self.enum_case(node),
            Construct::Method => self.method(node),
            Construct::Function => self.function(node),
            Construct::Property => self.property(node),
            Construct::Const => self.constant(node),
            Construct::Parameter => self.parameter(node),
            Construct::Closure => self.recurse(node),
            Construct::Assignment => self.assignment(node),
            Construct::FunctionCall => self.function_call(node),
            Construct::MemberCall => self.member_call(node),
            Construct::ScopedCall => self.scoped_call(node),
            Construct::New => self.object_creation(node, Ctx::Call, "new"),
            Construct::MemberAccess => self.member_access(node),
            Construct::Catch => self.catch(node),
            Construct::Throw => self.throw(node),
            Construct::Attribute => self.attribute(node),
            Construct::Label => self.label(node, Ctx::Label),
            Construct::Goto => self.label(node, Ctx::Goto),
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

    /// Enclosing class-like declaration, function or method name.
    fn parent(&self, node: Node<'t>) -> Option<&'a str> {
        enclosing(node, &self.t.nodes, |k| {
            matches!(
                k,
                Construct::Class
                    | Construct::Interface
                    | Construct::Trait
                    | Construct::Enum
                    | Construct::Method
                    | Construct::Function
            )
        })
        .and_then(|(n, _)| self.em.field_text(n, "name"))
    }

    /// Name of the class-like declaration around a member.
    fn owner(&self, node: Node<'t>) -> Option<&'a str> {
        enclosing(node, &self.t.nodes, class_like).and_then(|(n, _)| self.em.field_text(n, "name"))
    }

    fn namespace(&self, node: Node<'t>) -> Option<&'a str> {
        let braced = enclosing(node, &self.t.nodes, |k| k == Construct::Namespace);
        let (ns, _) = match braced {
            Some(found) => found,
            None => preceding_sibling(self.root, node, &self.t.nodes, |k| k == Construct::Namespace)
                .filter(|(n, _)| n.child_by_field_name("body").is_none())?,
        };
        self.em.field_text(ns, "name")
    }

    fn is_local(&self, node: Node<'t>) -> bool {
        within(
            node,
            &self.t.nodes,
            |k| matches!(k, Construct::Method | Construct::Function | Construct::Closure),
            class_like,
        )
    }

    fn namespace_definition(&mut self, node: Node<'t>) {
        if let Some(name) = self.em.field_text(node, "name") {
            self.em.entry(name, node, Ctx::Namespace).emit(self.em);
        }
        self.visit_field(node, "body");
    }

    fn use_declaration(&mut self, node: Node<'t>) {
        let ns = self.namespace(node);
        // `use App\Models\{User, Post as BlogPost};`
        let prefix = child_of_kind(node, "namespace_name").map(|p| self.em.text(p));
        let clauses: Vec<Node<'t>> = match child_of_kind(node, "namespace_use_group") {
            Some(group) => named_children(group),
            None => named_children(node),
        };
        for clause in clauses.into_iter().filter(|c| c.kind() == "namespace_use_clause") {
            let mut target = None;
            let mut alias = None;
            let mut after_as = false;
            for child in children(clause) {
                match child.kind() {
                    "as" => after_as = true,
                    "name" if after_as => alias = Some(self.em.text(child)),
                    "name" | "qualified_name" if target.is_none() => {
                        target = Some(self.em.text(child));
                    }
                    _ => {}
                }
            }
            let Some(target) = target else {
                continue;
            };
            let full = match prefix {
                Some(p) => format!("{p}\\{target}"),
                None => target.trim_start_matches('\\').to_string(),
            };
            self.em
                .entry(&full, clause, Ctx::Import)
                .clue(alias)
                .namespace(ns)
                .emit_unfiltered(self.em);
        }
    }

    fn include(&mut self, node: Node<'t>) {
        let Some(arg) = node.named_child(0) else {
            return;
        };
        if matches!(arg.kind(), "string" | "encapsed_string") {
            let path = unquote(self.em.text(arg));
            let keyword = node.kind().trim_end_matches("_expression");
            self.em
                .entry(path, arg, Ctx::Import)
                .clue(keyword)
                .namespace(self.namespace(node))
                .emit_unfiltered(self.em);
        } else {
            self.visit(arg);
        }
    }

    fn type_declaration(&mut self, node: Node<'t>, ctx: Ctx) {
        if let Some(name) = self.em.field_text(node, "name") {
            let base = child_of_kind(node, "base_clause")
                .and_then(|b| b.named_child(0))
                .map(|b| self.em.text(b));
            let (found, _) = member_modifiers(node, self.em);
            let ns = self.namespace(node);
            self.em
                .entry(name, node, ctx)
                .modifier(ordered_modifiers(&found, MODIFIERS))
                .namespace(ns)
                .type_name(base)
                .emit(self.em);
        }
        self.attributes(node);
        self.visit_field(node, "body");
    }

    fn attributes(&mut self, node: Node<'t>) {
        if let Some(list) = child_of_kind(node, "attribute_list") {
            self.visit(list);
        }
    }

    fn enum_case(&mut self, node: Node<'t>) {
        let name = node
            .child_by_field_name("name")
            .or_else(|| child_of_kind(node, "name"))
            .map(|n| self.em.text(n));
        if let Some(name) = name {
            self.em
                .entry(name, node, Ctx::EnumCase)
                .parent(self.owner(node))
                .emit(self.em);
        }
        self.visit_field(node, "value");
    }

    fn method(&mut self, node: Node<'t>) {
        if let Some(name) = self.em.field_text(node, "name") {
            let (found, visibility) = member_modifiers(node, self.em);
            let ty = self.em.field_type(node, "return_type");
            let ns = self.namespace(node);
            self.em
                .entry(name, node, Ctx::Function)
                .parent(self.owner(node))
                .scope(visibility.unwrap_or("public"))
                .modifier(ordered_modifiers(&found, MODIFIERS))
                .namespace(ns)
                .type_name(ty)
                .emit(self.em);
        }
        self.attributes(node);
        self.visit_field(node, "parameters");
        self.visit_field(node, "body");
    }

    fn function(&mut self, node: Node<'t>) {
        if let Some(name) = self.em.field_text(node, "name") {
            let ty = self.em.field_type(node, "return_type");
            let local = self.is_local(node);
            let ns = self.namespace(node);
            self.em
                .entry(name, node, Ctx::Function)
                .parent(self.parent(node))
                .scope(local.then_some("local"))
                .namespace(ns)
                .type_name(ty)
                .emit(self.em);
        }
        self.attributes(node);
        self.visit_field(node, "parameters");
        self.visit_field(node, "body");
    }

    fn property(&mut self, node: Node<'t>) {
        let (found, visibility) = member_modifiers(node, self.em);
        let ty = self.em.field_type(node, "type");
        let owner = self.owner(node);
        for element in named_children(node).into_iter().filter(|c| c.kind() == "property_element") {
            let name = element
                .child_by_field_name("name")
                .or_else(|| child_of_kind(element, "variable_name"))
                .map(|n| bare(self.em.text(n)));
            if let Some(name) = name {
                self.em
                    .entry(name, element, Ctx::Property)
                    .parent(owner)
                    .scope(visibility.unwrap_or("public"))
                    .modifier(ordered_modifiers(&found, MODIFIERS))
                    .type_name(ty.clone())
                    .emit(self.em);
            }
            if let Some(default) = element.child_by_field_name("default_value") {
                self.visit(default);
            }
        }
    }

    fn constant(&mut self, node: Node<'t>) {
        let (_, visibility) = member_modifiers(node, self.em);
        let owner = self.owner(node);
        let ns = if owner.is_none() { self.namespace(node) } else { None };
        for element in named_children(node).into_iter().filter(|c| c.kind() == "const_element") {
            let named = named_children(element);
            let Some(name_node) = named.iter().copied().find(|c| c.kind() == "name") else {
                continue;
            };
            let name = self.em.text(name_node);
            self.em
                .entry(name, element, Ctx::Variable)
                .parent(owner)
                .scope(visibility.or(owner.map(|_| "public")))
                .modifier("const")
                .namespace(ns)
                .emit(self.em);
            for value in named.into_iter().filter(|c| c.id() != name_node.id()) {
                self.visit(value);
            }
        }
    }

    fn parameter(&mut self, node: Node<'t>) {
        if let Some(name_node) = node.child_by_field_name("name") {
            let name = bare(self.em.text(name_node));
            let ty = self.em.field_type(node, "type");
            let variadic = node.kind() == "variadic_parameter";
            let by_ref = child_of_kind(node, "reference_modifier").is_some();
            let clue = if variadic {
                Some("variadic")
            } else if by_ref {
                Some("reference")
            } else {
                None
            };
            self.em
                .entry(name, name_node, Ctx::Argument)
                .parent(self.parent(node))
                .clue(clue)
                .type_name(ty.clone())
                .emit(self.em);
            // Constructor promotion declares a property on the class too.
            if node.kind() == "property_promotion_parameter" {
                let (found, visibility) = member_modifiers(node, self.em);
                self.em
                    .entry(name, name_node, Ctx::Property)
                    .parent(self.owner(node))
                    .scope(visibility.unwrap_or("public"))
                    .modifier(ordered_modifiers(&found, MODIFIERS))
                    .type_name(ty)
                    .emit(self.em);
            }
        }
        self.visit_field(node, "default_value");
    }

    fn assignment(&mut self, node: Node<'t>) {
        let right = node.child_by_field_name("right");
        if let Some(left) = node.child_by_field_name("left") {
            self.bind(left, right, node);
        }
        if let Some(r) = right {
            self.visit(r);
        }
    }

    fn bind(&mut self, target: Node<'t>, value: Option<Node<'t>>, at: Node<'t>) {
        match target.kind() {
            "variable_name" => {
                let name = bare(self.em.text(target));
                if name == "this" {
                    return;
                }
                let lambda = value.is_some_and(|v| {
                    matches!(
                        v.kind(),
                        "anonymous_function"
                            | "anonymous_function_creation_expression"
                            | "arrow_function"
                    )
                });
                let local = self.is_local(at);
                let ns = if local { None } else { self.namespace(at) };
                self.em
                    .entry(name, target, if lambda { Ctx::Lambda } else { Ctx::Variable })
                    .parent(self.parent(at))
                    .scope(local.then_some("local"))
                    .namespace(ns)
                    .emit(self.em);
            }
            "member_access_expression" | "nullsafe_member_access_expression" => {
                let object = target.child_by_field_name("object");
                if let Some(n) = target.child_by_field_name("name") {
                    let name = bare(self.em.text(n));
                    let receiver = object.and_then(|o| receiver_name(self.em.text(o)));
                    self.em.entry(name, n, Ctx::Property).parent(receiver).emit(self.em);
                }
                if let Some(o) = object {
                    self.visit(o);
                }
            }
            "list_literal" | "array_creation_expression" => {
                for element in named_children(target) {
                    let inner = if element.kind() == "array_element_initializer" {
                        named_children(element).into_iter().last()
                    } else {
                        Some(element)
                    };
                    if let Some(inner) = inner {
                        self.bind(inner, None, at);
                    }
                }
            }
            _ => self.visit(target),
        }
    }

    /// Bare variables passed as arguments are indexed with the callee as
    /// clue, bypassing the filter.
    fn arguments(&mut self, node: Node<'t>, callee: Option<&str>) {
        let Some(args) = node.child_by_field_name("arguments") else {
            return;
        };
        for arg in named_children(args) {
            let value = if arg.kind() == "argument" {
                named_children(arg).into_iter().last()
            } else {
                Some(arg)
            };
            let Some(value) = value else {
                continue;
            };
            if value.kind() == "variable_name" {
                let text = bare(self.em.text(value));
                self.em
                    .entry(text, value, Ctx::Argument)
                    .parent(self.parent(node))
                    .clue(callee)
                    .emit_unfiltered(self.em);
            } else {
                self.visit(value);
            }
        }
    }

    fn function_call(&mut self, node: Node<'t>) {
        let function = node.child_by_field_name("function");
        let mut name = None;
        if let Some(f) = function {
            if matches!(f.kind(), "name" | "qualified_name") {
                let short = last_segment(self.em.text(f));
                name = Some(short);
                self.em
                    .entry(short, f, Ctx::Call)
                    .parent(self.parent(node))
                    .emit(self.em);
            } else {
                self.visit(f);
            }
        }
        self.arguments(node, name);
    }

    fn member_call(&mut self, node: Node<'t>) {
        let object = node.child_by_field_name("object");
        let name = node.child_by_field_name("name").map(|n| self.em.text(n));
        if let (Some(text), Some(n)) = (name, node.child_by_field_name("name")) {
            let receiver = object.and_then(|o| receiver_name(self.em.text(o)));
            self.em.entry(text, n, Ctx::Call).parent(receiver).emit(self.em);
        }
        if let Some(o) = object {
            self.visit(o);
        }
        self.arguments(node, name);
    }

    fn scoped_call(&mut self, node: Node<'t>) {
        let scope = node.child_by_field_name("scope");
        let name = node.child_by_field_name("name").map(|n| self.em.text(n));
        if let (Some(text), Some(n)) = (name, node.child_by_field_name("name")) {
            let owner = scope.map(|s| last_segment(self.em.text(s)));
            self.em
                .entry(text, n, Ctx::Call)
                .parent(owner)
                .clue("static")
                .emit(self.em);
        }
        self.arguments(node, name);
    }

    fn object_creation(&mut self, node: Node<'t>, ctx: Ctx, clue: &str) {
        let class = named_children(node)
            .into_iter()
            .find(|c| matches!(c.kind(), "name" | "qualified_name"));
        let mut name = None;
        if let Some(c) = class {
            let short = last_segment(self.em.text(c));
            name = Some(short);
            self.em
                .entry(short, c, ctx)
                .parent(self.parent(node))
                .clue(clue)
                .emit(self.em);
        } else {
            for child in named_children(node) {
                if child.kind() != "arguments" {
                    self.visit(child);
                }
            }
        }
        self.arguments(node, name);
    }

    fn member_access(&mut self, node: Node<'t>) {
        let object = node.child_by_field_name("object");
        if let Some(n) = node.child_by_field_name("name")
            && n.kind() == "name"
        {
            let text = self.em.text(n);
            let receiver = object.and_then(|o| receiver_name(self.em.text(o)));
            self.em.entry(text, n, Ctx::Property).parent(receiver).emit(self.em);
        }
        if let Some(o) = object {
            self.visit(o);
        }
    }

    fn catch(&mut self, node: Node<'t>) {
        let parent = self.parent(node);
        if let Some(types) = node.child_by_field_name("type") {
            let named = if types.kind() == "type_list" {
                named_children(types)
            } else {
                vec![types]
            };
            for ty in named {
                let text = last_segment(self.em.text(ty));
                self.em
                    .entry(text, ty, Ctx::Exception)
                    .parent(parent)
                    .clue("catch")
                    .emit(self.em);
            }
        }
        if let Some(var) = node.child_by_field_name("name") {
            let text = bare(self.em.text(var));
            self.em
                .entry(text, var, Ctx::Variable)
                .parent(parent)
                .scope("local")
                .clue("catch")
                .emit(self.em);
        }
        self.visit_field(node, "body");
    }

    fn throw(&mut self, node: Node<'t>) {
        for child in named_children(node) {
            if child.kind() == "object_creation_expression" {
                self.object_creation(child, Ctx::Exception, "throw");
            } else {
                self.visit(child);
            }
        }
    }

    fn label(&mut self, node: Node<'t>, ctx: Ctx) {
        if let Some(name) = child_of_kind(node, "name") {
            let text = self.em.text(name);
            self.em.entry(text, name, ctx).parent(self.parent(node)).emit(self.em);
        }
    }

    /// `#[Route('/x')]` is a call to the attribute class.
    fn attribute(&mut self, node: Node<'t>) {
        let class = named_children(node)
            .into_iter()
            .find(|c| matches!(c.kind(), "name" | "qualified_name"));
        if let Some(c) = class {
            let short = last_segment(self.em.text(c));
            self.em.entry(short, c, Ctx::Call).clue("attribute").emit(self.em);
        }
        if let Some(args) = child_of_kind(node, "arguments") {
            self.visit(args);
        }
    }
}
