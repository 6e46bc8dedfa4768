//! C extraction.
//!
//! C names hide inside declarators: `static const char *names[4]` puts the
//! identifier under an array declarator under a pointer declarator. The
//! declarator is unwound to its identifier, and the pointer and array
//! layers are appended to the normalized base type. Anonymous structs,
//! unions and enums take their name from the enclosing `typedef`.

use tree_sitter::{Language, Node};

use super::context::within;
use super::emit::{Emitter, ordered_modifiers};
use super::table::NodeTable;
use super::typenorm::{Collapse, TypeStrategy, TypeTable};
use super::{Grammar, children, field_children, named_children, receiver_name, unquote};
use crate::types::ContextType as Ctx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Construct {
    Function,
    Declaration,
    TypeDef,
    Struct,
    Enum,
    Field,
    Parameter,
    Include,
    Define,
    MacroFunction,
    Call,
    FieldAccess,
    Label,
    Goto,
    Comment,
    Str,
}

const NODES: &[(&str, Construct)] = &[
    ("function_definition", Construct::Function),
    ("declaration", Construct::Declaration),
    ("type_definition", Construct::TypeDef),
    ("struct_specifier", Construct::Struct),
    ("union_specifier", Construct::Struct),
    ("enum_specifier", Construct::Enum),
    ("field_declaration", Construct::Field),
    ("parameter_declaration", Construct::Parameter),
    ("preproc_include", Construct::Include),
    ("preproc_def", Construct::Define),
    ("preproc_function_def", Construct::MacroFunction),
    ("call_expression", Construct::Call),
    ("field_expression", Construct::FieldAccess),
    ("labeled_statement", Construct::Label),
    ("goto_statement", Construct::Goto),
    ("comment", Construct::Comment),
    ("string_literal", Construct::Str),
];

const TYPES: &[(&str, TypeStrategy)] = &[
    ("primitive_type", TypeStrategy::Simple),
    ("type_identifier", TypeStrategy::Simple),
    ("sized_type_specifier", TypeStrategy::Simple),
    ("struct_specifier", TypeStrategy::StructuredCollapse(Collapse::Tagged("struct"))),
    ("union_specifier", TypeStrategy::StructuredCollapse(Collapse::Tagged("union"))),
    ("enum_specifier", TypeStrategy::StructuredCollapse(Collapse::Tagged("enum"))),
    ("macro_type_specifier", TypeStrategy::Skip),
    ("type_descriptor", TypeStrategy::UnwrapRecurse),
];

const MODIFIERS: &[&str] = &["extern", "static", "inline", "const", "volatile", "register"];

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

/// An unwound declarator.
struct Declarator<'t> {
    /// The identifier (or field/type identifier) being declared.
    name: Option<Node<'t>>,
    /// `*` and `[]` layers to append to the base type.
    suffix: String,
    /// Parameter list of the innermost function declarator.
    params: Option<Node<'t>>,
    /// A pointer layer sits between that function declarator and the name,
    /// so the name is a function pointer rather than a function.
    function_pointer: bool,
    /// Initializer of an `init_declarator`.
    value: Option<Node<'t>>,
}

impl Declarator<'_> {
    /// The name declares a function (definition or prototype).
    fn is_function(&self) -> bool {
        self.params.is_some() && !self.function_pointer
    }
}

fn unwind<'t>(node: Node<'t>) -> Declarator<'t> {
    let mut d = Declarator {
        name: None,
        suffix: String::new(),
        params: None,
        function_pointer: false,
        value: None,
    };
    let mut layers = Vec::new();
    // Index into `layers` where the innermost function declarator sits.
    let mut callee_start = 0;
    let mut current = Some(node);
    while let Some(n) = current {
        current = match n.kind() {
            "init_declarator" => {
                d.value = n.child_by_field_name("value");
                n.child_by_field_name("declarator")
            }
            "pointer_declarator" | "abstract_pointer_declarator" => {
                layers.push("*");
                if d.params.is_some() {
                    d.function_pointer = true;
                }
                n.child_by_field_name("declarator")
            }
            "array_declarator" | "abstract_array_declarator" => {
                layers.push("[]");
                n.child_by_field_name("declarator")
            }
            "function_declarator" => {
                // Only the innermost parameter list belongs to the declared name.
                d.params = n.child_by_field_name("parameters");
                d.function_pointer = false;
                callee_start = layers.len();
                n.child_by_field_name("declarator")
            }
            "parenthesized_declarator" | "attributed_declarator" => n.named_child(0),
            "identifier" | "field_identifier" | "type_identifier" => {
                d.name = Some(n);
                None
            }
            _ => None,
        };
    }
    // Outside-in order reads after the base type: `int *a[4]` is `int*[]`.
    // A function pointer keeps only the layers wrapping the name.
    d.suffix = if d.function_pointer {
        layers[callee_start..].concat()
    } else {
        layers.concat()
    };
    d
}

/// Storage-class and qualifier keywords attached to a declaration.
fn modifiers<'a>(node: Node, em: &Emitter<'a>) -> Vec<&'a str> {
    children(node)
        .into_iter()
        .filter(|c| matches!(c.kind(), "storage_class_specifier" | "type_qualifier"))
        .map(|c| em.text(c))
        .collect()
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
            Construct::Declaration => self.declaration(node),
            Construct::TypeDef => self.type_definition(node),
            Construct::Struct => self.aggregate(node),
            Construct::Enum => self.enumeration(node),
            Construct::Field => self.field(node),
            Construct::Parameter => self.parameter(node),
            Construct::Include => self.include(node),
            Construct::Define => self.define(node),
            Construct::MacroFunction => self.macro_function(node),
            Construct::Call => self.call(node),
            Construct::FieldAccess => self.field_access(node),
            Construct::Label => self.label(node),
            Construct::Goto => self.goto(node),
            Construct::Comment => self.em.words(node, Ctx::Comment, None),
            Construct::Str => {
                let parent = self.function_name(node);
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

    /// Name of the enclosing function definition.
    fn function_name(&self, node: Node<'t>) -> Option<&'a str> {
        let mut current = node.parent();
        while let Some(n) = current {
            if n.kind() == "function_definition" {
                return n
                    .child_by_field_name("declarator")
                    .and_then(|d| unwind(d).name)
                    .map(|name| self.em.text(name));
            }
            current = n.parent();
        }
        None
    }

    /// Name of a struct, union or enum specifier: its tag, or the name the
    /// surrounding `typedef` gives it.
    fn aggregate_name(&self, spec: Node<'t>) -> Option<&'a str> {
        if let Some(name) = self.em.field_text(spec, "name") {
            return Some(name);
        }
        let typedef = spec.parent().filter(|p| p.kind() == "type_definition")?;
        field_children(typedef, "declarator")
            .into_iter()
            .find_map(|d| unwind(d).name)
            .map(|n| self.em.text(n))
    }

    /// Nearest struct, union or enum specifier around `node`.
    fn owner(&self, node: Node<'t>) -> Option<&'a str> {
        let mut current = node.parent();
        while let Some(n) = current {
            if matches!(n.kind(), "struct_specifier" | "union_specifier" | "enum_specifier") {
                return self.aggregate_name(n);
            }
            current = n.parent();
        }
        None
    }

    fn is_local(&self, node: Node<'t>) -> bool {
        within(node, &self.t.nodes, |k| k == Construct::Function, |_| false)
    }

    /// File-level visibility: `static` is private to the translation unit.
    fn linkage(found: &[&str]) -> &'static str {
        if found.contains(&"static") { "private" } else { "public" }
    }

    fn declared_type(&mut self, decl: Node<'t>, d: &Declarator<'t>) -> Option<String> {
        let suffix = &d.suffix;
        if d.function_pointer {
            return Some(format!("func{suffix}"));
        }
        let base = self.em.field_type(decl, "type");
        match base {
            Some(b) => Some(format!("{b}{suffix}")),
            None if !suffix.is_empty() => Some(suffix.to_string()),
            None => None,
        }
    }

    fn function(&mut self, node: Node<'t>) {
        let d = node.child_by_field_name("declarator").map(unwind);
        if let Some(d) = &d
            && let Some(name_node) = d.name
        {
            let name = self.em.text(name_node);
            let found = modifiers(node, self.em);
            let ty = self.declared_type(node, d);
            self.em
                .entry(name, node, Ctx::Function)
                .scope(Self::linkage(&found))
                .modifier(ordered_modifiers(&found, MODIFIERS))
                .type_name(ty)
                .emit(self.em);
        }
        self.visit_field(node, "type");
        if let Some(params) = d.and_then(|d| d.params) {
            self.visit(params);
        }
        self.visit_field(node, "body");
    }

    fn declaration(&mut self, node: Node<'t>) {
        let found = modifiers(node, self.em);
        let local = self.is_local(node);
        let parent = if local { self.function_name(node) } else { None };
        let scope = if local { "local" } else { Self::linkage(&found) };
        for decl in field_children(node, "declarator") {
            let d = unwind(decl);
            if let Some(name_node) = d.name {
                let name = self.em.text(name_node);
                let prototype = d.is_function();
                let ty = self.declared_type(node, &d);
                self.em
                    .entry(name, name_node, if prototype { Ctx::Function } else { Ctx::Variable })
                    .parent(parent)
                    .scope(scope)
                    .modifier(ordered_modifiers(&found, MODIFIERS))
                    .clue(prototype.then_some("prototype"))
                    .type_name(ty)
                    .emit(self.em);
            }
            if let Some(params) = d.params {
                self.visit(params);
            }
            if let Some(value) = d.value {
                self.visit(value);
            }
        }
        self.visit_field(node, "type");
    }

    fn type_definition(&mut self, node: Node<'t>) {
        for decl in field_children(node, "declarator") {
            let d = unwind(decl);
            if let Some(name_node) = d.name {
                let name = self.em.text(name_node);
                let ty = self.declared_type(node, &d);
                self.em.entry(name, name_node, Ctx::Type).type_name(ty).emit(self.em);
            }
        }
        self.visit_field(node, "type");
    }

    fn aggregate(&mut self, node: Node<'t>) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        if let Some(name) = self.aggregate_name(node) {
            let clue = (node.kind() == "union_specifier").then_some("union");
            self.em
                .entry(name, node, Ctx::Class)
                .parent(self.owner(node))
                .clue(clue)
                .emit(self.em);
        }
        self.visit(body);
    }

    fn enumeration(&mut self, node: Node<'t>) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let name = self.aggregate_name(node);
        if let Some(name) = name {
            self.em.entry(name, node, Ctx::Enum).emit(self.em);
        }
        for enumerator in named_children(body).into_iter().filter(|e| e.kind() == "enumerator") {
            if let Some(case) = enumerator.child_by_field_name("name") {
                let text = self.em.text(case);
                self.em.entry(text, case, Ctx::EnumCase).parent(name).emit(self.em);
            }
            self.visit_field(enumerator, "value");
        }
    }

    fn field(&mut self, node: Node<'t>) {
        let owner = self.owner(node);
        for decl in field_children(node, "declarator") {
            let d = unwind(decl);
            if let Some(name_node) = d.name {
                let name = self.em.text(name_node);
                let ty = self.declared_type(node, &d);
                self.em
                    .entry(name, name_node, Ctx::Property)
                    .parent(owner)
                    .type_name(ty)
                    .emit(self.em);
            }
        }
        // Nested struct or union definitions.
        self.visit_field(node, "type");
    }

    fn parameter(&mut self, node: Node<'t>) {
        if let Some(decl) = node.child_by_field_name("declarator") {
            let d = unwind(decl);
            if let Some(name_node) = d.name {
                let name = self.em.text(name_node);
                let ty = self.declared_type(node, &d);
                let parent = self.enclosing_declared_name(node);
                self.em
                    .entry(name, name_node, Ctx::Argument)
                    .parent(parent)
                    .type_name(ty)
                    .emit(self.em);
            }
        }
    }

    /// Name declared by the function declarator a parameter list belongs to.
    fn enclosing_declared_name(&self, param: Node<'t>) -> Option<&'a str> {
        let declarator = param
            .parent()
            .filter(|p| p.kind() == "parameter_list")
            .and_then(|p| p.parent())
            .filter(|p| p.kind() == "function_declarator")?;
        unwind(declarator).name.map(|n| self.em.text(n))
    }

    fn include(&mut self, node: Node<'t>) {
        if let Some(path) = node.child_by_field_name("path") {
            let text = self.em.text(path);
            let system = path.kind() == "system_lib_string";
            let target = if system {
                text.trim_start_matches('<').trim_end_matches('>')
            } else {
                unquote(text)
            };
            self.em
                .entry(target, path, Ctx::Import)
                .clue(system.then_some("system"))
                .emit_unfiltered(self.em);
        }
    }

    fn define(&mut self, node: Node<'t>) {
        if let Some(name) = node.child_by_field_name("name") {
            let text = self.em.text(name);
            self.em
                .entry(text, name, Ctx::Variable)
                .clue("macro")
                .emit(self.em);
        }
    }

    fn macro_function(&mut self, node: Node<'t>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.em.text(name_node);
        self.em
            .entry(name, node, Ctx::Function)
            .clue("macro")
            .emit(self.em);
        if let Some(params) = node.child_by_field_name("parameters") {
            for p in named_children(params).into_iter().filter(|p| p.kind() == "identifier") {
                let text = self.em.text(p);
                self.em.entry(text, p, Ctx::Argument).parent(name).emit(self.em);
            }
        }
    }

    fn call(&mut self, node: Node<'t>) {
        let function = node.child_by_field_name("function");
        let mut callee = None;
        match function {
            Some(f) if f.kind() == "identifier" => {
                let text = self.em.text(f);
                callee = Some(text);
                self.em
                    .entry(text, f, Ctx::Call)
                    .parent(self.function_name(node))
                    .emit(self.em);
            }
            Some(f) if f.kind() == "field_expression" => {
                let object = f.child_by_field_name("argument");
                if let Some(field) = f.child_by_field_name("field") {
                    let text = self.em.text(field);
                    callee = Some(text);
                    let receiver = object.and_then(|o| receiver_name(self.em.text(o)));
                    self.em.entry(text, field, Ctx::Call).parent(receiver).emit(self.em);
                }
                if let Some(o) = object {
                    self.visit(o);
                }
            }
            Some(f) => self.visit(f),
            None => {}
        }
        let Some(args) = node.child_by_field_name("arguments") else {
            return;
        };
        for arg in named_children(args) {
            if arg.kind() == "identifier" {
                let text = self.em.text(arg);
                self.em
                    .entry(text, arg, Ctx::Argument)
                    .parent(self.function_name(node))
                    .clue(callee)
                    .emit_unfiltered(self.em);
            } else {
                self.visit(arg);
            }
        }
    }

    fn field_access(&mut self, node: Node<'t>) {
        let object = node.child_by_field_name("argument");
        if let Some(field) = node.child_by_field_name("field") {
            let text = self.em.text(field);
            let receiver = object.and_then(|o| receiver_name(self.em.text(o)));
            self.em.entry(text, field, Ctx::Property).parent(receiver).emit(self.em);
        }
        if let Some(o) = object {
            self.visit(o);
        }
    }

    fn label(&mut self, node: Node<'t>) {
        if let Some(label) = node.child_by_field_name("label") {
            let text = self.em.text(label);
            self.em
                .entry(text, label, Ctx::Label)
                .parent(self.function_name(node))
                .emit(self.em);
        }
        for child in named_children(node) {
            if child.kind() != "statement_identifier" {
                self.visit(child);
            }
        }
    }

    fn goto(&mut self, node: Node<'t>) {
        if let Some(label) = node.child_by_field_name("label") {
            let text = self.em.text(label);
            self.em
                .entry(text, label, Ctx::Goto)
                .parent(self.function_name(node))
                .emit(self.em);
        }
    }
}
