mod common;

use symdex::extract::Lang;
use symdex::types::ContextType;

use common::{extract, find, find_child, has, symbols};

const SRC: &str = r#"#include <stdio.h>
#include "list.h"

#define MAX_NODES 64
#define SQUARE(x) ((x) * (x))

typedef struct node {
    int value;
    struct node *next;
} node_t;

enum state { IDLE, BUSY = 2 };

static int count;
extern const char *names[4];

int list_len(const node_t *head);

static void push(node_t **head, int value) {
    int depth = 0;
    node_t *n = malloc(sizeof(node_t));
    n->value = value;
    if (depth > MAX_NODES) goto done;
    printf("pushed %d\n", value);
done:
    return;
}
"#;

#[test]
fn includes_are_imports() {
    let entries = extract(Lang::C, SRC, "src/list.c");
    let system = find(&entries, ContextType::Import, "stdio.h");
    assert_eq!(system.clue.as_deref(), Some("system"));
    let local = find(&entries, ContextType::Import, "list.h");
    assert!(local.clue.is_none());
}

#[test]
fn macros() {
    let entries = extract(Lang::C, SRC, "src/list.c");
    let max = find(&entries, ContextType::Variable, "MAX_NODES");
    assert_eq!(max.clue.as_deref(), Some("macro"));
    let square = find(&entries, ContextType::Function, "SQUARE");
    assert_eq!(square.clue.as_deref(), Some("macro"));
    let x = find(&entries, ContextType::Argument, "x");
    assert_eq!(x.parent.as_deref(), Some("SQUARE"));
}

#[test]
fn typedef_struct_and_fields() {
    let entries = extract(Lang::C, SRC, "src/list.c");
    assert!(has(&entries, ContextType::Class, "node"));
    assert!(has(&entries, ContextType::Type, "node_t"));

    let value = find(&entries, ContextType::Property, "value");
    assert_eq!(value.parent.as_deref(), Some("node"));
    assert_eq!(value.type_name.as_deref(), Some("int"));

    let next = find(&entries, ContextType::Property, "next");
    assert_eq!(next.type_name.as_deref(), Some("struct node*"));
}

#[test]
fn enum_cases() {
    let entries = extract(Lang::C, SRC, "src/list.c");
    assert!(has(&entries, ContextType::Enum, "state"));
    assert_eq!(symbols(&entries, ContextType::EnumCase), vec!["IDLE", "BUSY"]);
    assert_eq!(find(&entries, ContextType::EnumCase, "BUSY").parent.as_deref(), Some("state"));
}

#[test]
fn file_level_linkage() {
    let entries = extract(Lang::C, SRC, "src/list.c");

    let count = find(&entries, ContextType::Variable, "count");
    assert_eq!(count.scope.as_deref(), Some("private"));
    assert_eq!(count.modifier.as_deref(), Some("static"));

    let names = find(&entries, ContextType::Variable, "names");
    assert_eq!(names.scope.as_deref(), Some("public"));
    assert_eq!(names.modifier.as_deref(), Some("extern const"));
    assert_eq!(names.type_name.as_deref(), Some("char*[]"));

    let push = find(&entries, ContextType::Function, "push");
    assert_eq!(push.scope.as_deref(), Some("private"));
    assert_eq!(push.type_name.as_deref(), Some("void"));
    assert!(push.definition.is_some());
}

#[test]
fn prototypes() {
    let entries = extract(Lang::C, SRC, "src/list.c");
    let proto = find(&entries, ContextType::Function, "list_len");
    assert_eq!(proto.clue.as_deref(), Some("prototype"));
    let head = find_child(&entries, ContextType::Argument, "head", "list_len");
    assert_eq!(head.type_name.as_deref(), Some("node_t*"));
}

#[test]
fn function_bodies() {
    let entries = extract(Lang::C, SRC, "src/list.c");

    let head = find_child(&entries, ContextType::Argument, "head", "push");
    assert_eq!(head.type_name.as_deref(), Some("node_t**"));

    let depth = find(&entries, ContextType::Variable, "depth");
    assert_eq!(depth.scope.as_deref(), Some("local"));
    assert_eq!(depth.parent.as_deref(), Some("push"));

    let malloc = find(&entries, ContextType::Call, "malloc");
    assert_eq!(malloc.parent.as_deref(), Some("push"));

    let field = find_child(&entries, ContextType::Property, "value", "n");
    assert_eq!(field.line, 22);

    let arg = entries
        .iter()
        .find(|e| e.context == ContextType::Argument && e.clue.as_deref() == Some("printf"))
        .expect("call argument");
    assert_eq!(arg.symbol, "value");
}

#[test]
fn labels_and_gotos() {
    let entries = extract(Lang::C, SRC, "src/list.c");
    let label = find(&entries, ContextType::Label, "done");
    assert_eq!(label.parent.as_deref(), Some("push"));
    let jump = find(&entries, ContextType::Goto, "done");
    assert!(jump.line < label.line);
}

#[test]
fn string_words_carry_function() {
    let entries = extract(Lang::C, SRC, "src/list.c");
    let word = find(&entries, ContextType::String, "pushed");
    assert_eq!(word.parent.as_deref(), Some("push"));
}

#[test]
fn function_pointers_are_variables() {
    let src = concat!(
        "int (*handler)(int code);\n",
        "int *make(void);\n",
        "typedef void (*visit_fn)(node_t *);\n",
        "struct ops { void (*run)(void); };\n",
    );
    let entries = extract(Lang::C, src, "src/ops.c");

    let handler = find(&entries, ContextType::Variable, "handler");
    assert_eq!(handler.type_name.as_deref(), Some("func*"));
    assert!(handler.clue.is_none());
    assert!(!has(&entries, ContextType::Function, "handler"));
    assert_eq!(find(&entries, ContextType::Argument, "code").parent.as_deref(), Some("handler"));

    let make = find(&entries, ContextType::Function, "make");
    assert_eq!(make.clue.as_deref(), Some("prototype"));
    assert_eq!(make.type_name.as_deref(), Some("int*"));

    assert_eq!(find(&entries, ContextType::Type, "visit_fn").type_name.as_deref(), Some("func*"));

    let run = find(&entries, ContextType::Property, "run");
    assert_eq!(run.parent.as_deref(), Some("ops"));
    assert_eq!(run.type_name.as_deref(), Some("func*"));
}
