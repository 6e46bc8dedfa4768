mod common;

use symdex::extract::Lang;
use symdex::types::ContextType;

use common::{extract, find, find_child, has, symbols};

const SRC: &str = r#"package store

import (
	"fmt"
	str "strings"
)

// Store keeps values in memory.
type Store struct {
	sync.Mutex
	Name  string
	items map[string]*Item
}

type Getter interface {
	io.Closer
	Get(key string) (*Item, error)
}

type ID int64

type Alias = string

const Limit = 10

var ErrMissing = fmt.Errorf("missing")

func New(name string, opts ...Option) *Store {
	s := &Store{Name: name}
	for i, o := range opts {
		o(s, i)
	}
	return s
}

func (s *Store) Get(key string) (*Item, error) {
	upper := func(v string) string { return str.ToUpper(v) }
	item, ok := s.items[upper(key)]
	if !ok {
		return nil, ErrMissing
	}
	go s.refresh(key)
	defer s.Unlock()
	return item, nil
}

func scan() {
outer:
	for {
		break outer
	}
}
"#;

#[test]
fn package_and_imports() {
    let entries = extract(Lang::Go, SRC, "store/store.go");
    assert_eq!(find(&entries, ContextType::Namespace, "store").line, 1);
    assert_eq!(symbols(&entries, ContextType::Import), vec!["fmt", "strings"]);
    let aliased = find(&entries, ContextType::Import, "strings");
    assert_eq!(aliased.clue.as_deref(), Some("str"));
    assert_eq!(aliased.namespace.as_deref(), Some("store"));
}

#[test]
fn type_declarations() {
    let entries = extract(Lang::Go, SRC, "store/store.go");

    let store = find(&entries, ContextType::Class, "Store");
    assert_eq!(store.scope.as_deref(), Some("public"));
    assert_eq!(store.namespace.as_deref(), Some("store"));

    assert!(has(&entries, ContextType::Interface, "Getter"));

    let id = find(&entries, ContextType::Type, "ID");
    assert_eq!(id.type_name.as_deref(), Some("int64"));

    let alias = find(&entries, ContextType::Type, "Alias");
    assert_eq!(alias.clue.as_deref(), Some("alias"));
    assert_eq!(alias.type_name.as_deref(), Some("string"));
}

#[test]
fn struct_fields() {
    let entries = extract(Lang::Go, SRC, "store/store.go");

    let embedded = find(&entries, ContextType::Property, "Mutex");
    assert_eq!(embedded.clue.as_deref(), Some("embedded"));
    assert_eq!(embedded.parent.as_deref(), Some("Store"));

    let name = find(&entries, ContextType::Property, "Name");
    assert_eq!(name.scope.as_deref(), Some("public"));
    assert_eq!(name.type_name.as_deref(), Some("string"));

    let items = find(&entries, ContextType::Property, "items");
    assert_eq!(items.scope.as_deref(), Some("private"));
    assert_eq!(items.parent.as_deref(), Some("Store"));
}

#[test]
fn interface_members() {
    let entries = extract(Lang::Go, SRC, "store/store.go");

    let closer = find(&entries, ContextType::Property, "Closer");
    assert_eq!(closer.clue.as_deref(), Some("embedded"));
    assert_eq!(closer.parent.as_deref(), Some("Getter"));

    let get = find_child(&entries, ContextType::Function, "Get", "Getter");
    assert_eq!(get.scope.as_deref(), Some("public"));
}

#[test]
fn package_level_values() {
    let entries = extract(Lang::Go, SRC, "store/store.go");

    let limit = find(&entries, ContextType::Variable, "Limit");
    assert_eq!(limit.modifier.as_deref(), Some("const"));
    assert_eq!(limit.scope.as_deref(), Some("public"));

    let err = find(&entries, ContextType::Variable, "ErrMissing");
    assert!(err.modifier.is_none());
    let errorf = find(&entries, ContextType::Call, "Errorf");
    assert_eq!(errorf.parent.as_deref(), Some("fmt"));
}

#[test]
fn functions_and_parameters() {
    let entries = extract(Lang::Go, SRC, "store/store.go");

    let new = find(&entries, ContextType::Function, "New");
    assert_eq!(new.scope.as_deref(), Some("public"));
    assert_eq!(new.type_name.as_deref(), Some("*Store"));
    assert!(new.parent.is_none());

    let opts = find(&entries, ContextType::Argument, "opts");
    assert_eq!(opts.clue.as_deref(), Some("variadic"));
    assert_eq!(opts.parent.as_deref(), Some("New"));

    let scan = find(&entries, ContextType::Function, "scan");
    assert_eq!(scan.scope.as_deref(), Some("private"));
}

#[test]
fn methods_hang_off_receiver_type() {
    let entries = extract(Lang::Go, SRC, "store/store.go");
    let get = find_child(&entries, ContextType::Function, "Get", "Store");
    assert_eq!(get.scope.as_deref(), Some("public"));

    let receiver = find_child(&entries, ContextType::Argument, "s", "Get");
    assert_eq!(receiver.type_name.as_deref(), Some("*Store"));
}

#[test]
fn locals() {
    let entries = extract(Lang::Go, SRC, "store/store.go");

    let s = find(&entries, ContextType::Variable, "s");
    assert_eq!(s.scope.as_deref(), Some("local"));
    assert_eq!(s.parent.as_deref(), Some("New"));

    assert!(has(&entries, ContextType::Variable, "i"));
    assert!(has(&entries, ContextType::Variable, "o"));
    assert!(has(&entries, ContextType::Variable, "item"));
    assert!(has(&entries, ContextType::Variable, "ok"));

    let upper = find(&entries, ContextType::Lambda, "upper");
    assert_eq!(upper.parent.as_deref(), Some("Get"));
}

#[test]
fn calls_and_arguments() {
    let entries = extract(Lang::Go, SRC, "store/store.go");

    let refresh = find(&entries, ContextType::Call, "refresh");
    assert_eq!(refresh.clue.as_deref(), Some("go"));
    assert_eq!(refresh.parent.as_deref(), Some("s"));

    let unlock = find(&entries, ContextType::Call, "Unlock");
    assert_eq!(unlock.clue.as_deref(), Some("defer"));

    let to_upper = find(&entries, ContextType::Call, "ToUpper");
    assert_eq!(to_upper.parent.as_deref(), Some("str"));

    let key = entries
        .iter()
        .find(|e| e.context == ContextType::Argument && e.clue.as_deref() == Some("upper"))
        .expect("call argument");
    assert_eq!(key.symbol, "key");
    assert_eq!(key.parent.as_deref(), Some("Get"));
}

#[test]
fn selectors_are_properties() {
    let entries = extract(Lang::Go, SRC, "store/store.go");
    let items = find_child(&entries, ContextType::Property, "items", "s");
    assert_eq!(items.line, 38);
}

#[test]
fn labels_and_comments() {
    let entries = extract(Lang::Go, SRC, "store/store.go");

    let label = find(&entries, ContextType::Label, "outer");
    assert_eq!(label.parent.as_deref(), Some("scan"));
    let jump = find(&entries, ContextType::Goto, "outer");
    assert_eq!(jump.clue.as_deref(), Some("break"));

    let word = find(&entries, ContextType::Comment, "memory");
    assert_eq!(word.line, 8);
}

#[test]
fn anonymous_struct_variables_declare_fields() {
    let src = "package cfg\n\nvar settings struct {\n\tAddr string\n\tretries int\n}\n";
    let entries = extract(Lang::Go, src, "cfg/cfg.go");

    let settings = find(&entries, ContextType::Variable, "settings");
    assert_eq!(settings.type_name.as_deref(), Some("struct"));

    let addr = find(&entries, ContextType::Property, "Addr");
    assert_eq!(addr.parent.as_deref(), Some("settings"));
    assert_eq!(addr.scope.as_deref(), Some("public"));
    assert_eq!(addr.type_name.as_deref(), Some("string"));
    assert_eq!(addr.line, 4);

    let retries = find(&entries, ContextType::Property, "retries");
    assert_eq!(retries.scope.as_deref(), Some("private"));
}
