//! Shared types and data structures.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// The construct kind of a [`SymbolEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContextType {
    Function,
    Variable,
    Type,
    Property,
    Argument,
    Call,
    Import,
    Export,
    Class,
    Interface,
    Trait,
    Enum,
    EnumCase,
    Namespace,
    Comment,
    String,
    Label,
    Goto,
    Exception,
    Lambda,
    Filename,
}

impl ContextType {
    /// Every context type, in declaration order.
    pub const ALL: [ContextType; 21] = [
        ContextType::Function,
        ContextType::Variable,
        ContextType::Type,
        ContextType::Property,
        ContextType::Argument,
        ContextType::Call,
        ContextType::Import,
        ContextType::Export,
        ContextType::Class,
        ContextType::Interface,
        ContextType::Trait,
        ContextType::Enum,
        ContextType::EnumCase,
        ContextType::Namespace,
        ContextType::Comment,
        ContextType::String,
        ContextType::Label,
        ContextType::Goto,
        ContextType::Exception,
        ContextType::Lambda,
        ContextType::Filename,
    ];

    /// The canonical upper-case name (`"FUNCTION"`, `"ENUM_CASE"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            ContextType::Function => "FUNCTION",
            ContextType::Variable => "VARIABLE",
            ContextType::Type => "TYPE",
            ContextType::Property => "PROPERTY",
            ContextType::Argument => "ARGUMENT",
            ContextType::Call => "CALL",
            ContextType::Import => "IMPORT",
            ContextType::Export => "EXPORT",
            ContextType::Class => "CLASS",
            ContextType::Interface => "INTERFACE",
            ContextType::Trait => "TRAIT",
            ContextType::Enum => "ENUM",
            ContextType::EnumCase => "ENUM_CASE",
            ContextType::Namespace => "NAMESPACE",
            ContextType::Comment => "COMMENT",
            ContextType::String => "STRING",
            ContextType::Label => "LABEL",
            ContextType::Goto => "GOTO",
            ContextType::Exception => "EXCEPTION",
            ContextType::Lambda => "LAMBDA",
            ContextType::Filename => "FILENAME",
        }
    }

    /// Whether entries of this type describe a definition and therefore
    /// carry a `definition` span.
    pub fn is_definition(self) -> bool {
        matches!(
            self,
            ContextType::Function
                | ContextType::Class
                | ContextType::Interface
                | ContextType::Trait
                | ContextType::Enum
                | ContextType::Type
                | ContextType::Namespace
                | ContextType::Lambda
        )
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextType {
    type Err = String;

    /// Parse a context type name, case-insensitively (`function`, `ENUM_CASE`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase().replace('-', "_");
        ContextType::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == upper)
            .ok_or_else(|| format!("unknown context type: {s}"))
    }
}

/// A source span: 1-based rows, 0-based columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} - {}:{}",
            self.start_row, self.start_col, self.end_row, self.end_col
        )
    }
}

/// One normalized record describing a discovered named construct.
///
/// The extended columns (`parent` through `definition`) are `None` when they
/// do not apply to the construct, never as a stand-in for "unknown".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolEntry {
    /// Symbol text, bounded by the configured maximum length.
    pub symbol: String,
    /// 1-based line number.
    pub line: usize,
    /// What kind of construct this is.
    pub context: ContextType,
    /// Directory of the source file, relative to the project root.
    pub directory: String,
    /// File name of the source file (with extension).
    pub filename: String,
    /// Span of the construct (`startRow:startCol - endRow:endCol`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Enclosing class/function, or the receiver of a call or member access.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Visibility (`public`, `private`, ...) or `local`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Space separated modifiers in priority order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    /// Usage role not otherwise modeled (`embedded`, `await`, callee name, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clue: Option<String>,
    /// Enclosing namespace or package.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Normalized declared or return type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Full span of a definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl SymbolEntry {
    /// Create an entry with every extended column empty.
    pub fn new(symbol: impl Into<String>, line: usize, context: ContextType) -> Self {
        Self {
            symbol: symbol.into(),
            line,
            context,
            directory: String::new(),
            filename: String::new(),
            location: None,
            parent: None,
            scope: None,
            modifier: None,
            clue: None,
            namespace: None,
            type_name: None,
            definition: None,
        }
    }
}

/// Everything extracted from one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntries {
    /// Directory relative to the project root (`""` at the root).
    pub directory: String,
    /// File name including extension.
    pub filename: String,
    /// Language name (e.g. "Go", "TypeScript").
    pub language: String,
    /// Entries in pre-order traversal order; the first is always FILENAME.
    pub entries: Vec<SymbolEntry>,
}

impl FileEntries {
    /// The `/`-joined path relative to the project root.
    pub fn rel_path(&self) -> String {
        if self.directory.is_empty() {
            self.filename.clone()
        } else {
            format!("{}/{}", self.directory, self.filename)
        }
    }
}
