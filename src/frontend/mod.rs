//! Front end: C# parsing plus the semantic queries the indexer and the
//! patcher consume. Everything downstream talks to [`SemanticModel`], never
//! to resolution internals.

pub mod semantic;
pub mod symbols;
pub mod syntax;

use tree_sitter::Node;

pub use semantic::UnitModel;
pub use symbols::SymbolTable;
pub use syntax::{CSharpParser, SourceUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Type,
    Method,
    Field,
    Property,
    Event,
}

/// Whether a symbol is declared in the indexed codebase or only known by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolOrigin {
    Source,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    pub qualified_name: String,
    /// Qualified name of the declaring type, for members and nested types.
    pub containing_type: Option<String>,
    pub origin: SymbolOrigin,
}

impl Symbol {
    pub fn is_source(&self) -> bool {
        self.origin == SymbolOrigin::Source
    }

    /// The type a reference to this symbol depends on: the type itself, or
    /// the declaring type of a member.
    pub fn owning_type(&self) -> Option<&str> {
        match self.kind {
            SymbolKind::Type => Some(&self.qualified_name),
            _ => self.containing_type.as_deref(),
        }
    }
}

/// Semantic queries over one parsed source unit. Implementations must
/// tolerate incomplete code: anything unresolvable yields `None`.
pub trait SemanticModel {
    /// Type named by a type syntax node or attribute, or the static type of an
    /// expression.
    fn type_of(&self, node: Node<'_>) -> Option<Symbol>;

    fn declared_symbol_of(&self, declaration: Node<'_>) -> Option<Symbol>;

    fn resolve_reference(&self, identifier: Node<'_>) -> Option<Symbol>;

    fn resolve_call_target(&self, invocation: Node<'_>) -> Option<Symbol>;

    /// Exact source text covered by `node`.
    fn render_text(&self, node: Node<'_>) -> &str;
}
