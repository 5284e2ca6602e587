use crate::model::{SourceSpan, TypeKind};
use crate::util;
use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// One parsed file. Immutable: re-parsing produces a new unit.
pub struct SourceUnit {
    rel_path: String,
    abs_path: PathBuf,
    text: String,
    tree: Tree,
}

impl SourceUnit {
    pub fn rel_path(&self) -> &str {
        &self.rel_path
    }

    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

pub struct CSharpParser {
    parser: Parser,
}

impl CSharpParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_c_sharp::LANGUAGE;
        parser.set_language(&language.into())?;
        Ok(Self { parser })
    }

    pub fn parse_tree(&mut self, text: &str) -> Option<Tree> {
        self.parser.parse(text, None)
    }

    pub fn parse(&mut self, rel_path: &str, abs_path: &Path, text: String) -> Result<SourceUnit> {
        let tree = self
            .parse_tree(&text)
            .ok_or_else(|| anyhow!("parser produced no tree for {rel_path}"))?;
        Ok(SourceUnit {
            rel_path: rel_path.to_string(),
            abs_path: abs_path.to_path_buf(),
            text,
            tree,
        })
    }
}

pub fn is_type_declaration(kind: &str) -> bool {
    TypeKind::from_node_kind(kind).is_some()
}

fn is_namespace(kind: &str) -> bool {
    kind == "namespace_declaration" || kind == "file_scoped_namespace_declaration"
}

/// Kinds that introduce a name through their `name` field.
pub fn is_declaring_node(kind: &str) -> bool {
    kind.ends_with("_declaration")
        || matches!(
            kind,
            "variable_declarator"
                | "parameter"
                | "type_parameter"
                | "local_function_statement"
                | "declaration_expression"
                | "foreach_statement"
        )
}

pub fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

pub fn name_of(node: Node<'_>, source: &str) -> Option<String> {
    let name = node.child_by_field_name("name")?;
    let text = node_text(name, source).trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

pub fn span(node: Node<'_>) -> SourceSpan {
    SourceSpan {
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
    }
}

/// All named descendants of `node` in document order, `node` included.
pub fn descendants(node: Node<'_>) -> Vec<Node<'_>> {
    descendants_pruned(node, |_| false)
}

/// Like [`descendants`], but does not enter nodes for which `prune` holds
/// (other than `node` itself). Pruned nodes are not returned.
pub fn descendants_pruned<'t>(node: Node<'t>, prune: impl Fn(Node<'t>) -> bool) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current != node && prune(current) {
            continue;
        }
        out.push(current);
        let mut cursor = current.walk();
        let children: Vec<_> = current.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

/// Type declarations of a unit, nested ones included, in document order.
pub fn type_declarations(root: Node<'_>) -> Vec<Node<'_>> {
    descendants(root)
        .into_iter()
        .filter(|node| is_type_declaration(node.kind()))
        .collect()
}

/// Direct member declarations of a type declaration's body.
pub fn body_members(declaration: Node<'_>) -> Vec<Node<'_>> {
    let Some(body) = declaration.child_by_field_name("body") else {
        return Vec::new();
    };
    let mut cursor = body.walk();
    body.named_children(&mut cursor).collect()
}

pub fn variable_declarator_names(declaration: Node<'_>, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = declaration.walk();
    for child in declaration.named_children(&mut cursor) {
        if child.kind() != "variable_declaration" {
            continue;
        }
        let mut inner = child.walk();
        for declarator in child.named_children(&mut inner) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            if let Some(name) = name_of(declarator, source) {
                names.push(name);
            }
        }
    }
    names
}

pub fn enclosing_type(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.parent();
    while let Some(parent) = current {
        if is_type_declaration(parent.kind()) {
            return Some(parent);
        }
        current = parent.parent();
    }
    None
}

/// Innermost member whose parameters and locals are in scope at `node`.
pub fn enclosing_member(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "method_declaration"
            | "constructor_declaration"
            | "destructor_declaration"
            | "operator_declaration"
            | "conversion_operator_declaration"
            | "property_declaration"
            | "indexer_declaration"
            | "event_declaration"
            | "global_statement" => return Some(parent),
            kind if is_type_declaration(kind) => return None,
            _ => {}
        }
        current = parent.parent();
    }
    None
}

/// Namespace- and type-qualified name of a declaration, e.g.
/// `Acme.App.Outer.Inner`.
pub fn qualified_name(declaration: Node<'_>, source: &str) -> Option<String> {
    let mut parts = vec![name_of(declaration, source)?];
    let mut in_file_namespace = declaration.kind() == "file_scoped_namespace_declaration";
    let mut current = declaration.parent();
    while let Some(parent) = current {
        let kind = parent.kind();
        if is_type_declaration(kind) || is_namespace(kind) {
            if let Some(name) = name_of(parent, source) {
                parts.push(name);
            }
            in_file_namespace |= kind == "file_scoped_namespace_declaration";
        } else if kind == "compilation_unit" && !in_file_namespace {
            if let Some(name) = file_scoped_namespace(parent, source) {
                parts.push(name);
            }
        }
        current = parent.parent();
    }
    parts.reverse();
    Some(parts.join("."))
}

fn file_scoped_namespace(root: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = root.walk();
    let namespace = root
        .named_children(&mut cursor)
        .find(|child| child.kind() == "file_scoped_namespace_declaration")?;
    name_of(namespace, source)
}

/// `(params) -> returns` with whitespace collapsed, for methods.
pub fn method_signature(node: Node<'_>, source: &str) -> Option<String> {
    let params = node
        .child_by_field_name("parameters")
        .map(|n| util::collapse_whitespace(node_text(n, source)))
        .filter(|value| !value.is_empty())?;
    let returns = node
        .child_by_field_name("returns")
        .map(|n| util::collapse_whitespace(node_text(n, source)))
        .filter(|value| !value.is_empty());
    match returns {
        Some(ret) => Some(format!("{params} -> {ret}")),
        None => Some(params),
    }
}

/// Strips `global::`, generic arguments, array ranks and nullable markers
/// from a written type, e.g. `global::Acme.List<Foo>[]?` becomes
/// `Acme.List`. Returns `None` for anything that is not a plain name.
pub fn normalize_type_name(raw: &str) -> Option<String> {
    let text = raw.trim();
    let text = text.strip_prefix("global::").unwrap_or(text);
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            '[' if depth == 0 => break,
            _ if depth > 0 => {}
            ch if ch.is_whitespace() || ch == '?' => {}
            ch => out.push(ch),
        }
    }
    let out = out.replace("::", ".");
    let valid = !out.is_empty()
        && !out.starts_with('.')
        && !out.ends_with('.')
        && out
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '.' || ch == '@');
    if valid { Some(out) } else { None }
}

pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
