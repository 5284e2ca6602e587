use crate::frontend::symbols::{SymbolTable, TypeDecl};
use crate::frontend::syntax::{
    SourceUnit, descendants, enclosing_member, enclosing_type, is_declaring_node,
    is_type_declaration, name_of, node_text, normalize_type_name, qualified_name, simple_name,
};
use crate::frontend::{SemanticModel, Symbol, SymbolKind, SymbolOrigin};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tree_sitter::Node;

/// Local name -> declared type (None for `var` without a readable initializer).
type Locals = HashMap<String, Option<String>>;

/// Semantic model for one source unit, resolving against the codebase-wide
/// [`SymbolTable`]. Resolution is syntactic: declared types, members, locals
/// and parameters are understood; anything else is external or unresolved.
pub struct UnitModel<'a> {
    unit: &'a SourceUnit,
    table: &'a SymbolTable,
    locals: RefCell<HashMap<usize, Rc<Locals>>>,
}

impl<'a> UnitModel<'a> {
    pub fn new(unit: &'a SourceUnit, table: &'a SymbolTable) -> Self {
        Self {
            unit,
            table,
            locals: RefCell::new(HashMap::new()),
        }
    }

    fn source(&self) -> &'a str {
        self.unit.text()
    }

    fn type_symbol(&self, decl: &TypeDecl) -> Symbol {
        let containing = decl
            .qualified_name
            .rsplit_once('.')
            .map(|(parent, _)| parent)
            .filter(|parent| self.table.type_by_qualified(parent).is_some())
            .map(|parent| parent.to_string());
        Symbol {
            kind: SymbolKind::Type,
            name: decl.name.clone(),
            qualified_name: decl.qualified_name.clone(),
            containing_type: containing,
            origin: SymbolOrigin::Source,
        }
    }

    fn external_type(&self, normalized: &str) -> Symbol {
        Symbol {
            kind: SymbolKind::Type,
            name: simple_name(normalized).to_string(),
            qualified_name: normalized.to_string(),
            containing_type: None,
            origin: SymbolOrigin::External,
        }
    }

    fn type_from_text(&self, raw: &str) -> Option<Symbol> {
        let normalized = normalize_type_name(raw)?;
        if normalized == "var" || normalized == "dynamic" {
            return None;
        }
        match self.table.lookup_type(&normalized) {
            Some(decl) => Some(self.type_symbol(decl)),
            None => Some(self.external_type(&normalized)),
        }
    }

    fn named_type(&self, node: Node<'_>) -> Option<Symbol> {
        if node.is_error() || node.is_missing() || node.has_error() {
            return None;
        }
        self.type_from_text(node_text(node, self.source()))
    }

    fn attribute_type(&self, attribute: Node<'_>) -> Option<Symbol> {
        let name_node = attribute.child_by_field_name("name")?;
        if name_node.is_missing() || name_node.has_error() {
            return None;
        }
        let normalized = normalize_type_name(node_text(name_node, self.source()))?;
        let suffixed = if simple_name(&normalized).ends_with("Attribute") {
            normalized.clone()
        } else {
            format!("{normalized}Attribute")
        };
        for candidate in [&suffixed, &normalized] {
            if let Some(decl) = self.table.lookup_type(candidate) {
                return Some(self.type_symbol(decl));
            }
        }
        Some(self.external_type(&suffixed))
    }

    fn enclosing_type_name(&self, node: Node<'_>) -> Option<String> {
        qualified_name(enclosing_type(node)?, self.source())
    }

    fn member_symbol(&self, owner: &str, name: &str) -> Option<Symbol> {
        let (decl, member) = self.table.find_member(owner, name)?;
        Some(Symbol {
            kind: member.kind,
            name: name.to_string(),
            qualified_name: format!("{}.{}", decl.qualified_name, name),
            containing_type: Some(decl.qualified_name.clone()),
            origin: SymbolOrigin::Source,
        })
    }

    fn locals_of(&self, member: Node<'_>) -> Rc<Locals> {
        if let Some(found) = self.locals.borrow().get(&member.id()) {
            return Rc::clone(found);
        }
        let locals = Rc::new(collect_locals(member, self.source()));
        self.locals
            .borrow_mut()
            .insert(member.id(), Rc::clone(&locals));
        locals
    }

    /// `Some(declared type)` when `name` is a parameter or local in scope.
    fn local_binding(&self, node: Node<'_>, name: &str) -> Option<Option<String>> {
        let member = enclosing_member(node)?;
        self.locals_of(member).get(name).cloned()
    }

    fn expression_type(&self, expr: Node<'_>) -> Option<Symbol> {
        let source = self.source();
        match expr.kind() {
            "identifier" => self.identifier_type(expr),
            "generic_name" => self.type_from_text(node_text(expr, source)),
            "this" | "this_expression" => {
                let owner = self.enclosing_type_name(expr)?;
                self.table.type_by_qualified(&owner).map(|decl| self.type_symbol(decl))
            }
            "base" | "base_expression" => {
                let owner = self.enclosing_type_name(expr)?;
                let base = self.table.type_by_qualified(&owner)?.bases.first()?.clone();
                self.type_from_text(&base)
            }
            "parenthesized_expression" => {
                let mut cursor = expr.walk();
                let inner = expr.named_children(&mut cursor).next()?;
                self.expression_type(inner)
            }
            "object_creation_expression" | "cast_expression" => {
                self.named_type(expr.child_by_field_name("type")?)
            }
            "qualified_name" | "predefined_type" => self.named_type(expr),
            "member_access_expression" => {
                let receiver = self.expression_type(expr.child_by_field_name("expression")?)?;
                let name = node_text(expr.child_by_field_name("name")?, source).trim();
                self.member_type(&receiver, name)
            }
            "invocation_expression" => {
                let target = self.resolve_call_target(expr)?;
                let owner = target.containing_type.as_deref()?;
                let (_, member) = self.table.find_member(owner, &target.name)?;
                self.type_from_text(member.type_name.as_deref()?)
            }
            _ => None,
        }
    }

    fn member_type(&self, receiver: &Symbol, name: &str) -> Option<Symbol> {
        if !receiver.is_source() {
            return None;
        }
        match self.table.find_member(&receiver.qualified_name, name) {
            Some((_, member)) if member.kind != SymbolKind::Method => {
                self.type_from_text(member.type_name.as_deref()?)
            }
            Some(_) => None,
            // nested type accessed through its container
            None => self
                .table
                .type_by_qualified(&format!("{}.{}", receiver.qualified_name, name))
                .map(|decl| self.type_symbol(decl)),
        }
    }

    fn identifier_type(&self, ident: Node<'_>) -> Option<Symbol> {
        let name = node_text(ident, self.source()).trim();
        if let Some(binding) = self.local_binding(ident, name) {
            return self.type_from_text(binding.as_deref()?);
        }
        if let Some(owner) = self.enclosing_type_name(ident) {
            if let Some((_, member)) = self.table.find_member(&owner, name) {
                if member.kind == SymbolKind::Method {
                    return None;
                }
                return self.type_from_text(member.type_name.as_deref()?);
            }
        }
        if let Some(decl) = self.table.lookup_type(name) {
            return Some(self.type_symbol(decl));
        }
        // unknown capitalised names are taken as static references to
        // external types (Console, Math, ...)
        if name.chars().next().is_some_and(char::is_uppercase) {
            return Some(self.external_type(name));
        }
        None
    }

    fn in_type_position(node: Node<'_>) -> bool {
        let Some(parent) = node.parent() else {
            return false;
        };
        matches!(parent.kind(), "base_list" | "primary_constructor_base_type" | "type_argument_list")
            || parent.child_by_field_name("type") == Some(node)
            || parent.child_by_field_name("returns") == Some(node)
    }
}

impl SemanticModel for UnitModel<'_> {
    fn type_of(&self, node: Node<'_>) -> Option<Symbol> {
        match node.kind() {
            "attribute" => self.attribute_type(node),
            "primary_constructor_base_type" => self.named_type(node.child_by_field_name("type")?),
            kind if is_type_declaration(kind) => self.declared_symbol_of(node),
            _ if Self::in_type_position(node) => self.named_type(node),
            _ => self.expression_type(node),
        }
    }

    fn declared_symbol_of(&self, declaration: Node<'_>) -> Option<Symbol> {
        let source = self.source();
        if is_type_declaration(declaration.kind()) {
            let qualified = qualified_name(declaration, source)?;
            return self
                .table
                .type_by_qualified(&qualified)
                .map(|decl| self.type_symbol(decl));
        }
        let name = name_of(declaration, source)?;
        let owner_node = match declaration.kind() {
            // variable_declarator -> variable_declaration -> field_declaration
            "variable_declarator" => declaration.parent()?.parent()?,
            _ => declaration,
        };
        let kind = match owner_node.kind() {
            "method_declaration" => SymbolKind::Method,
            "property_declaration" => SymbolKind::Property,
            "field_declaration" | "enum_member_declaration" => SymbolKind::Field,
            "event_declaration" | "event_field_declaration" => SymbolKind::Event,
            _ => return None,
        };
        let owner = self.enclosing_type_name(owner_node)?;
        Some(Symbol {
            kind,
            qualified_name: format!("{owner}.{name}"),
            name,
            containing_type: Some(owner),
            origin: SymbolOrigin::Source,
        })
    }

    fn resolve_reference(&self, identifier: Node<'_>) -> Option<Symbol> {
        if identifier.kind() != "identifier" {
            return None;
        }
        let source = self.source();
        let name = node_text(identifier, source).trim();
        let mut anchor = identifier;
        let mut parent = identifier.parent()?;
        if parent.kind() == "generic_name" {
            anchor = parent;
            parent = parent.parent()?;
        }
        if is_declaring_node(parent.kind()) && parent.child_by_field_name("name") == Some(anchor) {
            return None;
        }
        match parent.kind() {
            "member_access_expression" if parent.child_by_field_name("name") == Some(anchor) => {
                let receiver = self.expression_type(parent.child_by_field_name("expression")?)?;
                if !receiver.is_source() {
                    return None;
                }
                self.member_symbol(&receiver.qualified_name, name).or_else(|| {
                    self.table
                        .type_by_qualified(&format!("{}.{}", receiver.qualified_name, name))
                        .map(|decl| self.type_symbol(decl))
                })
            }
            "qualified_name" if parent.child_by_field_name("name") == Some(anchor) => self
                .named_type(parent)
                .filter(Symbol::is_source),
            "attribute" => self.attribute_type(parent).filter(Symbol::is_source),
            _ => {
                if self.local_binding(identifier, name).is_some() {
                    return None;
                }
                if let Some(owner) = self.enclosing_type_name(identifier) {
                    if let Some(symbol) = self.member_symbol(&owner, name) {
                        return Some(symbol);
                    }
                }
                self.table.lookup_type(name).map(|decl| self.type_symbol(decl))
            }
        }
    }

    fn resolve_call_target(&self, invocation: Node<'_>) -> Option<Symbol> {
        if invocation.kind() != "invocation_expression" {
            return None;
        }
        let source = self.source();
        let function = invocation.child_by_field_name("function")?;
        match function.kind() {
            "identifier" | "generic_name" => {
                let name = call_name(function, source)?;
                if self.local_binding(function, &name).is_some() {
                    return None;
                }
                let owner = self.enclosing_type_name(function)?;
                self.member_symbol(&owner, &name)
                    .filter(|symbol| symbol.kind == SymbolKind::Method)
            }
            "member_access_expression" => {
                let name = call_name(function.child_by_field_name("name")?, source)?;
                let receiver = self.expression_type(function.child_by_field_name("expression")?)?;
                if receiver.is_source() {
                    if let Some(symbol) = self.member_symbol(&receiver.qualified_name, &name) {
                        return (symbol.kind == SymbolKind::Method).then_some(symbol);
                    }
                }
                // known receiver type, method declared outside the codebase
                Some(Symbol {
                    kind: SymbolKind::Method,
                    qualified_name: format!("{}.{}", receiver.qualified_name, name),
                    name,
                    containing_type: Some(receiver.qualified_name),
                    origin: SymbolOrigin::External,
                })
            }
            _ => None,
        }
    }

    fn render_text(&self, node: Node<'_>) -> &str {
        node_text(node, self.unit.text())
    }
}

fn call_name(node: Node<'_>, source: &str) -> Option<String> {
    let target = if node.kind() == "generic_name" {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .find(|child| child.kind() == "identifier")?
    } else {
        node
    };
    let text = node_text(target, source).trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn collect_locals(member: Node<'_>, source: &str) -> Locals {
    let mut locals = Locals::new();
    let mut bind = |name: Option<Node<'_>>, type_name: Option<String>| {
        let Some(name) = name else {
            return;
        };
        let text = node_text(name, source).trim();
        if !text.is_empty() {
            locals.entry(text.to_string()).or_insert(type_name);
        }
    };
    let type_text = |node: Node<'_>| {
        node.child_by_field_name("type")
            .and_then(|t| normalize_type_name(node_text(t, source)))
    };
    for node in descendants(member) {
        match node.kind() {
            "parameter" | "catch_declaration" | "declaration_expression" => {
                bind(node.child_by_field_name("name"), type_text(node));
            }
            "implicit_parameter" => bind(Some(node), None),
            "foreach_statement" => bind(node.child_by_field_name("left"), type_text(node)),
            "local_function_statement" => bind(node.child_by_field_name("name"), None),
            "lambda_expression" => {
                if let Some(params) = node.child_by_field_name("parameters") {
                    if params.kind() == "identifier" {
                        bind(Some(params), None);
                    }
                }
            }
            "variable_declaration" => {
                let declared = type_text(node).filter(|name| name != "var");
                let mut cursor = node.walk();
                for declarator in node.named_children(&mut cursor) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    let inferred = declared
                        .clone()
                        .or_else(|| initializer_type(declarator, source));
                    bind(declarator.child_by_field_name("name"), inferred);
                }
            }
            _ => {}
        }
    }
    locals
}

/// `new T(..)` initializer of a `var` declarator.
fn initializer_type(declarator: Node<'_>, source: &str) -> Option<String> {
    let name = declarator.child_by_field_name("name");
    let mut cursor = declarator.walk();
    let mut value = declarator
        .named_children(&mut cursor)
        .filter(|child| Some(*child) != name)
        .last()?;
    if value.kind() == "equals_value_clause" {
        let mut inner = value.walk();
        value = value.named_children(&mut inner).next()?;
    }
    if value.kind() != "object_creation_expression" {
        return None;
    }
    normalize_type_name(node_text(value.child_by_field_name("type")?, source))
}
