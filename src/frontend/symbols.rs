use crate::frontend::SymbolKind;
use crate::frontend::syntax::{
    SourceUnit, body_members, name_of, node_text, normalize_type_name, qualified_name,
    simple_name, type_declarations, variable_declarator_names,
};
use std::collections::{HashMap, HashSet};
use tree_sitter::Node;

#[derive(Debug, Clone)]
pub struct MemberDecl {
    pub kind: SymbolKind,
    /// Declared type of a field, property or event; return type of a method.
    pub type_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub qualified_name: String,
    /// Base types as written, normalized.
    pub bases: Vec<String>,
    pub members: HashMap<String, MemberDecl>,
}

/// Every type declared across the codebase, with member shapes. Built once
/// before extraction and only read afterwards.
#[derive(Debug, Default)]
pub struct SymbolTable {
    types: Vec<TypeDecl>,
    by_qualified: HashMap<String, usize>,
    by_name: HashMap<String, Vec<usize>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_units<'a>(units: impl IntoIterator<Item = &'a SourceUnit>) -> Self {
        let mut table = Self::new();
        for unit in units {
            table.add_unit(unit);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn add_unit(&mut self, unit: &SourceUnit) {
        let source = unit.text();
        for node in type_declarations(unit.root()) {
            let Some(qualified) = qualified_name(node, source) else {
                continue;
            };
            let name = simple_name(&qualified).to_string();
            let bases = declared_bases(node, source);
            let members = declared_members(node, source);
            // partial declarations merge into the first one
            if let Some(&idx) = self.by_qualified.get(&qualified) {
                let existing = &mut self.types[idx];
                for base in bases {
                    if !existing.bases.contains(&base) {
                        existing.bases.push(base);
                    }
                }
                for (member, decl) in members {
                    existing.members.entry(member).or_insert(decl);
                }
                continue;
            }
            // first overload wins
            let members = members.into_iter().fold(HashMap::new(), |mut map, (member, decl)| {
                map.entry(member).or_insert(decl);
                map
            });
            let idx = self.types.len();
            self.by_qualified.insert(qualified.clone(), idx);
            self.by_name.entry(name.clone()).or_default().push(idx);
            self.types.push(TypeDecl {
                name,
                qualified_name: qualified,
                bases,
                members,
            });
        }
    }

    pub fn type_by_qualified(&self, qualified: &str) -> Option<&TypeDecl> {
        self.by_qualified.get(qualified).map(|&idx| &self.types[idx])
    }

    /// Resolve a written (normalized) type name: exact qualified match first,
    /// then a qualified suffix, then the first type with that simple name.
    pub fn lookup_type(&self, written: &str) -> Option<&TypeDecl> {
        if let Some(found) = self.type_by_qualified(written) {
            return Some(found);
        }
        let simple = simple_name(written);
        let candidates = self.by_name.get(simple)?;
        if written.contains('.') {
            let suffix = format!(".{written}");
            return candidates
                .iter()
                .map(|&idx| &self.types[idx])
                .find(|decl| decl.qualified_name.ends_with(&suffix));
        }
        candidates.first().map(|&idx| &self.types[idx])
    }

    /// Finds `member` on the type or, failing that, along its declared base
    /// types. Returns the declaring type too.
    pub fn find_member(&self, qualified: &str, member: &str) -> Option<(&TypeDecl, &MemberDecl)> {
        let mut seen = HashSet::new();
        let mut pending = vec![self.type_by_qualified(qualified)?];
        while let Some(decl) = pending.pop() {
            if !seen.insert(decl.qualified_name.as_str()) {
                continue;
            }
            if let Some(found) = decl.members.get(member) {
                return Some((decl, found));
            }
            for base in decl.bases.iter().rev() {
                if let Some(base_decl) = self.lookup_type(base) {
                    pending.push(base_decl);
                }
            }
        }
        None
    }
}

fn declared_bases(node: Node<'_>, source: &str) -> Vec<String> {
    let mut bases = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "base_list" {
            continue;
        }
        let mut list_cursor = child.walk();
        for base in child.named_children(&mut list_cursor) {
            let type_node = match base.kind() {
                "argument_list" => continue,
                "primary_constructor_base_type" => base.child_by_field_name("type").unwrap_or(base),
                _ => base,
            };
            if let Some(name) = normalize_type_name(node_text(type_node, source)) {
                bases.push(name);
            }
        }
    }
    bases
}

fn declared_members(node: Node<'_>, source: &str) -> Vec<(String, MemberDecl)> {
    let mut members = Vec::new();
    let own_type = name_of(node, source);
    for member in body_members(node) {
        let type_of = |field: &str| {
            member
                .child_by_field_name(field)
                .and_then(|n| normalize_type_name(node_text(n, source)))
        };
        match member.kind() {
            "method_declaration" => {
                if let Some(name) = name_of(member, source) {
                    let type_name = type_of("returns");
                    members.push((name, MemberDecl { kind: SymbolKind::Method, type_name }));
                }
            }
            "property_declaration" | "event_declaration" => {
                let kind = if member.kind() == "event_declaration" {
                    SymbolKind::Event
                } else {
                    SymbolKind::Property
                };
                if let Some(name) = name_of(member, source) {
                    members.push((name, MemberDecl { kind, type_name: type_of("type") }));
                }
            }
            "field_declaration" | "event_field_declaration" => {
                let kind = if member.kind() == "event_field_declaration" {
                    SymbolKind::Event
                } else {
                    SymbolKind::Field
                };
                let type_name = variable_declaration_type(member, source);
                for name in variable_declarator_names(member, source) {
                    members.push((
                        name,
                        MemberDecl {
                            kind,
                            type_name: type_name.clone(),
                        },
                    ));
                }
            }
            "enum_member_declaration" => {
                if let Some(name) = name_of(member, source) {
                    members.push((
                        name,
                        MemberDecl {
                            kind: SymbolKind::Field,
                            type_name: own_type.clone(),
                        },
                    ));
                }
            }
            _ => {}
        }
    }
    members
}

fn variable_declaration_type(member: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = member.walk();
    let declaration = member
        .named_children(&mut cursor)
        .find(|child| child.kind() == "variable_declaration")?;
    let type_node = declaration.child_by_field_name("type")?;
    normalize_type_name(node_text(type_node, source))
}
