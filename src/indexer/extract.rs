use crate::frontend::syntax::{
    body_members, method_signature, name_of, qualified_name, span, type_declarations,
    variable_declarator_names,
};
use crate::frontend::{SemanticModel, SourceUnit};
use crate::indexer::stable_id::declaration_id;
use crate::model::{Inconsistency, MethodEntity, TypeEntity, TypeKind};
use tracing::warn;
use tree_sitter::Node;

/// Entities and problems found in one source unit.
#[derive(Debug, Default)]
pub struct UnitFacts {
    pub types: Vec<TypeEntity>,
    pub inconsistencies: Vec<Inconsistency>,
}

/// Turns type declarations into [`TypeEntity`] values for one project.
pub struct EntityExtractor<'q> {
    project: &'q str,
    interest: &'q str,
}

impl<'q> EntityExtractor<'q> {
    pub fn new(project: &'q str, interest: &'q str) -> Self {
        Self { project, interest }
    }

    /// Full text is kept only for names that occur in the interest query.
    pub fn is_of_interest(&self, name: &str) -> bool {
        !name.is_empty() && self.interest.contains(name)
    }

    pub fn extract(&self, unit: &SourceUnit, model: &impl SemanticModel) -> UnitFacts {
        let mut facts = UnitFacts::default();
        let source = unit.text();
        for node in type_declarations(unit.root()) {
            let Some(kind) = TypeKind::from_node_kind(node.kind()) else {
                continue;
            };
            let (Some(name), Some(qualified), Some(id)) = (
                name_of(node, source),
                qualified_name(node, source),
                declaration_id(node, source),
            ) else {
                continue;
            };
            let mut entity = TypeEntity {
                id,
                name,
                qualified_name: qualified,
                kind,
                project: self.project.to_string(),
                file: unit.rel_path().to_string(),
                span: span(node),
                bases: self.bases(node, model),
                methods: Vec::new(),
                fields: Vec::new(),
                properties: Vec::new(),
                events: Vec::new(),
                attributes: Vec::new(),
                full_text: None,
                dependencies: Vec::new(),
            };
            self.members(node, source, model, &mut entity);
            entity.attributes = self.attributes(node, unit, model, &entity, &mut facts);
            if self.is_of_interest(&entity.name) {
                entity.full_text = Some(model.render_text(node).to_string());
            }
            facts.types.push(entity);
        }
        facts
    }

    /// Base types and interfaces that resolve; the rest are dropped.
    fn bases(&self, node: Node<'_>, model: &impl SemanticModel) -> Vec<String> {
        let mut bases = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "base_list" {
                continue;
            }
            let mut list_cursor = child.walk();
            for base in child.named_children(&mut list_cursor) {
                if base.kind() == "argument_list" {
                    continue;
                }
                if let Some(symbol) = model.type_of(base) {
                    bases.push(symbol.name);
                }
            }
        }
        bases
    }

    fn members(
        &self,
        node: Node<'_>,
        source: &str,
        model: &impl SemanticModel,
        entity: &mut TypeEntity,
    ) {
        for member in body_members(node) {
            match member.kind() {
                "method_declaration" => {
                    let (Some(name), Some(id)) =
                        (name_of(member, source), declaration_id(member, source))
                    else {
                        continue;
                    };
                    let full_text = self
                        .is_of_interest(&name)
                        .then(|| model.render_text(member).to_string());
                    entity.methods.push(MethodEntity {
                        id,
                        name,
                        signature: method_signature(member, source),
                        span: span(member),
                        full_text,
                    });
                }
                "field_declaration" => {
                    entity.fields.extend(variable_declarator_names(member, source));
                }
                "enum_member_declaration" => entity.fields.extend(name_of(member, source)),
                "property_declaration" => entity.properties.extend(name_of(member, source)),
                "event_field_declaration" => {
                    entity.events.extend(variable_declarator_names(member, source));
                }
                "event_declaration" => entity.events.extend(name_of(member, source)),
                _ => {}
            }
        }
    }

    fn attributes(
        &self,
        node: Node<'_>,
        unit: &SourceUnit,
        model: &impl SemanticModel,
        entity: &TypeEntity,
        facts: &mut UnitFacts,
    ) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = node.walk();
        for list in node.named_children(&mut cursor) {
            if list.kind() != "attribute_list" {
                continue;
            }
            let mut list_cursor = list.walk();
            for attribute in list.named_children(&mut list_cursor) {
                if attribute.kind() != "attribute" {
                    continue;
                }
                match model.type_of(attribute) {
                    Some(symbol) => names.push(symbol.name),
                    None => {
                        let written = model.render_text(attribute).trim().to_string();
                        warn!(
                            file = unit.rel_path(),
                            type_name = %entity.qualified_name,
                            attribute = %written,
                            "unresolved attribute"
                        );
                        facts.inconsistencies.push(Inconsistency {
                            project: self.project.to_string(),
                            file: unit.rel_path().to_string(),
                            type_name: entity.qualified_name.clone(),
                            detail: format!("attribute '{written}' could not be resolved"),
                        });
                    }
                }
            }
        }
        names
    }
}
