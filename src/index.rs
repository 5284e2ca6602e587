//! The codebase index: every extracted type, keyed by declaration id, plus a
//! name index that serves lookups by simple name.

use crate::model::{
    IndexReport, Inconsistency, MethodDependencies, MethodEntity, ProjectReport, TypeEntity,
};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::fmt;

/// Everything one project task produced. Partitions never share types, so
/// merging them needs no coordination.
#[derive(Debug, Default)]
pub struct ProjectPartition {
    pub project: String,
    pub types: Vec<TypeEntity>,
    pub method_dependencies: IndexMap<String, IndexSet<String>>,
    pub inconsistencies: Vec<Inconsistency>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CodebaseIndex {
    /// Project name -> positions in `types`, in first-seen order.
    projects: IndexMap<String, Vec<usize>>,
    types: Vec<TypeEntity>,
    /// First declaration wins for a name.
    by_name: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
    method_dependencies: IndexMap<String, IndexSet<String>>,
    inconsistencies: Vec<Inconsistency>,
}

impl CodebaseIndex {
    /// Merges partitions in the given order. Projects without any type are
    /// left out, as are duplicate declaration ids after their first
    /// occurrence in the id index.
    pub fn merge(partitions: impl IntoIterator<Item = ProjectPartition>) -> Self {
        let mut index = Self::default();
        for partition in partitions {
            if !partition.types.is_empty() {
                let slots = index.projects.entry(partition.project).or_default();
                for entity in partition.types {
                    let idx = index.types.len();
                    index.by_name.entry(entity.name.clone()).or_insert(idx);
                    index.by_id.entry(entity.id.clone()).or_insert(idx);
                    slots.push(idx);
                    index.types.push(entity);
                }
            }
            for (method, calls) in partition.method_dependencies {
                index
                    .method_dependencies
                    .entry(method)
                    .or_default()
                    .extend(calls);
            }
            index.inconsistencies.extend(partition.inconsistencies);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn project_names(&self) -> Vec<&str> {
        self.projects.keys().map(String::as_str).collect()
    }

    pub fn type_names(&self, project: &str) -> Vec<&str> {
        self.project_types(project)
            .map(|entity| entity.name.as_str())
            .collect()
    }

    pub fn project_types<'a>(&'a self, project: &str) -> impl Iterator<Item = &'a TypeEntity> {
        self.projects
            .get(project)
            .into_iter()
            .flatten()
            .map(|&idx| &self.types[idx])
    }

    pub fn types(&self) -> &[TypeEntity] {
        &self.types
    }

    pub fn type_entity(&self, name: &str) -> Option<&TypeEntity> {
        self.by_name.get(name).map(|&idx| &self.types[idx])
    }

    /// Every declaration with this simple name, partial ones and namesakes
    /// in other namespaces included.
    pub fn types_named(&self, name: &str) -> Vec<&TypeEntity> {
        self.types.iter().filter(|entity| entity.name == name).collect()
    }

    pub fn type_by_id(&self, id: &str) -> Option<&TypeEntity> {
        self.by_id.get(id).map(|&idx| &self.types[idx])
    }

    pub fn method_by_id(&self, id: &str) -> Option<(&TypeEntity, &MethodEntity)> {
        self.types.iter().find_map(|entity| {
            entity
                .methods
                .iter()
                .find(|method| method.id == id)
                .map(|method| (entity, method))
        })
    }

    pub fn methods(&self, type_name: &str) -> Vec<&str> {
        self.type_entity(type_name)
            .map(|entity| entity.methods.iter().map(|m| m.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn members(&self, type_name: &str) -> Vec<&str> {
        self.type_entity(type_name)
            .map(TypeEntity::member_names)
            .unwrap_or_default()
    }

    pub fn properties(&self, type_name: &str) -> &[String] {
        self.type_entity(type_name)
            .map(|entity| entity.properties.as_slice())
            .unwrap_or_default()
    }

    pub fn fields(&self, type_name: &str) -> &[String] {
        self.type_entity(type_name)
            .map(|entity| entity.fields.as_slice())
            .unwrap_or_default()
    }

    pub fn events(&self, type_name: &str) -> &[String] {
        self.type_entity(type_name)
            .map(|entity| entity.events.as_slice())
            .unwrap_or_default()
    }

    pub fn attributes(&self, type_name: &str) -> &[String] {
        self.type_entity(type_name)
            .map(|entity| entity.attributes.as_slice())
            .unwrap_or_default()
    }

    pub fn bases(&self, type_name: &str) -> &[String] {
        self.type_entity(type_name)
            .map(|entity| entity.bases.as_slice())
            .unwrap_or_default()
    }

    pub fn type_full_text(&self, type_name: &str) -> Option<&str> {
        self.type_entity(type_name)?.full_text.as_deref()
    }

    /// Captured text of the first method with this name.
    pub fn method_full_text(&self, method_name: &str) -> Option<&str> {
        self.types
            .iter()
            .flat_map(|entity| entity.methods.iter())
            .filter(|method| method.name == method_name)
            .find_map(|method| method.full_text.as_deref())
    }

    pub fn type_dependencies(&self, type_name: &str) -> &[String] {
        self.type_entity(type_name)
            .map(|entity| entity.dependencies.as_slice())
            .unwrap_or_default()
    }

    pub fn method_dependencies(&self, method_name: &str) -> Vec<&str> {
        self.method_dependencies
            .get(method_name)
            .map(|calls| calls.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn inconsistencies(&self) -> &[Inconsistency] {
        &self.inconsistencies
    }

    pub fn to_report(&self) -> IndexReport<'_> {
        let projects = self
            .projects
            .keys()
            .map(|name| ProjectReport {
                name,
                types: self.project_types(name).collect(),
            })
            .collect();
        let method_dependencies = self
            .method_dependencies
            .iter()
            .filter(|(_, calls)| !calls.is_empty())
            .map(|(method, calls)| MethodDependencies {
                method,
                calls: calls.iter().map(String::as_str).collect(),
            })
            .collect();
        IndexReport {
            projects,
            method_dependencies,
            inconsistencies: &self.inconsistencies,
        }
    }

    /// The plain-text report consumed by downstream tools.
    pub fn render(&self) -> String {
        self.to_string()
    }

    fn render_type(&self, f: &mut fmt::Formatter<'_>, entity: &TypeEntity) -> fmt::Result {
        if let Some(text) = &entity.full_text {
            return writeln!(f, "{text}");
        }
        writeln!(f, "  {}: {}", entity.kind.label(), entity.name)?;
        if !entity.bases.is_empty() {
            writeln!(f, "    Inherits/Implements: {}", entity.bases.join(", "))?;
        }
        render_section(f, "Properties", &entity.properties)?;
        render_section(f, "Fields", &entity.fields)?;
        render_section(f, "Events", &entity.events)?;
        render_section(f, "Attributes", &entity.attributes)?;
        render_section(f, "Class Dependencies", &entity.dependencies)?;
        if !entity.methods.is_empty() {
            writeln!(f, "    Methods: ")?;
            for method in &entity.methods {
                if let Some(text) = &method.full_text {
                    writeln!(f, "{text}")?;
                    continue;
                }
                writeln!(f, "    - {}", method.name)?;
                let calls = self.method_dependencies(&method.name);
                if !calls.is_empty() {
                    writeln!(f, "      Method Dependencies:")?;
                    for call in calls {
                        writeln!(f, "        - {call}")?;
                    }
                }
            }
        }
        writeln!(f)
    }
}

fn render_section(f: &mut fmt::Formatter<'_>, title: &str, items: &[String]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(f, "    {title}:")?;
    for item in items {
        writeln!(f, "      - {item}")?;
    }
    Ok(())
}

impl fmt::Display for CodebaseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (project, slots) in &self.projects {
            writeln!(f, "Project: {project}")?;
            for &idx in slots {
                self.render_type(f, &self.types[idx])?;
            }
        }
        Ok(())
    }
}
