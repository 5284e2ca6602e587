use crate::error::{ErrorKind, PatchError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Record,
    Enum,
}

impl TypeKind {
    pub fn from_node_kind(kind: &str) -> Option<Self> {
        match kind {
            "class_declaration" => Some(Self::Class),
            "struct_declaration" => Some(Self::Struct),
            "interface_declaration" => Some(Self::Interface),
            "record_declaration" | "record_struct_declaration" => Some(Self::Record),
            "enum_declaration" => Some(Self::Enum),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Interface => "interface",
            Self::Record => "record",
            Self::Enum => "enum",
        }
    }

    /// Heading used by the text report.
    pub fn label(self) -> &'static str {
        match self {
            Self::Class => "Class",
            Self::Struct => "Struct",
            Self::Interface => "Interface",
            Self::Record => "Record",
            Self::Enum => "Enum",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceSpan {
    pub start_line: usize,
    pub end_line: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodEntity {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub span: SourceSpan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
}

/// One declared type. Created once per declaration; partial declarations of
/// the same type produce one entity each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeEntity {
    pub id: String,
    pub name: String,
    pub qualified_name: String,
    pub kind: TypeKind,
    pub project: String,
    pub file: String,
    pub span: SourceSpan,
    pub bases: Vec<String>,
    pub methods: Vec<MethodEntity>,
    pub fields: Vec<String>,
    pub properties: Vec<String>,
    pub events: Vec<String>,
    pub attributes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    /// Qualified names of other declared types referenced from this one.
    pub dependencies: Vec<String>,
}

impl TypeEntity {
    /// Method, field, property and event names, in that order.
    pub fn member_names(&self) -> Vec<&str> {
        self.methods
            .iter()
            .map(|m| m.name.as_str())
            .chain(self.fields.iter().map(String::as_str))
            .chain(self.properties.iter().map(String::as_str))
            .chain(self.events.iter().map(String::as_str))
            .collect()
    }
}

/// Something the front end could not resolve while extracting a type, such
/// as an attribute whose type is unknown. Extraction carries on regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inconsistency {
    pub project: String,
    pub file: String,
    pub type_name: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport<'a> {
    pub name: &'a str,
    pub types: Vec<&'a TypeEntity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexReport<'a> {
    pub projects: Vec<ProjectReport<'a>>,
    pub method_dependencies: Vec<MethodDependencies<'a>>,
    #[serde(skip_serializing_if = "<[Inconsistency]>::is_empty")]
    pub inconsistencies: &'a [Inconsistency],
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodDependencies<'a> {
    pub method: &'a str,
    pub calls: Vec<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Range,
    Method,
    Class,
}

impl ChangeKind {
    /// `single` and `multi` are older names for a line-range edit.
    pub fn parse(raw: &str) -> Result<Self, PatchError> {
        let value = raw.trim();
        match value {
            "" => Err(PatchError::invalid_request("change type is blank")),
            "range" | "single" | "multi" => Ok(Self::Range),
            "method" => Ok(Self::Method),
            "class" => Ok(Self::Class),
            other => Err(PatchError::UnsupportedChangeKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditRequest {
    pub file_name: String,
    pub change_type: String,
    pub start_line: i64,
    pub end_line: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_code: Option<String>,
    /// Declaration id taken from the index, used to pick the right
    /// declaration when several share the same text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
}

impl EditRequest {
    pub fn range(file_name: &str, start_line: i64, end_line: i64, new_code: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            change_type: "range".to_string(),
            start_line,
            end_line,
            new_code: Some(new_code.to_string()),
            ..Default::default()
        }
    }

    pub fn method(file_name: &str, original_code: &str, new_code: &str) -> Self {
        Self::declaration("method", file_name, original_code, new_code)
    }

    pub fn class(file_name: &str, original_code: &str, new_code: &str) -> Self {
        Self::declaration("class", file_name, original_code, new_code)
    }

    pub fn with_target(mut self, target_id: &str) -> Self {
        self.target_id = Some(target_id.to_string());
        self
    }

    fn declaration(kind: &str, file_name: &str, original_code: &str, new_code: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            change_type: kind.to_string(),
            original_code: Some(original_code.to_string()),
            new_code: Some(new_code.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChangeStatus {
    Applied { bytes_written: usize },
    Failed { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeOutcome {
    pub index: usize,
    pub file: String,
    pub change_type: String,
    #[serde(flatten)]
    pub status: ChangeStatus,
}

impl ChangeOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self.status, ChangeStatus::Applied { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.status {
            ChangeStatus::Failed { kind, .. } => Some(*kind),
            ChangeStatus::Applied { .. } => None,
        }
    }
}
