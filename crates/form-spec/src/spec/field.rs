use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::options::{OptionPair, OptionsInput};
use crate::spec::{FieldId, FormId};

/// Closed set of field types a form can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text.
    Input,
    /// Free text that must parse as a number.
    Number,
    /// One value out of an option list.
    Select,
}

impl FieldType {
    pub const ALL: [FieldType; 3] = [FieldType::Input, FieldType::Number, FieldType::Select];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Input => "input",
            FieldType::Number => "number",
            FieldType::Select => "select",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific configuration of a field. Only select fields carry options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldConfig {
    Input,
    Number,
    Select(Vec<OptionPair>),
}

impl FieldConfig {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldConfig::Input => FieldType::Input,
            FieldConfig::Number => FieldType::Number,
            FieldConfig::Select(_) => FieldType::Select,
        }
    }

    pub fn options(&self) -> &[OptionPair] {
        match self {
            FieldConfig::Select(options) => options,
            FieldConfig::Input | FieldConfig::Number => &[],
        }
    }
}

/// A persisted question belonging to a form.
///
/// Stored as a flat row with `field_type` and `options` columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FieldRow", into = "FieldRow")]
pub struct Field {
    pub id: FieldId,
    pub form_id: FormId,
    pub label: String,
    pub position: u32,
    pub config: FieldConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Field {
    pub fn field_type(&self) -> FieldType {
        self.config.field_type()
    }

    pub fn options(&self) -> &[OptionPair] {
        self.config.options()
    }
}

#[derive(Serialize, Deserialize)]
struct FieldRow {
    id: FieldId,
    form_id: FormId,
    field_type: FieldType,
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<OptionPair>>,
    position: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FieldRow> for Field {
    type Error = String;

    fn try_from(row: FieldRow) -> Result<Self, Self::Error> {
        let config = match row.field_type {
            FieldType::Input => FieldConfig::Input,
            FieldType::Number => FieldConfig::Number,
            FieldType::Select => match row.options {
                Some(options) if !options.is_empty() => FieldConfig::Select(options),
                _ => return Err(format!("select field {} has no options", row.id)),
            },
        };
        Ok(Field {
            id: row.id,
            form_id: row.form_id,
            label: row.label,
            position: row.position,
            config,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<Field> for FieldRow {
    fn from(field: Field) -> Self {
        let field_type = field.field_type();
        let options = match field.config {
            FieldConfig::Select(options) => Some(options),
            FieldConfig::Input | FieldConfig::Number => None,
        };
        FieldRow {
            id: field.id,
            form_id: field.form_id,
            field_type,
            label: field.label,
            options,
            position: field.position,
            created_at: field.created_at,
            updated_at: field.updated_at,
        }
    }
}

/// One entry of a form write: create (no id), update (id), or delete (id + `delete`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldWriteSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FieldId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionsInput>,
    #[serde(default, alias = "_destroy")]
    pub delete: bool,
}

impl FieldWriteSpec {
    /// Spec that creates a new field.
    pub fn create(field_type: FieldType, label: impl Into<String>, position: i64) -> Self {
        Self {
            id: None,
            field_type: Some(field_type),
            label: label.into(),
            position: Some(position),
            options: None,
            delete: false,
        }
    }

    /// Spec that replaces the attributes of an existing field.
    pub fn update(
        id: FieldId,
        field_type: FieldType,
        label: impl Into<String>,
        position: i64,
    ) -> Self {
        Self {
            id: Some(id),
            ..Self::create(field_type, label, position)
        }
    }

    /// Spec that removes an existing field together with its answers.
    pub fn remove(id: FieldId) -> Self {
        Self {
            id: Some(id),
            field_type: None,
            label: String::new(),
            position: None,
            options: None,
            delete: true,
        }
    }

    pub fn with_options(mut self, options: OptionsInput) -> Self {
        self.options = Some(options);
        self
    }
}
