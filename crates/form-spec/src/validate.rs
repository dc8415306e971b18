use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::spec::field::{Field, FieldConfig, FieldType, FieldWriteSpec};

/// Decimal numbers with an optional sign, fraction, and exponent.
static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d+)?|\.\d+)(?:[eE][+-]?\d+)?$")
        .expect("numeric pattern is a valid regex")
});

/// A single failed check, attributed to the entity and attribute that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Entity location such as `form`, `fields[2]`, or `answers[0]`.
    pub path: String,
    pub attribute: String,
    pub message: String,
    pub code: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {}", self.path, self.attribute, self.message)
    }
}

/// Every failure found while checking one write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: &str, attribute: &str, message: &str, code: &str) {
        self.0.push(ValidationError {
            path: path.to_string(),
            attribute: attribute.to_string(),
            message: message.to_string(),
            code: code.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// First error recorded for `attribute` of the entity at `path`.
    pub fn on(&self, path: &str, attribute: &str) -> Option<&ValidationError> {
        self.0
            .iter()
            .find(|error| error.path == path && error.attribute == attribute)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&rendered)
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Checks applied to answers on top of the per-type rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponsePolicy {
    /// Reject select answers that match none of the field's option values.
    #[serde(default)]
    pub strict_select: bool,
}

/// Field attributes that passed validation and are ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDraft {
    pub label: String,
    pub position: u32,
    pub config: FieldConfig,
}

pub fn validate_title(title: &str, errors: &mut ValidationErrors) {
    if title.trim().is_empty() {
        errors.add("form", "title", "can't be blank", "blank");
    }
}

/// Validate a create or update spec, normalizing select options on the way.
///
/// `existing` is the stored field an update targets; a select field that is
/// updated without options keeps the options it already has.
pub fn validate_field_spec(
    spec: &FieldWriteSpec,
    existing: Option<&Field>,
    path: &str,
    errors: &mut ValidationErrors,
) -> Option<FieldDraft> {
    let before = errors.len();

    if spec.label.trim().is_empty() {
        errors.add(path, "label", "can't be blank", "blank");
    }

    let position = match spec.position {
        None => {
            errors.add(path, "position", "can't be blank", "blank");
            None
        }
        Some(raw) if raw < 0 => {
            errors.add(
                path,
                "position",
                "must be greater than or equal to 0",
                "invalid_position",
            );
            None
        }
        Some(raw) => match u32::try_from(raw) {
            Ok(position) => Some(position),
            Err(_) => {
                errors.add(path, "position", "is too large", "invalid_position");
                None
            }
        },
    };

    let config = match spec.field_type {
        None => {
            let allowed = FieldType::ALL
                .iter()
                .map(FieldType::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            errors.add(
                path,
                "field_type",
                &format!("must be one of {allowed}"),
                "blank",
            );
            None
        }
        Some(FieldType::Select) => {
            let options = match &spec.options {
                Some(input) => input.normalize(),
                None => existing
                    .map(|field| field.options().to_vec())
                    .unwrap_or_default(),
            };
            if options.is_empty() {
                errors.add(
                    path,
                    "options",
                    "must be present for select fields",
                    "options_missing",
                );
                None
            } else {
                debug!(path, count = options.len(), "normalized select options");
                Some(FieldConfig::Select(options))
            }
        }
        Some(FieldType::Input) => Some(FieldConfig::Input),
        Some(FieldType::Number) => Some(FieldConfig::Number),
    };
    if spec.options.is_some()
        && let Some(kind) = spec.field_type
        && kind != FieldType::Select
    {
        debug!(path, field_type = %kind, "dropping options on non-select field");
    }

    if errors.len() > before {
        return None;
    }

    Some(FieldDraft {
        label: spec.label.clone(),
        position: position?,
        config: config?,
    })
}

/// Validate one submitted value against the type of the field it answers.
pub fn validate_answer(
    field: &Field,
    value: &str,
    policy: &ResponsePolicy,
    path: &str,
    errors: &mut ValidationErrors,
) {
    if value.trim().is_empty() {
        errors.add(path, "value", "can't be blank", "blank");
        return;
    }

    match &field.config {
        FieldConfig::Number if !is_numeric(value) => {
            errors.add(path, "value", "must be a number", "not_a_number");
        }
        FieldConfig::Select(options)
            if policy.strict_select
                && !options.iter().any(|option| option.effective_value() == value) =>
        {
            errors.add(
                path,
                "value",
                "is not one of the field's options",
                "not_an_option",
            );
        }
        _ => {}
    }
}

/// Whether `value` reads as a base-10 number, ignoring surrounding whitespace.
pub fn is_numeric(value: &str) -> bool {
    NUMERIC.is_match(value.trim())
}
