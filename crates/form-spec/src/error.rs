use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validate::ValidationErrors;

/// The tables a write or lookup can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Form,
    Field,
    Response,
    Answer,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Form => "form",
            EntityKind::Field => "field",
            EntityKind::Response => "response",
            EntityKind::Answer => "answer",
        };
        f.write_str(label)
    }
}

/// Outcome of a rejected read or write. Nothing is persisted when one is returned.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{kind} {id} referenced by the write does not exist")]
    Reference { kind: EntityKind, id: u64 },
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: u64 },
}

impl FormError {
    pub fn reference(kind: EntityKind, id: impl Into<u64>) -> Self {
        FormError::Reference {
            kind,
            id: id.into(),
        }
    }

    pub fn not_found(kind: EntityKind, id: impl Into<u64>) -> Self {
        FormError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            FormError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for FormError {
    fn from(errors: ValidationErrors) -> Self {
        FormError::Validation(errors)
    }
}
