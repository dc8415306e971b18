use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::options::OptionPair;
use crate::spec::{AnswerId, Field, FieldId, FieldType, Form, FormId, Response};

/// A form listing row with derived counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSummary {
    pub id: FormId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub field_count: usize,
    pub response_count: usize,
    pub created_at: DateTime<Utc>,
}

/// A form with its fields in the requested order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormDetail {
    pub form: Form,
    pub fields: Vec<Field>,
}

/// An answer joined to the field it responds to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerDetail {
    pub answer_id: AnswerId,
    pub field_id: FieldId,
    pub label: String,
    pub field_type: FieldType,
    pub position: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionPair>,
    pub value: String,
}

/// A response with answers listed in field order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDetail {
    pub response: Response,
    pub form_title: String,
    pub answers: Vec<AnswerDetail>,
}
