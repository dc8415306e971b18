use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::{AnswerId, FieldId, FormId, ResponseId};

/// A submission against a form. Never updated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: ResponseId,
    pub form_id: FormId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The value given for one field within one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub response_id: ResponseId,
    pub field_id: FieldId,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create a response and all of its answers in one write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseWriteRequest {
    pub form_id: FormId,
    #[serde(default)]
    pub answers: Vec<AnswerWriteSpec>,
}

impl ResponseWriteRequest {
    pub fn new(form_id: FormId) -> Self {
        Self {
            form_id,
            answers: Vec::new(),
        }
    }

    pub fn with_answer(mut self, field_id: FieldId, value: impl Into<String>) -> Self {
        self.answers.push(AnswerWriteSpec {
            field_id,
            value: value.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerWriteSpec {
    pub field_id: FieldId,
    #[serde(default)]
    pub value: String,
}
