use schemars::schema_for;
use serde_json::Value;

use crate::spec::{FormWriteRequest, ResponseWriteRequest};

/// JSON Schema for form write documents.
pub fn form_request_schema() -> Value {
    schema_for!(FormWriteRequest).to_value()
}

/// JSON Schema for response write documents.
pub fn response_request_schema() -> Value {
    schema_for!(ResponseWriteRequest).to_value()
}
