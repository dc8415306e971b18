#![allow(missing_docs)]

pub mod error;
pub mod options;
pub mod persist;
pub mod render;
pub mod schema;
pub mod spec;
pub mod store;
pub mod validate;
pub mod view;

pub use error::{EntityKind, FormError};
pub use options::{OptionPair, OptionsInput, options_for_select, parse_options};
pub use persist::PersistError;
pub use render::{
    render_form_json, render_form_text, render_forms_text, render_response_text,
    render_responses_text,
};
pub use schema::{form_request_schema, response_request_schema};
pub use spec::{
    Answer, AnswerId, AnswerWriteSpec, Field, FieldConfig, FieldId, FieldType, FieldWriteSpec,
    Form, FormId, FormWriteRequest, Response, ResponseId, ResponseWriteRequest,
};
pub use store::{FieldOrder, FormStore, ResponseOrder, TableCounts};
pub use validate::{ResponsePolicy, ValidationError, ValidationErrors, is_numeric};
pub use view::{AnswerDetail, FormDetail, FormSummary, ResponseDetail};
