pub mod field;
pub mod form;
pub mod response;

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use field::{Field, FieldConfig, FieldType, FieldWriteSpec};
pub use form::{Form, FormWriteRequest};
pub use response::{Answer, AnswerWriteSpec, Response, ResponseWriteRequest};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

row_id!(
    /// Identifier of a row in the forms table.
    FormId
);
row_id!(
    /// Identifier of a row in the fields table.
    FieldId
);
row_id!(
    /// Identifier of a row in the responses table.
    ResponseId
);
row_id!(
    /// Identifier of a row in the answers table.
    AnswerId
);
