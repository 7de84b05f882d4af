pub mod catalog;
pub mod reconcile;
pub mod record;
pub mod sanitize;
pub mod schema;
pub mod session;
pub mod validate;

pub use catalog::*;
pub use reconcile::*;
pub use record::Record;
pub use sanitize::*;
pub use schema::*;
pub use session::*;
pub use validate::*;

use thiserror::Error;

/// Misconfigured form schema. Raised only while registering a
/// [`FormDefinition`], never while editing a record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaConfigurationError {
    #[error("Duplicate field key: {0}")]
    DuplicateField(String),

    #[error("Invalid field key: {0:?}")]
    InvalidKey(String),

    #[error("Field {field} is nested under field {parent}")]
    NestedUnderField { field: String, parent: String },

    #[error("Rule {rule} references undeclared field {field}")]
    UnknownField { rule: String, field: String },

    #[error("Token {token} is not a choice of field {field}")]
    UnknownToken { field: String, token: String },

    #[error("Rule {rule} tests field {field} with a condition of the wrong kind")]
    ConditionKindMismatch { rule: String, field: String },

    #[error("Rule {0} has no dependents")]
    EmptyRule(String),

    #[error("Field {field} is claimed by rules {first_rule} and {second_rule}")]
    SharedDependent {
        field: String,
        first_rule: String,
        second_rule: String,
    },

    #[error("Cyclic dependency between rules: {0:?}")]
    CyclicDependency(Vec<String>),
}
