//! Invoice domain types and schema validation

mod types;
pub mod validate;

pub use types::*;
pub use validate::SchemaViolation;
