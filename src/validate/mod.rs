//! Record validation against required-field, type and constraint rules.

mod constraint;
mod validator;

pub use constraint::Constraint;
pub use validator::{DataValidator, VALIDATION_ERRORS_FIELD, Validator};
