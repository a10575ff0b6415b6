pub mod enums;
pub mod filters;
pub mod patient;

/// Errors from model-level parsing and validation.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },
}
