//! Error types for schema compilation

use thiserror::Error;

/// Result type for schematic operations
pub type Result<T> = std::result::Result<T, SchematicError>;

/// Schema configuration errors
///
/// Every variant raised while compiling a schema is fatal: no partially
/// compiled schema is ever returned. Validation itself never errors.
#[derive(Error, Debug)]
pub enum SchematicError {
    #[error("Schema must be an object")]
    InvalidSchema,

    #[error("Schema must have at least one property")]
    EmptySchema { path: Option<String> },

    #[error("'{path}.$required' property must be a boolean")]
    InvalidRequired { path: String },

    #[error("'{path}.{property}' property is not allowed for schemas in $type")]
    DisallowedProperty { path: String, property: &'static str },

    #[error("'{path}' cannot declare '{key}' alongside $type")]
    UnexpectedProperty { path: String, key: String },

    #[error("'{path}' property must be of a valid type")]
    InvalidPropertyType { path: String },

    #[error("Validators must be an object")]
    InvalidValidators { path: String },

    #[error("Validator '{name}' does not exist")]
    UnknownValidator { path: String, name: String },

    #[error("Validator '{name}' must be a function or an array of functions")]
    InvalidValidator { path: String, name: String },

    #[error("Expected a constructor function")]
    NotAConstructor,

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchematicError {
    /// The dotted property path the error refers to, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            SchematicError::EmptySchema { path } => path.as_deref(),
            SchematicError::InvalidRequired { path }
            | SchematicError::DisallowedProperty { path, .. }
            | SchematicError::UnexpectedProperty { path, .. }
            | SchematicError::InvalidPropertyType { path }
            | SchematicError::InvalidValidators { path }
            | SchematicError::UnknownValidator { path, .. }
            | SchematicError::InvalidValidator { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Whether this error was raised by a malformed schema definition
    pub fn is_definition_error(&self) -> bool {
        !matches!(
            self,
            SchematicError::Config(_) | SchematicError::Io(_) | SchematicError::Json(_)
        )
    }
}
