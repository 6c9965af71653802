use thiserror::Error;

/// Errors that may occur when a plugin factory constructs an instance.
///
/// Registries never propagate these; a failed construction is logged and treated as a miss.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FactoryError {
    #[error("missing attribute `{0}`")]
    MissingAttribute(String),
    #[error("invalid value `{value}` for attribute `{key}`")]
    InvalidAttribute { key: String, value: String },
    #[error("invalid display density {0}")]
    InvalidDensity(f64),
}
