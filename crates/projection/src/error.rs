//! Error types for coordinate transformations.

use thiserror::Error;

/// Result type alias using ProjectionError.
pub type Result<T> = std::result::Result<T, ProjectionError>;

/// Errors raised while looking up or applying a projection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// The EPSG code is not part of the definition table.
    #[error("unknown EPSG code: {0}")]
    UnknownEpsg(u32),

    /// A PROJ definition string could not be parsed.
    #[error("invalid projection definition '{definition}': {message}")]
    InvalidDefinition { definition: String, message: String },

    /// The transformation itself failed or produced non-finite output.
    #[error("transform from {from} to {to} failed: {message}")]
    TransformFailed {
        from: String,
        to: String,
        message: String,
    },
}
