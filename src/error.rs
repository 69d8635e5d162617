/// Unified error type for layer joins
/// Every failure is raised before any output layer is built
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// A referenced field does not exist in its declared schema
    #[error("field {field} does not exist{}", layer_suffix(.layer))]
    FieldMissing {
        field: String,
        layer: Option<String>,
    },

    /// An output field name is produced twice and cannot be auto-resolved
    #[error("field {field} already exists in output")]
    FieldExists {
        field: String,
    },

    /// A geometry was supplied but the merged schema declares none
    #[error("geometry_ref not found in merged schema")]
    GeometryRefNotFound,

    /// Geometry type is not one of the types declared by the merged schema
    #[error("geometry type {geometry_type} does not match merged schema geometry types")]
    GeometryTypeMismatch {
        geometry_type: String,
    },

    /// Option value that cannot be interpreted
    #[error("invalid option: {message}")]
    InvalidOption {
        message: String,
    },
}

impl JoinError {
    pub fn field_missing(field: impl Into<String>) -> Self {
        Self::FieldMissing {
            field: field.into(),
            layer: None,
        }
    }

    pub fn field_missing_in(field: impl Into<String>, layer: impl Into<String>) -> Self {
        Self::FieldMissing {
            field: field.into(),
            layer: Some(layer.into()),
        }
    }

    pub fn field_exists(field: impl Into<String>) -> Self {
        Self::FieldExists {
            field: field.into(),
        }
    }

    pub fn geometry_type_mismatch(geometry_type: impl Into<String>) -> Self {
        Self::GeometryTypeMismatch {
            geometry_type: geometry_type.into(),
        }
    }

    pub fn invalid_option(message: impl Into<String>) -> Self {
        Self::InvalidOption {
            message: message.into(),
        }
    }

    /// Name of the offending field, when the error concerns one
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::FieldMissing { field, .. } | Self::FieldExists { field } => Some(field),
            _ => None,
        }
    }
}

fn layer_suffix(layer: &Option<String>) -> String {
    layer
        .as_ref()
        .map(|name| format!(" in layer {}", name))
        .unwrap_or_default()
}

/// Result type alias for join operations
pub type JoinResult<T> = Result<T, JoinError>;
