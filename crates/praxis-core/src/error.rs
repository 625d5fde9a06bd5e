//! Error types for Praxis.
//!
//! This module provides [`RestError`], the standard error type used
//! throughout the framework. Action-level failures (validation, blocked
//! deletes) are returned as [`crate::ActionResult`] values rather than
//! errors; `RestError` covers routing, parameter, and resource failures
//! that the dispatcher turns into a uniform error envelope.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AttributeMap;

/// Result type alias using [`RestError`].
pub type RestResult<T> = Result<T, RestError>;

/// Categories of errors for classification and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input shape, missing required parameter, or failed validation.
    Validation,
    /// Missing or invalid credentials.
    Unauthorized,
    /// The requested resource does not exist.
    NotFound,
    /// Validation prevented a delete/replace, or the verb is not supported.
    Blocked,
    /// Reserved functionality.
    NotImplemented,
    /// A failure with no validation errors explaining it.
    Unexpected,
}

impl ErrorKind {
    /// Returns the HTTP status code for this error kind.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Blocked => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            Self::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard error type for Praxis.
///
/// # Example
///
/// ```
/// use praxis_core::RestError;
/// use http::StatusCode;
///
/// let err = RestError::not_found("The specified resource cannot be found.");
/// assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
/// ```
#[derive(Error, Debug)]
pub enum RestError {
    /// Request input failed validation.
    #[error("{message}")]
    Validation {
        /// Human-readable error message.
        message: String,
        /// Per-attribute validation errors, if any.
        field_errors: Option<FieldErrors>,
    },

    /// A declared required parameter is absent.
    #[error("Missing {name} parameter")]
    MissingParameter {
        /// The parameter name.
        name: String,
    },

    /// An `_embed` parameter named an unknown relation.
    #[error("Invalid request, unknown {name} parameter")]
    UnknownEmbed {
        /// The unknown embed name.
        name: String,
    },

    /// The request lacks valid credentials for the resource.
    #[error("{message}")]
    Unauthorized {
        /// Human-readable error message.
        message: String,
    },

    /// The requested resource does not exist.
    #[error("{message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// An action was invoked with an unsupported HTTP method.
    #[error("{action} does not support the '{method}' method")]
    MethodNotSupported {
        /// The action label.
        action: String,
        /// The offending HTTP method.
        method: String,
    },

    /// Validation prevented a delete or replace.
    #[error("{message}")]
    Blocked {
        /// Human-readable error message.
        message: String,
    },

    /// Reserved functionality was invoked.
    #[error("Not Implemented")]
    NotImplemented,

    /// A failure that should not have happened.
    #[error("{message}")]
    Unexpected {
        /// Human-readable error message.
        message: String,
        /// The underlying cause, if any (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl RestError {
    /// Creates a validation error with a message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    /// Creates a validation error carrying per-attribute errors.
    #[must_use]
    pub fn validation_with_fields(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Creates a missing-parameter error.
    #[must_use]
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Creates an unknown-embed error.
    #[must_use]
    pub fn unknown_embed(name: impl Into<String>) -> Self {
        Self::UnknownEmbed { name: name.into() }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a blocked (405) error.
    #[must_use]
    pub fn blocked(message: impl Into<String>) -> Self {
        Self::Blocked {
            message: message.into(),
        }
    }

    /// Creates an unexpected (fatal) error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unexpected error with an underlying cause.
    pub fn unexpected_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Unexpected {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::MissingParameter { .. } | Self::UnknownEmbed { .. } => {
                ErrorKind::Validation
            }
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::MethodNotSupported { .. } | Self::Blocked { .. } => ErrorKind::Blocked,
            Self::NotImplemented => ErrorKind::NotImplemented,
            Self::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// Returns a machine-readable error type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Unauthorized => "UnauthorizedError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Blocked => "ConflictOrBlockedError",
            ErrorKind::NotImplemented => "NotImplementedError",
            ErrorKind::Unexpected => "UnexpectedFailure",
        }
    }

    /// Returns the per-attribute errors carried by this error, if any.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { field_errors, .. } => field_errors.as_ref(),
            _ => None,
        }
    }
}

/// Per-attribute validation errors, attribute name to message list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors {
    /// Map of attribute name to error messages.
    pub fields: indexmap::IndexMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates a new empty `FieldErrors`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error message for an attribute.
    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(attribute.into())
            .or_default()
            .push(message.into());
    }

    /// Returns `true` if there are no errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of attributes with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Converts the errors to a serializable value keyed by attribute.
    #[must_use]
    pub fn to_value(&self) -> crate::Value {
        serde_json::to_value(&self.fields).unwrap_or(crate::Value::Null)
    }
}

impl From<AttributeMap> for FieldErrors {
    fn from(map: AttributeMap) -> Self {
        let mut errors = Self::new();
        for (name, value) in map {
            match value {
                serde_json::Value::Array(messages) => {
                    for message in messages {
                        if let serde_json::Value::String(s) = message {
                            errors.add(&name, s);
                        }
                    }
                }
                serde_json::Value::String(s) => errors.add(&name, s),
                _ => {}
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RestError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RestError::missing_parameter("q").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RestError::not_found("gone").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RestError::blocked("nope").status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            RestError::NotImplemented.status_code(),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            RestError::unexpected("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_parameter_message() {
        let err = RestError::missing_parameter("relation");
        assert_eq!(err.to_string(), "Missing relation parameter");
    }

    #[test]
    fn test_field_errors() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());

        errors.add("name", "Name cannot be blank.");
        errors.add("name", "Name is too long.");
        errors.add("color", "Color is invalid.");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.fields["name"].len(), 2);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(RestError::validation("x").type_name(), "ValidationError");
        assert_eq!(RestError::NotImplemented.type_name(), "NotImplementedError");
        assert_eq!(
            RestError::unexpected("x").type_name(),
            "UnexpectedFailure"
        );
    }
}
