use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Alias for `Result<T, TbError>`.
pub type TbResult<T> = Result<T, TbError>;

/// Machine-readable error category, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The input has the wrong shape (e.g. an absurd dice count).
    ValidationError,
    /// A formula could not be parsed or evaluated.
    CalculationError,
    /// A referenced entity (resource, item, skill) does not exist.
    ResourceNotFound,
}

impl ErrorCode {
    /// The wire name of this code, e.g. `CALCULATION_ERROR`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::CalculationError => "CALCULATION_ERROR",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the formula engine and the sheet helpers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TbError {
    /// Malformed input shape.
    #[error("validation error: {0}")]
    Validation(String),

    /// A formula failed to parse or evaluate.
    #[error("calculation error: {message}")]
    Calculation {
        /// Human-readable description, suitable for UI feedback.
        message: String,
        /// Byte range in the formula source, when known.
        span: Option<Range<usize>>,
    },

    /// A reference to a nonexistent entity.
    #[error("not found: {0}")]
    ResourceNotFound(String),
}

impl TbError {
    /// Build a calculation error without source location.
    pub fn calculation(message: impl Into<String>) -> Self {
        Self::Calculation {
            message: message.into(),
            span: None,
        }
    }

    /// Build a calculation error pointing at a byte range of the formula.
    pub fn calculation_at(message: impl Into<String>, span: Range<usize>) -> Self {
        Self::Calculation {
            message: message.into(),
            span: Some(span),
        }
    }

    /// The category of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::Calculation { .. } => ErrorCode::CalculationError,
            Self::ResourceNotFound(_) => ErrorCode::ResourceNotFound,
        }
    }

    /// Source span of a calculation error, if any.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            Self::Calculation { span, .. } => span.clone(),
            _ => None,
        }
    }
}
