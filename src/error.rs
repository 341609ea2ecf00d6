//! Error types for the spendline library.

use core::fmt;

/// A single failed input check, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the field as it appears on the wire (camelCase).
    pub field: &'static str,
    /// Human-readable message suitable for display next to the field.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    #[inline]
    #[must_use]
    pub fn new<M: Into<String>>(field: &'static str, message: M) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field error collected while validating one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Creates an empty collection.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Records a failure for `field`.
    #[inline]
    pub fn push<M: Into<String>>(&mut self, field: &'static str, message: M) {
        self.0.push(FieldError::new(field, message));
    }

    /// Returns `true` if nothing failed.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the individual field errors.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Returns the message recorded for `field`, if any.
    #[inline]
    #[must_use]
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|err| err.field == field)
            .map(|err| err.message.as_str())
    }

    /// Converts the collection into `Ok(value)` when empty, or a
    /// [`LedgerError::Validation`] otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] if any field failed.
    #[inline]
    pub fn into_result<T>(self, value: T) -> Result<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(LedgerError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            fmt::Display::fmt(err, f)?;
        }
        Ok(())
    }
}

/// All errors that can occur when using the ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Local input failed validation; nothing was sent to the backend.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// A budget for the category is already active (or overlaps the
    /// requested window). Callers should offer to update `existing`.
    #[error("a budget for {category} already exists ({existing})")]
    DuplicateCategory {
        /// Display name of the contested category.
        category: String,
        /// Identifier of the budget already covering the category.
        existing: String,
    },

    /// Transport failure or timeout talking to the remote API.
    #[cfg(any(feature = "async", feature = "blocking"))]
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The bearer credential was rejected.
    #[error("credentials rejected by the server; sign in again")]
    AuthExpired,

    /// The targeted resource does not exist (any more).
    #[error("resource not found: {id}")]
    NotFound {
        /// Identifier that was looked up.
        id: String,
    },

    /// The server answered with an unexpected non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local backend storage failed.
    #[error("storage error: {0}")]
    Storage(Box<dyn core::error::Error + Send + Sync>),

    /// Configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// Builds a [`LedgerError::NotFound`] for any displayable identifier.
    #[inline]
    #[must_use]
    pub fn not_found<I: fmt::Display>(id: I) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Returns `true` for [`LedgerError::NotFound`], which callers treat as
    /// a no-op outcome (e.g. delete-after-delete).
    #[inline]
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(*self, Self::NotFound { .. })
    }

    /// Returns `true` if the caller may retry the same request unchanged.
    #[inline]
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match *self {
            #[cfg(any(feature = "async", feature = "blocking"))]
            Self::Network(_) => true,
            Self::Api { status, .. } => status >= 500,
            Self::Validation(_)
            | Self::DuplicateCategory { .. }
            | Self::AuthExpired
            | Self::NotFound { .. }
            | Self::Serialization(_)
            | Self::Storage(_)
            | Self::Config(_) => false,
        }
    }

    /// Returns the field errors if this is a validation failure.
    #[inline]
    #[must_use]
    pub const fn validation(&self) -> Option<&ValidationErrors> {
        match *self {
            Self::Validation(ref errors) => Some(errors),
            _ => None,
        }
    }
}

/// Convenience result type for ledger operations.
pub type Result<T> = core::result::Result<T, LedgerError>;
