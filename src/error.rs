//! # Error Handling
//!
//! Error taxonomy for the capture → encode → analyze pipeline.
//!
//! ## Architecture
//!
//! - **Error Types**: one enum, [`SnapError`], with a variant per failure kind
//! - **Error Context**: timestamp, operation, recovery suggestion, retryability
//! - **Error Traits**: [`Retryable`], [`HasRecoverySuggestion`]
//!
//! ## Usage
//!
//! ```rust
//! use nutrisnap::error::{HasRecoverySuggestion, Retryable, SnapError};
//!
//! let error = SnapError::server(502, "bad gateway")
//!     .with_operation("analyze")
//!     .with_recovery_suggestion("Try again in a moment");
//!
//! assert!(error.is_retryable());
//! assert_eq!(error.recovery_suggestion(), Some("Try again in a moment"));
//! ```

use std::{error::Error as StdError, fmt, time::SystemTime};

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Whether the user can usefully repeat the action
    pub retryable: bool,
    /// Additional metadata as key-value pairs
    pub metadata: std::collections::HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            retryable: false,
            metadata: std::collections::HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }
}

/// Base error type for the library
#[derive(Debug)]
pub enum SnapError {
    /// Configuration validation errors
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// The camera or media-library grant was refused
    PermissionDenied {
        permission: String,
        context: ErrorContext,
    },
    /// The picker failed for a reason other than the user cancelling
    Acquisition {
        mode: String,
        reason: String,
        context: ErrorContext,
    },
    /// The image behind a reference could not be read or encoded
    Encoding {
        reference: String,
        reason: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
        context: ErrorContext,
    },
    /// Transport-level failure talking to the analysis endpoint
    Network {
        operation: String,
        address: Option<String>,
        source: Option<Box<dyn StdError + Send + Sync>>,
        context: ErrorContext,
    },
    /// The analysis endpoint answered with a non-success status
    Server {
        status: u16,
        body: String,
        context: ErrorContext,
    },
    /// The response body did not match the nutrition result shape
    Parse {
        reason: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
        context: ErrorContext,
    },
    /// I/O errors
    Io {
        operation: String,
        source: std::io::Error,
        context: ErrorContext,
    },
}

impl SnapError {
    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a permission-denied error
    pub fn permission_denied(permission: impl Into<String>) -> Self {
        Self::PermissionDenied {
            permission: permission.into(),
            context: ErrorContext::new(),
        }
        .retryable()
    }

    /// Create a picker failure
    pub fn acquisition(mode: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Acquisition {
            mode: mode.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
        .retryable()
    }

    /// Create an encoding error
    pub fn encoding(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encoding {
            reference: reference.into(),
            reason: reason.into(),
            source: None,
            context: ErrorContext::new(),
        }
    }

    /// Create an encoding error caused by `source`
    pub fn encoding_from(
        reference: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        let reason = source.to_string();
        Self::Encoding {
            reference: reference.into(),
            reason,
            source: Some(Box::new(source)),
            context: ErrorContext::new(),
        }
    }

    /// Create a network error
    pub fn network(operation: impl Into<String>) -> Self {
        Self::Network {
            operation: operation.into(),
            address: None,
            source: None,
            context: ErrorContext::new(),
        }
        .retryable()
    }

    /// Create a server status error
    pub fn server(status: u16, body: impl Into<String>) -> Self {
        let err = Self::Server {
            status,
            body: body.into(),
            context: ErrorContext::new(),
        };
        if status >= 500 || status == 429 {
            err.retryable()
        } else {
            err
        }
    }

    /// Create a parse error
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
            source: None,
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
            context: ErrorContext::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Mark as retryable
    pub fn retryable(mut self) -> Self {
        self.context_mut().retryable = true;
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.insert(key.into(), value.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::PermissionDenied { context, .. } => context,
            Self::Acquisition { context, .. } => context,
            Self::Encoding { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::Server { context, .. } => context,
            Self::Parse { context, .. } => context,
            Self::Io { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::PermissionDenied { context, .. } => context,
            Self::Acquisition { context, .. } => context,
            Self::Encoding { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::Server { context, .. } => context,
            Self::Parse { context, .. } => context,
            Self::Io { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Acquisition { .. } => "acquisition",
            Self::Encoding { .. } => "encoding",
            Self::Network { .. } => "network",
            Self::Server { .. } => "server",
            Self::Parse { .. } => "parse",
            Self::Io { .. } => "io",
        }
    }
}

impl fmt::Display for SnapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapError::Config {
                field,
                value,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            SnapError::PermissionDenied { permission, .. } => {
                write!(f, "Permission to use the {} was not granted", permission)
            }
            SnapError::Acquisition { mode, reason, .. } => {
                write!(f, "Could not get an image from the {}: {}", mode, reason)
            }
            SnapError::Encoding {
                reference, reason, ..
            } => {
                write!(f, "Failed to encode image {}: {}", reference, reason)
            }
            SnapError::Network {
                operation, address, ..
            } => {
                if let Some(address) = address {
                    write!(f, "Network error during {} on {}", operation, address)
                } else {
                    write!(f, "Network error during {}", operation)
                }
            }
            SnapError::Server { status, body, .. } => {
                if body.is_empty() {
                    write!(f, "Analysis service returned HTTP {}", status)
                } else {
                    write!(f, "Analysis service returned HTTP {}: {}", status, body)
                }
            }
            SnapError::Parse { reason, .. } => {
                write!(f, "Malformed analysis response: {}", reason)
            }
            SnapError::Io {
                operation, source, ..
            } => {
                write!(f, "I/O error during {}: {}", operation, source)
            }
        }
    }
}

impl StdError for SnapError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Encoding {
                source: Some(source),
                ..
            }
            | Self::Network {
                source: Some(source),
                ..
            }
            | Self::Parse {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type SnapResult<T> = Result<T, SnapError>;

/// Trait for errors that can be retried by repeating the user action
pub trait Retryable {
    /// Check if this error can be retried
    fn is_retryable(&self) -> bool;
}

impl Retryable for SnapError {
    fn is_retryable(&self) -> bool {
        self.context().retryable
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for SnapError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error conversion implementations
impl From<std::io::Error> for SnapError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<serde_json::Error> for SnapError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse {
            reason: error.to_string(),
            source: Some(Box::new(error)),
            context: ErrorContext::new(),
        }
    }
}

impl From<reqwest::Error> for SnapError {
    fn from(error: reqwest::Error) -> Self {
        let address = error.url().map(|u| u.to_string());
        let operation = if error.is_timeout() {
            "request (timed out)"
        } else if error.is_connect() {
            "connect"
        } else {
            "request"
        };
        Self::Network {
            operation: operation.to_string(),
            address,
            source: Some(Box::new(error)),
            context: ErrorContext::new(),
        }
        .retryable()
    }
}
