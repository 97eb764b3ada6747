//! Typed error handling for the listing pipeline
//!
//! Recoverable input problems (undecodable URL parameters, unknown sort
//! columns) never become errors: the schema substitutes defaults. What remains
//! is grouped here so callers can match specific failures instead of a
//! generic `anyhow::Error`.
//!
//! # Error Categories
//!
//! - [`StorageError`]: the backing store failed; propagated, never retried here
//! - [`ConfigError`]: configuration parsing and schema declaration problems
//! - [`ContextError`]: filter context misuse (programming errors)
//! - [`RequestError`]: HTTP requests the listing endpoints cannot serve
//!
//! # Example
//!
//! ```rust,ignore
//! match search(&store, &spec, &state, None).await {
//!     Ok(result) => render(result),
//!     Err(ListingError::Storage(e)) => tracing::error!("listing unavailable: {}", e),
//!     Err(e) => return Err(e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type of the listing pipeline
#[derive(Debug)]
pub enum ListingError {
    /// Storage backend errors
    Storage(StorageError),

    /// Configuration errors
    Config(ConfigError),

    /// Filter context misuse
    Context(ContextError),

    /// HTTP/Request errors
    Request(RequestError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for ListingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingError::Storage(e) => write!(f, "{}", e),
            ListingError::Config(e) => write!(f, "{}", e),
            ListingError::Context(e) => write!(f, "{}", e),
            ListingError::Request(e) => write!(f, "{}", e),
            ListingError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ListingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListingError::Storage(e) => Some(e),
            ListingError::Config(e) => Some(e),
            ListingError::Context(e) => Some(e),
            ListingError::Request(e) => Some(e),
            ListingError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ListingError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ListingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ListingError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ListingError::Context(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ListingError::Request(e) => e.status_code(),
            ListingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ListingError::Storage(_) => "STORAGE_ERROR",
            ListingError::Config(_) => "CONFIG_ERROR",
            ListingError::Context(_) => "CONTEXT_ERROR",
            ListingError::Request(e) => e.error_code(),
            ListingError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response.
    ///
    /// Server-side failures get a generic message; their details stay in the
    /// logs.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            ListingError::Request(e) => e.to_string(),
            _ => "Something went wrong while loading this listing".to_string(),
        };
        ErrorResponse {
            code: self.error_code().to_string(),
            message,
        }
    }
}

impl IntoResponse for ListingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "Listing request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug)]
pub enum StorageError {
    /// Connection error
    ConnectionError { backend: String, message: String },

    /// Query execution error
    QueryError { backend: String, message: String },

    /// Transaction error
    TransactionError { message: String },

    /// Backend not available
    Unavailable { backend: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionError { backend, message } => {
                write!(f, "Failed to connect to {}: {}", backend, message)
            }
            StorageError::QueryError { backend, message } => {
                write!(f, "{} query error: {}", backend, message)
            }
            StorageError::TransactionError { message } => {
                write!(f, "Transaction error: {}", message)
            }
            StorageError::Unavailable { backend } => {
                write!(f, "Storage backend '{}' is unavailable", backend)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for ListingError {
    fn from(err: StorageError) -> Self {
        ListingError::Storage(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// No configuration for the requested entity
    UnknownEntity { entity: String },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::UnknownEntity { entity } => {
                write!(f, "No listing configuration for entity '{}'", entity)
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for ListingError {
    fn from(err: ConfigError) -> Self {
        ListingError::Config(err)
    }
}

// =============================================================================
// Context Errors
// =============================================================================

/// Misuse of the filter context: development-time contract violations
#[derive(Debug)]
pub enum ContextError {
    /// A consumer asked for filters outside any provider scope
    MissingProvider { consumer: String },
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::MissingProvider { consumer } => write!(
                f,
                "{} must be used within a filter provider scope",
                consumer
            ),
        }
    }
}

impl std::error::Error for ContextError {}

impl From<ContextError> for ListingError {
    fn from(err: ContextError) -> Self {
        ListingError::Context(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP requests
#[derive(Debug)]
pub enum RequestError {
    /// Missing required header
    MissingHeader { header: String },

    /// Header present but unusable
    InvalidHeader { header: String, message: String },

    /// Unauthorized request
    Unauthorized { message: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::MissingHeader { header } => {
                write!(f, "Missing required header: {}", header)
            }
            RequestError::InvalidHeader { header, message } => {
                write!(f, "Invalid header '{}': {}", header, message)
            }
            RequestError::Unauthorized { message } => {
                write!(f, "Unauthorized: {}", message)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::MissingHeader { .. } => StatusCode::UNAUTHORIZED,
            RequestError::InvalidHeader { .. } => StatusCode::BAD_REQUEST,
            RequestError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::MissingHeader { .. } => "MISSING_HEADER",
            RequestError::InvalidHeader { .. } => "INVALID_HEADER",
            RequestError::Unauthorized { .. } => "UNAUTHORIZED",
        }
    }
}

impl From<RequestError> for ListingError {
    fn from(err: RequestError) -> Self {
        ListingError::Request(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<std::io::Error> for ListingError {
    fn from(err: std::io::Error) -> Self {
        ListingError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for ListingError {
    fn from(err: serde_yaml::Error) -> Self {
        ListingError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<tera::Error> for ListingError {
    fn from(err: tera::Error) -> Self {
        ListingError::Internal(format!("template error: {}", err))
    }
}

impl From<serde_json::Error> for ListingError {
    fn from(err: serde_json::Error) -> Self {
        ListingError::Internal(format!("serialization error: {}", err))
    }
}

/// Store failures arrive as `anyhow::Error` from the store traits
impl From<anyhow::Error> for ListingError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<StorageError>() {
            Ok(storage) => ListingError::Storage(storage),
            Err(other) => ListingError::Storage(StorageError::QueryError {
                backend: "store".to_string(),
                message: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for listing operations
pub type ListingResult<T> = Result<T, ListingError>;

// =============================================================================
// Tests
// =============================================================================
