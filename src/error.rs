//! Error types for the Stripe Invoice MCP Server
//!
//! This module defines the error hierarchy for all operations in the server,
//! plus the small taxonomy every failure is eventually reported under.

use serde::Serialize;
use thiserror::Error;

/// Main error type for the Stripe Invoice MCP Server
#[derive(Error, Debug)]
pub enum StripeMcpError {
    /// Stripe API errors
    #[error("Stripe API error: {0}")]
    Stripe(#[from] StripeError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Errors already shaped for the caller
    #[error("{0}")]
    Classified(#[from] ClassifiedError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl StripeMcpError {
    /// Short category name used when reporting unexpected failures
    pub fn category(&self) -> &'static str {
        match self {
            Self::Stripe(_) => "Stripe",
            Self::Config(_) => "Config",
            Self::Validation(_) => "Validation",
            Self::Classified(_) => "Classified",
            Self::Io(_) => "Io",
            Self::Json(_) => "Json",
            Self::Http(_) => "Http",
        }
    }
}

/// Discriminant of a Stripe API failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeErrorKind {
    InvalidRequest,
    Authentication,
    Permission,
    RateLimit,
    Api,
    Card,
    Idempotency,
    Connection,
    Unknown,
}

impl StripeErrorKind {
    /// Derive the kind from the HTTP status and the error body's `type` field.
    ///
    /// Status codes win: Stripe reports bad keys as `invalid_request_error`
    /// with a 401, which callers need to see as an authentication problem.
    pub fn from_response(status: u16, error_type: Option<&str>) -> Self {
        match status {
            401 => return Self::Authentication,
            403 => return Self::Permission,
            429 => return Self::RateLimit,
            _ => {}
        }

        match error_type {
            Some("invalid_request_error") => Self::InvalidRequest,
            Some("api_error") => Self::Api,
            Some("card_error") => Self::Card,
            Some("idempotency_error") => Self::Idempotency,
            _ if (400..500).contains(&status) => Self::InvalidRequest,
            _ if status >= 500 => Self::Api,
            _ => Self::Unknown,
        }
    }

    /// Wire name of the error type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request_error",
            Self::Authentication => "authentication_error",
            Self::Permission => "permission_error",
            Self::RateLimit => "rate_limit_error",
            Self::Api => "api_error",
            Self::Card => "card_error",
            Self::Idempotency => "idempotency_error",
            Self::Connection => "api_connection_error",
            Self::Unknown => "unknown_error",
        }
    }
}

impl std::fmt::Display for StripeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured failure reported by (or while talking to) the Stripe API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} ({kind})")]
pub struct StripeError {
    pub kind: StripeErrorKind,
    pub message: String,
    pub code: Option<String>,
    pub param: Option<String>,
    pub http_status: Option<u16>,
    pub request_id: Option<String>,
}

impl StripeError {
    /// Create an error with only a kind and message
    pub fn new(kind: StripeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            param: None,
            http_status: None,
            request_id: None,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid metadata query: {message}")]
    InvalidQuery { message: String },
}

/// Error taxonomy reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidParams,
    MethodNotFound,
    InvalidRequest,
    InternalError,
}

impl ErrorKind {
    /// JSON-RPC error code for this kind
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }
}

/// Structured context attached to a classified error
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

impl ErrorContext {
    pub fn is_empty(&self) -> bool {
        self.request_id.is_none() && self.http_status.is_none() && self.param.is_none()
    }
}

/// A failure mapped onto the caller-facing taxonomy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    pub context: ErrorContext,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    pub fn method_not_found(name: &str) -> Self {
        Self::new(ErrorKind::MethodNotFound, format!("Unknown tool: {}", name))
    }

    pub fn unknown_resource(uri: &str) -> Self {
        Self::new(ErrorKind::InvalidRequest, format!("Unknown resource: {}", uri))
    }

    /// Attach structured context
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }
}

/// Result type alias for Stripe MCP operations
pub type Result<T> = std::result::Result<T, StripeMcpError>;
