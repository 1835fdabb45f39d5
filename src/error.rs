//! Error types for the persona governor
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for CLI
//!
//! Per-candidate validation failures are not errors; see
//! [`crate::governance::Rejection`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::taxonomy::Category;

/// Result type alias for governor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,
    SerializationError = 210,

    // Taxonomy errors (3xx)
    TaxonomyParse = 300,
    TaxonomyIntegrity = 301,
    UnknownCategory = 302,
    UnknownCohort = 303,
    UnknownLineage = 304,

    // Governance errors (4xx)
    PoolExhausted = 400,
    InvalidRequest = 401,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Taxonomy errors
            400..=499 => 40, // Governance errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the governor
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Taxonomy Errors
    // ─────────────────────────────────────────────────────────────

    /// Taxonomy document could not be parsed
    #[error("Failed to parse taxonomy: {message}")]
    TaxonomyParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Taxonomy parsed but violates a structural rule
    #[error("Taxonomy integrity check failed: {0}")]
    TaxonomyIntegrity(String),

    /// Category label not in the fixed set
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Generational cohort label not recognised
    #[error("Unknown cohort: {0}")]
    UnknownCohort(String),

    /// Cultural lineage label not recognised
    #[error("Unknown lineage: {0}")]
    UnknownLineage(String),

    // ─────────────────────────────────────────────────────────────
    // Governance Errors
    // ─────────────────────────────────────────────────────────────

    /// No valid item could be selected at all
    #[error("Pool exhausted for {category}: requested {requested}, none available")]
    PoolExhausted { category: Category, requested: usize },

    /// Request is structurally unusable
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::Config(_) => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::SerializationError,
            Error::Json(_) => ErrorCode::SerializationError,

            Error::TaxonomyParse { .. } => ErrorCode::TaxonomyParse,
            Error::TaxonomyIntegrity(_) => ErrorCode::TaxonomyIntegrity,
            Error::UnknownCategory(_) => ErrorCode::UnknownCategory,
            Error::UnknownCohort(_) => ErrorCode::UnknownCohort,
            Error::UnknownLineage(_) => ErrorCode::UnknownLineage,

            Error::PoolExhausted { .. } => ErrorCode::PoolExhausted,
            Error::InvalidRequest(_) => ErrorCode::InvalidRequest,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the caller may retry (possibly with a relaxed request)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::PoolExhausted { .. } | Error::Io(_) | Error::IoRead { .. } | Error::IoWrite { .. }
        )
    }

    /// Check if the error is fatal (the process cannot serve requests)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigParse { .. }
                | Error::ConfigValidation { .. }
                | Error::Config(_)
                | Error::TaxonomyParse { .. }
                | Error::TaxonomyIntegrity(_)
                | Error::Internal(_)
        )
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'persona-governor config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'persona-governor config validate' to see details."
            ),
            Error::ConfigValidation { .. } | Error::Config(_) => Some(
                "Review the configuration file and fix the invalid values."
            ),

            Error::TaxonomyParse { .. } => Some(
                "Check the taxonomy file syntax, or unset taxonomy.path to use the bundled canon."
            ),
            Error::TaxonomyIntegrity(_) => Some(
                "Every pooled item needs exactly one phylum and every alias must target a canonical item."
            ),
            Error::UnknownCategory(_) => Some(
                "Run 'persona-governor taxonomy categories' to list valid category labels."
            ),
            Error::UnknownCohort(_) => Some(
                "Valid cohorts are: Gen Z, Millennial, Gen X, Boomer."
            ),
            Error::UnknownLineage(_) => Some(
                "Run 'persona-governor taxonomy lineages' to list valid lineage labels."
            ),

            Error::PoolExhausted { .. } => Some(
                "No valid items remain for this category. Retry with a related category or a dual-anchor brand."
            ),

            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            code.as_str(),
            self
        );

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        let code = self.code();
        format!("[{}] {}", code.as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound { path: path.into() }
    }

    /// Create a config parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a taxonomy integrity error
    pub fn taxonomy(message: impl Into<String>) -> Self {
        Error::TaxonomyIntegrity(message.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest(message.into())
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::ConfigNotFound.as_str(), "E100");
        assert_eq!(ErrorCode::TaxonomyParse.as_str(), "E300");
        assert_eq!(ErrorCode::PoolExhausted.as_str(), "E400");
        assert_eq!(ErrorCode::InternalError.as_str(), "E900");
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(ErrorCode::ConfigNotFound.exit_code(), 10);
        assert_eq!(ErrorCode::IoRead.exit_code(), 20);
        assert_eq!(ErrorCode::UnknownCategory.exit_code(), 30);
        assert_eq!(ErrorCode::PoolExhausted.exit_code(), 40);
        assert_eq!(ErrorCode::InternalError.exit_code(), 90);
    }

    #[test]
    fn test_error_display() {
        let err = Error::config_not_found("/path/to/config.toml");
        assert!(err.to_string().contains("/path/to/config.toml"));

        let err = Error::PoolExhausted {
            category: Category::Cpg,
            requested: 15,
        };
        assert!(err.to_string().contains("CPG"));
        assert!(err.to_string().contains("15"));
    }

    #[test]
    fn test_error_codes() {
        let err = Error::config_not_found("/test");
        assert_eq!(err.code(), ErrorCode::ConfigNotFound);

        let err = Error::taxonomy("duplicate phylum");
        assert_eq!(err.code(), ErrorCode::TaxonomyIntegrity);

        let err = Error::invalid_request("no category");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[test]
    fn test_error_retryable() {
        let exhausted = Error::PoolExhausted {
            category: Category::Auto,
            requested: 15,
        };
        assert!(exhausted.is_retryable());
        assert!(!exhausted.is_fatal());
        assert!(!Error::config_not_found("/test").is_retryable());
        assert!(!Error::UnknownCategory("B2B".into()).is_retryable());
    }

    #[test]
    fn test_error_fatal() {
        assert!(Error::config_not_found("/test").is_fatal());
        assert!(Error::taxonomy("broken").is_fatal());
        assert!(!Error::invalid_request("empty").is_fatal());
    }

    #[test]
    fn test_error_suggestions() {
        let err = Error::config_not_found("/test");
        assert!(err.suggestion().unwrap().contains("config init"));

        let err = Error::UnknownCategory("Pets".into());
        assert!(err.suggestion().unwrap().contains("taxonomy categories"));

        assert!(Error::Internal("x".into()).suggestion().is_none());
    }

    #[test]
    fn test_format_for_terminal() {
        let err = Error::config_not_found("/test/config.toml");
        let formatted = err.format_for_terminal();

        assert!(formatted.contains("E100"));
        assert!(formatted.contains("\x1b[31m"));
        assert!(formatted.contains("Hint"));
    }

    #[test]
    fn test_format_for_log() {
        let err = Error::config_not_found("/test/config.toml");
        let formatted = err.format_for_log();

        assert!(formatted.contains("[E100]"));
        assert!(!formatted.contains("\x1b["));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        assert_eq!(err.code(), ErrorCode::IoNotFound);
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.code(), ErrorCode::SerializationError);
    }
}
