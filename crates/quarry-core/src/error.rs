//! Error types for quarry

use thiserror::Error;

/// Result type alias using QuarryError
pub type Result<T> = std::result::Result<T, QuarryError>;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
    pub const TURN_ABORTED: i32 = 4;
}

/// Main error type for quarry
///
/// These are turn-level failures. Anything that goes wrong inside a tool call
/// is rendered to text and handed back to the reasoning stage instead.
#[derive(Debug, Error)]
pub enum QuarryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("External service error: {0}")]
    ExternalError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conversation invariant violated: {0}")]
    Conversation(String),

    #[error("Turn aborted after {iterations} iterations without a final answer")]
    TurnAborted { iterations: usize },

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl QuarryError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ThreadNotFound(_) => exit_codes::NOT_FOUND,
            Self::InvalidInput(_) | Self::Config(_) => exit_codes::INVALID_INPUT,
            Self::TurnAborted { .. } => exit_codes::TURN_ABORTED,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}

/// Classification of tool-level failures.
///
/// Every variant is recoverable from the loop's perspective: it ends up as the
/// text of a tool-result entry, never as an `Err` out of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ConnectivityFailure,
    Timeout,
    AuthFailure,
    NotFound,
    ConfigurationError,
    NoSearchableFields,
    SchemaViolation,
    UnknownTool,
    GenericFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectivityFailure => "connectivity_failure",
            Self::Timeout => "timeout",
            Self::AuthFailure => "auth_failure",
            Self::NotFound => "not_found",
            Self::ConfigurationError => "configuration_error",
            Self::NoSearchableFields => "no_searchable_fields",
            Self::SchemaViolation => "schema_violation",
            Self::UnknownTool => "unknown_tool",
            Self::GenericFailure => "generic_failure",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
