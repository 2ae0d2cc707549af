//! Error envelope shared by every core operation (spec §6 / §7).
//!
//! The taxonomy is closed: seven variants, each mapping to a stable
//! `category`, `severity`, and `retryable` flag so that orchestrating code
//! can dispatch on those fields rather than matching error message strings.

use thiserror::Error;

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error category, carried in the error envelope (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Network,
    Quota,
    Parse,
    Storage,
    Llm,
    Validation,
    Unknown,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Network => "network",
            Category::Quota => "quota",
            Category::Parse => "parse",
            Category::Storage => "storage",
            Category::Llm => "llm",
            Category::Validation => "validation",
            Category::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Severity tier, used by callers to decide how loudly to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Core error taxonomy (spec §7). Every fallible operation in the crate
/// returns `Result<T, Error>`.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad arguments; surfaced to the caller, no state mutation occurs.
    #[error("validation error: {message}")]
    ValidationError {
        message: String,
        details: Option<String>,
    },

    /// A single file in a batch failed to parse; non-fatal, carried in the
    /// batch result rather than aborting it.
    #[error("parse error in {path}: {message}")]
    ParseError {
        path: String,
        message: String,
        details: Option<String>,
    },

    /// Vector-store I/O failure. Retryable with bounded exponential backoff.
    #[error("storage error: {message}")]
    StorageError {
        message: String,
        details: Option<String>,
    },

    /// Embedding or model-provider call failed at the transport layer.
    /// Retryable with bounded jittered backoff.
    #[error("network error: {message}")]
    NetworkError {
        message: String,
        details: Option<String>,
    },

    /// Budget tracker or provider quota exhausted. Retryable at the next
    /// reset boundary; the Model Router falls through its ladder first.
    #[error("quota exceeded for {provider}: {message}")]
    QuotaExceeded {
        provider: String,
        message: String,
        details: Option<String>,
    },

    /// Indexer was asked to parse a language tag outside the closed
    /// enumeration. Not an error to the caller: zero chunks are returned.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// A suspending call was cancelled before completion. Propagated
    /// unchanged; no partial state is left mutated.
    #[error("operation cancelled")]
    Cancelled,

    /// A model-provider call completed but returned a response the Router
    /// could not use (malformed output, unavailable model id, ...).
    #[error("llm provider error: {message}")]
    Llm {
        message: String,
        details: Option<String>,
    },
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            details: None,
        }
    }

    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
            details: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
            details: None,
        }
    }

    pub fn quota(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QuotaExceeded {
            provider: provider.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Stable machine-readable code for this error, per the §6 envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Error::ValidationError { .. } => "validation_error",
            Error::ParseError { .. } => "parse_error",
            Error::StorageError { .. } => "storage_error",
            Error::NetworkError { .. } => "network_error",
            Error::QuotaExceeded { .. } => "quota_exceeded",
            Error::UnsupportedLanguage(_) => "unsupported_language",
            Error::Cancelled => "cancelled",
            Error::Llm { .. } => "llm_error",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Error::ValidationError { .. } => Category::Validation,
            Error::ParseError { .. } => Category::Parse,
            Error::StorageError { .. } => Category::Storage,
            Error::NetworkError { .. } => Category::Network,
            Error::QuotaExceeded { .. } => Category::Quota,
            Error::UnsupportedLanguage(_) => Category::Parse,
            Error::Cancelled => Category::Unknown,
            Error::Llm { .. } => Category::Llm,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Error::ValidationError { .. } => Severity::Low,
            Error::ParseError { .. } => Severity::Low,
            Error::StorageError { .. } => Severity::High,
            Error::NetworkError { .. } => Severity::Medium,
            Error::QuotaExceeded { .. } => Severity::Medium,
            Error::UnsupportedLanguage(_) => Severity::Low,
            Error::Cancelled => Severity::Medium,
            Error::Llm { .. } => Severity::Medium,
        }
    }

    pub fn retryable(&self) -> bool {
        match self {
            Error::ValidationError { .. } => false,
            Error::ParseError { .. } => false,
            Error::StorageError { .. } => true,
            Error::NetworkError { .. } => true,
            Error::QuotaExceeded { .. } => true,
            Error::UnsupportedLanguage(_) => false,
            Error::Cancelled => false,
            Error::Llm { .. } => true,
        }
    }

    /// Structured `details` payload carried in the envelope, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            Error::ValidationError { details, .. }
            | Error::StorageError { details, .. }
            | Error::NetworkError { details, .. }
            | Error::Llm { details, .. } => details.as_deref(),
            Error::ParseError { details, .. } => details.as_deref(),
            Error::QuotaExceeded { details, .. } => details.as_deref(),
            Error::UnsupportedLanguage(_) | Error::Cancelled => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::StorageError {
            message: err.to_string(),
            details: None,
        }
    }
}

/// Race a suspending operation against a cancellation signal (spec §5:
/// "every suspending call accepts a cancellation signal and must return
/// promptly with a `Cancelled` error"). If `cancel` fires first, `fut` is
/// dropped without being polled further and `Error::Cancelled` is
/// returned; no partial state from `fut` is observed by the caller.
pub async fn cancellable<T>(
    cancel: &tokio_util::sync::CancellationToken,
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}
