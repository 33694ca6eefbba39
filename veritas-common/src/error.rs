//! Error types for the Veritas ecosystem.

use thiserror::Error;

/// Result type alias using the Veritas error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Veritas services.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Entity not found (claim, analysis, conversation, ...)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Ownership check failed
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// LLM or search backend failure
    #[error("Provider error: {0}")]
    Provider(String),

    /// Verdict text unparseable by every strategy
    #[error("Parse error: {0}")]
    Parse(String),

    /// Operation on an already-terminal claim or analysis
    #[error("Invalid state transition: {0}")]
    StateTransition(String),

    /// Invalid input or request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Persistence port failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Event channel closed by the consumer
    #[error("Channel send error")]
    ChannelSend,

    /// Other error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this is a not-found error.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is an authorization failure.
    pub const fn is_not_authorized(&self) -> bool {
        matches!(self, Self::NotAuthorized(_))
    }

    /// Check if this is a verdict parse failure.
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    /// Get HTTP status code for this error.
    ///
    /// The transport layer is out of scope here, but callers embedding the
    /// orchestrator behind HTTP use this mapping.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotAuthorized(_) => 403,
            Self::NotFound(_) => 404,
            Self::InvalidInput(_) => 400,
            Self::StateTransition(_) => 409,
            Self::Provider(_) => 502,
            Self::WithContext { source, .. } => source.status_code(),
            _ => 500,
        }
    }
}

/// Extension trait for adding context to any error type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        assert_eq!(Error::NotAuthorized("test".into()).status_code(), 403);
        assert_eq!(Error::NotFound("test".into()).status_code(), 404);
        assert_eq!(Error::InvalidInput("test".into()).status_code(), 400);
        assert_eq!(Error::StateTransition("test".into()).status_code(), 409);
        assert_eq!(Error::Provider("test".into()).status_code(), 502);
        assert_eq!(Error::Parse("test".into()).status_code(), 500);
    }

    #[test]
    fn error_with_context() {
        let err = Error::Provider("timeout".into());
        let with_ctx = err.with_context("calling llm");
        assert!(matches!(with_ctx, Error::WithContext { .. }));
        assert_eq!(with_ctx.status_code(), 502);
        assert_eq!(with_ctx.to_string(), "calling llm: Provider error: timeout");
    }

    #[test]
    fn error_predicates() {
        assert!(Error::NotFound("x".into()).is_not_found());
        assert!(Error::NotAuthorized("x".into()).is_not_authorized());
        assert!(Error::Parse("x".into()).is_parse());
        assert!(!Error::Provider("x".into()).is_parse());
    }
}
