use thiserror::Error;

/// Top-level error type for reelscope operations.
#[derive(Debug, Error)]
pub enum ReelscopeError {
    // --- Input errors (the caller's media could not be prepared) ---
    #[error("Encoding error: {0}")]
    Encoding(String),

    // --- Hosted model errors (transport, auth, quota, refusal) ---
    #[error("Model invocation error: {0}")]
    ModelInvocation(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // --- Structured output errors (absorbed by the Normalizer, never abort an analysis) ---
    #[error("Normalization failure: {0}")]
    Normalization(String),

    // --- Conversation errors ---
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    // --- Operational errors ---
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

impl ReelscopeError {
    /// Whether the hosted model (or the path to it) is at fault.
    pub fn is_model_failure(&self) -> bool {
        matches!(self, Self::ModelInvocation(_) | Self::Timeout(_))
    }

    /// Whether the caller's input is at fault.
    pub fn is_input_failure(&self) -> bool {
        matches!(self, Self::Encoding(_))
    }
}

/// Result type alias for reelscope operations.
pub type Result<T> = std::result::Result<T, ReelscopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ReelscopeError::ModelInvocation("quota".into()).is_model_failure());
        assert!(ReelscopeError::Timeout("summary".into()).is_model_failure());
        assert!(!ReelscopeError::Encoding("empty".into()).is_model_failure());
        assert!(ReelscopeError::Encoding("empty".into()).is_input_failure());
        assert!(!ReelscopeError::SessionNotFound("x".into()).is_input_failure());
    }

    #[test]
    fn test_serde_error_converts() {
        let err: ReelscopeError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ReelscopeError::Serialization(_)));
    }
}
