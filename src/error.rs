//! Error kinds
//!
//! - `ValidationFailure`: a stage precondition is unmet, state unchanged
//! - `ProviderError`: the completion provider could not be reached or refused us
//! - `ExtractError`: the provider replied but no JSON could be pulled out of it
//! - `ConfigError`: startup configuration is missing or invalid

use crate::types::Stage;

/// A stage-gated operation was rejected. Always recoverable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("please enter what you want to decide")]
    EmptyPurpose,

    #[error("please add at least two options ({count} so far)")]
    TooFewOptions { count: usize },

    #[error("please answer every question ({} unanswered)", .missing.len())]
    Unanswered { missing: Vec<String> },

    #[error("unknown question: {0}")]
    UnknownQuestion(String),

    #[error("cannot {action} during the {stage} stage")]
    StageLocked { stage: Stage, action: &'static str },

    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: Stage, to: Stage },
}

/// Failure calling the completion provider. Retryable by the user.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Could not connect or the connection broke
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Non-success HTTP status
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Success status but no completion text in the envelope
    #[error("malformed provider response: {0}")]
    Envelope(String),
}

impl ProviderError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn envelope(message: impl Into<String>) -> Self {
        Self::Envelope(message.into())
    }
}

/// No JSON value could be extracted from a model reply
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("no '{0}' in reply")]
    MissingOpen(char),

    #[error("no '{0}' in reply")]
    MissingClose(char),

    /// The last closing bracket comes before the first opening one
    #[error("closing '{close}' precedes opening '{open}'")]
    Inverted { open: char, close: char },

    #[error("invalid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Startup configuration problem. Fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no API key configured: set DILEMMAI_API_KEY (or GROQ_API_KEY)")]
    MissingApiKey,

    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("could not read {path}: {message}")]
    EnvFile { path: String, message: String },
}

/// Errors surfaced by a `DilemmaSession` operation
#[derive(Debug, thiserror::Error)]
pub enum DilemmaError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("AI provider unavailable, please try again: {0}")]
    Provider(#[from] ProviderError),
}

impl DilemmaError {
    /// Whether simply repeating the same action may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, DilemmaError::Provider(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationFailure::TooFewOptions { count: 1 }.to_string(),
            "please add at least two options (1 so far)"
        );
        let missing = ValidationFailure::Unanswered {
            missing: vec!["A?".into(), "B?".into()],
        };
        assert_eq!(missing.to_string(), "please answer every question (2 unanswered)");
        let locked = ValidationFailure::StageLocked {
            stage: Stage::Final,
            action: "edit options",
        };
        assert_eq!(locked.to_string(), "cannot edit options during the final stage");
    }

    #[test]
    fn test_retryable() {
        assert!(DilemmaError::from(ProviderError::network("down")).is_retryable());
        assert!(!DilemmaError::from(ValidationFailure::EmptyPurpose).is_retryable());
    }
}
