use cdp_adapter::AdapterError;
use thiserror::Error;

/// Failures talking to a language-model backend.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Transport-level failure: connection refused, DNS, TLS.
    #[error("model request failed: {0}")]
    Request(String),

    #[error("model request timed out")]
    Timeout,

    /// The backend answered with a non-success HTTP status.
    #[error("model returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered, but not in the expected shape.
    #[error("model response invalid: {0}")]
    InvalidResponse(String),

    #[error("model is misconfigured: {0}")]
    Configuration(String),
}

impl ModelError {
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Worth asking again: transport hiccups, rate limits and server errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::Request(_) | ModelError::Timeout => true,
            ModelError::Status { status, .. } => *status == 429 || *status >= 500,
            ModelError::InvalidResponse(_) | ModelError::Configuration(_) => false,
        }
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Timeout
        } else if err.is_decode() {
            ModelError::InvalidResponse(err.to_string())
        } else {
            ModelError::Request(err.to_string())
        }
    }
}

/// Errors emitted by the agent-core crate.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Raised when a session request is malformed or missing required fields.
    #[error("invalid agent request: {0}")]
    InvalidRequest(String),

    #[error("browser error: {0}")]
    Browser(#[from] AdapterError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("session log not found: {0}")]
    SessionNotFound(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Raised when the step loop fails in a way it cannot report as data.
    #[error("internal agent error: {0}")]
    Internal(String),
}

impl AgentError {
    /// Helper for wrapping static string errors.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound(session_id.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_and_server_errors_are_retryable() {
        let limited = ModelError::Status {
            status: 429,
            body: "slow down".into(),
        };
        let missing = ModelError::Status {
            status: 404,
            body: "no such model".into(),
        };
        assert!(limited.is_retryable());
        assert!(ModelError::Timeout.is_retryable());
        assert!(!missing.is_retryable());
        assert!(!ModelError::invalid_response("empty").is_retryable());
    }

    #[test]
    fn model_errors_pass_through_agent_errors() {
        let err: AgentError = ModelError::request("connection refused").into();
        assert_eq!(err.to_string(), "model request failed: connection refused");
    }
}
