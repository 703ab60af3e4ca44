use thiserror::Error;

use crate::JobKind;

/// Input rejected locally, before any gateway call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request text must not be empty")]
    EmptyRequest,
    #[error("request text is longer than {max} characters")]
    RequestTooLong { max: usize },
    #[error("a ticker is required for {kind} requests")]
    MissingTicker { kind: JobKind },
    #[error("a comparison needs between {min} and {max} distinct tickers, got {count}")]
    ComparisonTickerCount { count: usize, min: usize, max: usize },
    #[error("unknown request kind: {0}")]
    UnknownKind(String),
    #[error("unknown sort order: {0}")]
    UnknownSort(String),
}

/// Classified failure reported by a `JobGateway` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The server rejected the request's fields.
    #[error("rejected by server: {0}")]
    Validation(String),
    /// The server could not be reached or did not answer in time.
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("not found: {0}")]
    NotFound(String),
    /// The gateway was configured with an unusable endpoint.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl GatewayError {
    /// The single human-readable line placed in the store's error slot.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Validation(message) => message.clone(),
            GatewayError::Transport(detail) => {
                format!("Could not reach the analysis service ({detail})")
            }
            GatewayError::Server { message, .. } => message.clone(),
            GatewayError::NotFound(message) => message.clone(),
            GatewayError::InvalidEndpoint(detail) => {
                format!("The analysis service address is invalid ({detail})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GatewayError;

    #[test]
    fn server_messages_are_surfaced_verbatim() {
        let err = GatewayError::Server {
            status: 500,
            message: "AI features are disabled".to_string(),
        };
        assert_eq!(err.user_message(), "AI features are disabled");
    }

    #[test]
    fn transport_messages_are_wrapped() {
        let err = GatewayError::Transport("connection refused".to_string());
        assert_eq!(
            err.user_message(),
            "Could not reach the analysis service (connection refused)"
        );
    }
}
