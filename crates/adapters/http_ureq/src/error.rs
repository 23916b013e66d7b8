//! HTTP adapter error types.

use presence_domain::error::PresenceError;

/// Errors specific to the HTTP adapter.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// Connection, TLS, timeout or protocol failure.
    #[error("request failed: {0}")]
    Request(#[source] ureq::Error),

    /// The API answered with a non-2xx status.
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// The blocking request task panicked or was cancelled.
    #[error("request task failed")]
    Join(#[from] tokio::task::JoinError),
}

impl From<ureq::Error> for HttpError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Status(code),
            other => Self::Request(other),
        }
    }
}

impl From<HttpError> for PresenceError {
    fn from(err: HttpError) -> Self {
        PresenceError::Transport(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_status_code_error_to_status() {
        let err: HttpError = ureq::Error::StatusCode(503).into();
        assert!(matches!(err, HttpError::Status(503)));
        assert_eq!(err.to_string(), "upstream returned HTTP 503");
    }

    #[test]
    fn should_convert_into_transport_error() {
        let err: PresenceError = HttpError::Status(401).into();
        assert!(matches!(err, PresenceError::Transport(_)));
        assert_eq!(
            err.to_string(),
            "transport error: upstream returned HTTP 401"
        );
    }
}
