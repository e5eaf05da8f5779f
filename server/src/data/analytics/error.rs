//! Analytics transport errors

use thiserror::Error;

/// Maximum bytes of an error response body kept for diagnostics
pub(crate) const MAX_ERROR_BODY: usize = 1024;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Connection, timeout or protocol failure
    #[error("Analytics request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status from the query service
    #[error("Analytics service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not a JSON array of rows
    #[error("Unexpected analytics response: {0}")]
    Decode(String),
}

impl AnalyticsError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = AnalyticsError::Status {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_transient());

        let err = AnalyticsError::Status {
            status: 429,
            body: String::new(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn client_errors_are_permanent() {
        let err = AnalyticsError::Status {
            status: 400,
            body: "syntax error at or near WHERE".to_string(),
        };
        assert!(!err.is_transient());
        assert!(!AnalyticsError::Decode("not an array".to_string()).is_transient());
    }
}
