//! Backend error types.

use thiserror::Error;

use quizreport_core::error::ReportError;

/// Errors raised while talking to a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// A response or file could not be decoded.
    #[error("invalid data: {0}")]
    Decode(String),

    /// A local file operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// HTTP-style status for the failure, if one applies.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Http { status, .. } => Some(*status),
            StoreError::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// Classify as a failed read of `resource`.
    pub fn into_fetch(self, resource: impl Into<String>) -> ReportError {
        let status = self.status();
        ReportError::data_fetch(resource, status, self.to_string())
    }

    /// Classify as a failed write of `resource`.
    pub fn into_persist(self, resource: impl Into<String>) -> ReportError {
        ReportError::persist(resource, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_classification_keeps_status() {
        let err = StoreError::Http {
            status: 503,
            message: "maintenance".into(),
        }
        .into_fetch("quiz q1");
        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("maintenance"));

        let err = StoreError::NotFound("templates/q1.json".into()).into_fetch("template q1");
        assert!(err.is_not_found());
    }

    #[test]
    fn persist_classification() {
        let err = StoreError::Timeout(30).into_persist("packet p1");
        assert!(matches!(err, ReportError::Persist { .. }));
        assert!(err.to_string().contains("timed out after 30s"));
    }
}
