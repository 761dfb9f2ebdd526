//! Error types for scoring, scale configuration, templates and report generation.
//!
//! Defined in `quizreport-core` so every backend and renderer reports failures
//! through the same vocabulary and callers can classify them without string
//! matching.

use thiserror::Error;

/// Errors that abort a report operation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A required upstream read failed or returned a non-success status.
    #[error("failed to fetch {resource}{}: {message}", status_suffix(.status))]
    DataFetch {
        resource: String,
        status: Option<u16>,
        message: String,
    },

    /// A scale failed validation and was not persisted.
    #[error("invalid score scale: {0}")]
    Validation(#[from] ScaleValidationError),

    /// A template edit could not be applied.
    #[error("invalid template edit: {0}")]
    Template(#[from] TemplateError),

    /// A write to the persistence collaborator failed.
    #[error("failed to persist {resource}: {message}")]
    Persist { resource: String, message: String },

    /// A drawing primitive failed and had no local fallback.
    #[error("rendering failed: {0}")]
    Rendering(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl ReportError {
    /// Shorthand for a [`ReportError::DataFetch`].
    pub fn data_fetch(
        resource: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        ReportError::DataFetch {
            resource: resource.into(),
            status,
            message: message.into(),
        }
    }

    /// Shorthand for a [`ReportError::Persist`].
    pub fn persist(resource: impl Into<String>, message: impl Into<String>) -> Self {
        ReportError::Persist {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if the upstream answered 404 for the requested resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReportError::DataFetch { status: Some(404), .. })
    }

    /// HTTP status carried by a fetch failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ReportError::DataFetch { status, .. } => *status,
            _ => None,
        }
    }
}

/// Reasons a score scale is rejected on save.
///
/// Only per-range bounds are checked. Gaps and overlaps between ranges are
/// accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScaleValidationError {
    /// A range has `min > max`.
    #[error("range {index} ({label:?}) has min {min} greater than max {max}")]
    InvertedRange {
        index: usize,
        label: String,
        min: i64,
        max: i64,
    },

    /// A pending edit addressed a range that does not exist.
    #[error("range index {index} is out of bounds for a scale of {len} ranges")]
    RangeOutOfBounds { index: usize, len: usize },

    /// A pending edit could not be parsed.
    #[error("invalid range edit {0:?}, expected index.field=value")]
    InvalidEdit(String),
}

/// Reasons a template edit is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The edit path does not name a known field.
    #[error("unknown template field: {0}")]
    UnknownField(String),

    /// The value could not be parsed for the addressed field.
    #[error("invalid value {value:?} for {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// The edit string is not of the form `path=value`.
    #[error("malformed edit {0:?}, expected path=value")]
    Malformed(String),

    /// A packet config was addressed that the template does not hold.
    #[error("no packet config for packet {0}")]
    UnknownPacket(String),

    /// A version id was not found in the template history.
    #[error("no template version {0}")]
    UnknownVersion(String),
}

/// Convenience alias used across the core crate.
pub type Result<T, E = ReportError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_fetch_display_includes_status() {
        let err = ReportError::data_fetch("quiz q1", Some(503), "service unavailable");
        assert_eq!(
            err.to_string(),
            "failed to fetch quiz q1 (HTTP 503): service unavailable"
        );
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_not_found());
    }

    #[test]
    fn data_fetch_without_status() {
        let err = ReportError::data_fetch("attempt a1", None, "connection refused");
        assert_eq!(err.to_string(), "failed to fetch attempt a1: connection refused");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn validation_converts_from_scale_error() {
        let err: ReportError = ScaleValidationError::InvertedRange {
            index: 1,
            label: "Average".into(),
            min: 8,
            max: 4,
        }
        .into();
        assert!(matches!(err, ReportError::Validation(_)));
        assert!(err.to_string().contains("min 8 greater than max 4"));
    }
}
