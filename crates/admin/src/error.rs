use folio_core::session::SessionError;
use folio_core::wire::RecordFailure;

/// Failures of a single call to the content API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No response was received (connection refused, DNS, TLS, timeout).
    #[error("Could not reach server: {0}")]
    Unreachable(String),

    /// The server answered with a non-success status.
    #[error("Server rejected the request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the raw body.
        message: String,
    },

    /// The server answered 2xx with a body that could not be parsed.
    #[error("Malformed server response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Malformed(err.to_string())
        } else {
            TransportError::Unreachable(err.to_string())
        }
    }
}

/// Failures surfaced by the edit reconciler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// Transport failure; retry by re-triggering the action.
    #[error("Could not reach server: {0}")]
    Fetch(String),

    /// The server rejected field values.
    #[error("{0}")]
    Validation(String),

    /// The target no longer exists on the server.
    #[error("{0}")]
    NotFound(String),

    /// Any other application-level failure (conflict, server error,
    /// `success: false` without details).
    #[error("Request failed ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// A response arrived but could not be understood.
    #[error("Unexpected server response: {0}")]
    Malformed(String),

    /// The server applied part of a bulk update and listed the rest.
    #[error("{} record(s) could not be saved", .0.len())]
    PartialBatch(Vec<RecordFailure>),

    /// A local operation on the edit session failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ReconcileError {
    /// Whether no response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, ReconcileError::Fetch(_))
    }
}

impl From<TransportError> for ReconcileError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unreachable(msg) => ReconcileError::Fetch(msg),
            TransportError::Malformed(msg) => ReconcileError::Malformed(msg),
            TransportError::Rejected { status: 400, message } => {
                ReconcileError::Validation(message)
            }
            TransportError::Rejected { status: 404, message } => ReconcileError::NotFound(message),
            TransportError::Rejected { status, message } => {
                ReconcileError::Rejected { status, message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_transport_errors_map_to_taxonomy() {
        assert!(ReconcileError::from(TransportError::Unreachable("refused".into())).is_transport());
        assert_matches!(
            ReconcileError::from(TransportError::Rejected {
                status: 400,
                message: "title is required".into()
            }),
            ReconcileError::Validation(msg) if msg == "title is required"
        );
        assert_matches!(
            ReconcileError::from(TransportError::Rejected {
                status: 404,
                message: "gone".into()
            }),
            ReconcileError::NotFound(_)
        );
        assert_matches!(
            ReconcileError::from(TransportError::Rejected {
                status: 409,
                message: "in use".into()
            }),
            ReconcileError::Rejected { status: 409, .. }
        );
        assert!(!ReconcileError::from(TransportError::Malformed("x".into())).is_transport());
    }
}
