use thiserror::Error;

/// Errors a `ServiceCommunicator` call can fail with.
///
/// Only `Timeout`, `ConnectFailed`, and `BadStatus` with a 5xx code are
/// retryable; everything else is surfaced to the caller on the first
/// occurrence. See [`CommError::is_retryable`].
#[derive(Debug, Error, Clone)]
pub enum CommError {
    /// The participant name does not resolve to a known descriptor.
    #[error("unknown participant: {0}")]
    UnknownParticipant(String),

    /// The TCP connection to the participant could not be established.
    #[error("failed to connect to {participant}: {detail}")]
    ConnectFailed { participant: String, detail: String },

    /// The request did not complete within the configured timeout.
    #[error("request to {participant} timed out after {timeout_ms}ms")]
    Timeout { participant: String, timeout_ms: u64 },

    /// The participant responded with a non-2xx status.
    #[error("{participant} responded with status {code}")]
    BadStatus { participant: String, code: u16 },

    /// The response body was missing or not valid JSON.
    #[error("failed to decode response from {participant}: {detail}")]
    DecodeError { participant: String, detail: String },

    /// All configured retry attempts were exhausted.
    #[error("retries exhausted calling {participant} ({attempts} attempts)")]
    RetriesExhausted { participant: String, attempts: u32 },
}

impl CommError {
    /// Returns the participant name this error is about, if any.
    pub fn participant(&self) -> Option<&str> {
        match self {
            CommError::UnknownParticipant(p) => Some(p),
            CommError::ConnectFailed { participant, .. }
            | CommError::Timeout { participant, .. }
            | CommError::BadStatus { participant, .. }
            | CommError::DecodeError { participant, .. }
            | CommError::RetriesExhausted { participant, .. } => Some(participant),
        }
    }

    /// Whether a fresh attempt could plausibly succeed where this one failed.
    ///
    /// Network connect failures, timeouts, and 5xx statuses are retryable.
    /// 4xx statuses, decode failures, and unknown participants are not —
    /// retrying them would only repeat the same outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CommError::ConnectFailed { .. } | CommError::Timeout { .. }
        ) || matches!(self, CommError::BadStatus { code, .. } if *code >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_failed_and_timeout_are_retryable() {
        assert!(
            CommError::ConnectFailed {
                participant: "payment".into(),
                detail: "refused".into()
            }
            .is_retryable()
        );
        assert!(
            CommError::Timeout {
                participant: "payment".into(),
                timeout_ms: 500
            }
            .is_retryable()
        );
    }

    #[test]
    fn server_errors_are_retryable_client_errors_are_not() {
        assert!(
            CommError::BadStatus {
                participant: "payment".into(),
                code: 503
            }
            .is_retryable()
        );
        assert!(
            !CommError::BadStatus {
                participant: "payment".into(),
                code: 404
            }
            .is_retryable()
        );
    }

    #[test]
    fn decode_and_unknown_participant_are_not_retryable() {
        assert!(
            !CommError::DecodeError {
                participant: "payment".into(),
                detail: "empty body".into()
            }
            .is_retryable()
        );
        assert!(!CommError::UnknownParticipant("carrier".into()).is_retryable());
    }
}
