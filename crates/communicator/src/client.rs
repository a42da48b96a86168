use std::collections::HashMap;
use std::time::Duration;

use common::Participant;
use serde::Serialize;

use crate::discovery::{DiscoveryOverrides, ParticipantDescriptor, discover_all};
use crate::error::CommError;
use crate::retry::RetryPolicy;

/// HTTP method a saga step call is made with. Health probes always use GET;
/// action and compensation calls always use POST per the wire format in §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        }
    }
}

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Resilient request/response channel to the five saga participants.
///
/// Holds one shared `reqwest::Client` (itself internally connection-pooled
/// and cheap to clone) plus the descriptors resolved once at construction
/// time. Never panics or unwinds across its API boundary — every failure
/// mode is a returned [`CommError`].
#[derive(Clone)]
pub struct ServiceCommunicator {
    http: reqwest::Client,
    descriptors: HashMap<Participant, ParticipantDescriptor>,
    retry_policy: RetryPolicy,
    default_timeout: Duration,
}

impl ServiceCommunicator {
    /// Builds a communicator, resolving every participant's address via
    /// [`discover_all`].
    pub fn new(
        overrides: DiscoveryOverrides,
        retry_policy: RetryPolicy,
        default_timeout: Duration,
    ) -> Self {
        let descriptors = discover_all(&overrides)
            .into_iter()
            .map(|d| (d.name, d))
            .collect();

        Self {
            http: reqwest::Client::new(),
            descriptors,
            retry_policy,
            default_timeout,
        }
    }

    /// Builds a communicator from pre-resolved descriptors, bypassing env
    /// var / hostname-convention discovery. Used by tests to point at an
    /// in-process mock participant.
    pub fn with_descriptors(
        descriptors: Vec<ParticipantDescriptor>,
        retry_policy: RetryPolicy,
        default_timeout: Duration,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            descriptors: descriptors.into_iter().map(|d| (d.name, d)).collect(),
            retry_policy,
            default_timeout,
        }
    }

    /// Sends a single request/response exchange to `participant`, retrying
    /// per the configured [`RetryPolicy`].
    #[tracing::instrument(skip(self, body), fields(%participant, endpoint))]
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        participant: Participant,
        endpoint: &str,
        method: HttpMethod,
        body: Option<&B>,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value, CommError> {
        let descriptor = self
            .descriptors
            .get(&participant)
            .ok_or_else(|| CommError::UnknownParticipant(participant.to_string()))?;

        let timeout = timeout.unwrap_or(self.default_timeout);
        let max_attempts = self.retry_policy.max_attempts;

        for attempt in 1..=max_attempts {
            let delay = self.retry_policy.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            metrics::counter!("communicator_requests_total").increment(1);
            let started = std::time::Instant::now();
            let outcome = self
                .try_once(descriptor, endpoint, method, body, timeout)
                .await;
            metrics::histogram!("communicator_request_duration_seconds")
                .record(started.elapsed().as_secs_f64());

            match outcome {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.is_retryable() {
                        tracing::warn!(attempt, error = %err, "non-retryable communicator error");
                        return Err(err);
                    }
                    tracing::debug!(attempt, max_attempts, error = %err, "retryable communicator error");
                    if attempt == max_attempts {
                        metrics::counter!("communicator_retries_exhausted_total").increment(1);
                        return Err(CommError::RetriesExhausted {
                            participant: participant.to_string(),
                            attempts: max_attempts,
                        });
                    }
                    metrics::counter!("communicator_retries_total").increment(1);
                }
            }
        }

        unreachable!("loop always returns on the final attempt")
    }

    async fn try_once<B: Serialize + ?Sized>(
        &self,
        descriptor: &ParticipantDescriptor,
        endpoint: &str,
        method: HttpMethod,
        body: Option<&B>,
        timeout: Duration,
    ) -> Result<serde_json::Value, CommError> {
        let url = descriptor.url_for(endpoint);
        let mut request = self
            .http
            .request(method.into(), &url)
            .timeout(timeout);

        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_send_error(descriptor, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CommError::BadStatus {
                participant: descriptor.name.to_string(),
                code: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CommError::DecodeError {
                participant: descriptor.name.to_string(),
                detail: e.to_string(),
            })?;

        if bytes.is_empty() {
            return Err(CommError::DecodeError {
                participant: descriptor.name.to_string(),
                detail: "empty response body".to_string(),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| CommError::DecodeError {
            participant: descriptor.name.to_string(),
            detail: e.to_string(),
        })
    }

    /// Sends a GET to the participant's health endpoint with a short
    /// timeout; returns `true` iff the response status is 2xx.
    #[tracing::instrument(skip(self), fields(%participant))]
    pub async fn probe_health(&self, participant: Participant) -> bool {
        let Some(descriptor) = self.descriptors.get(&participant) else {
            return false;
        };

        let url = descriptor.url_for(descriptor.health_path);
        match self
            .http
            .get(&url)
            .timeout(HEALTH_PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Probes every participant concurrently and returns reachability per name.
    pub async fn probe_all(&self) -> HashMap<Participant, bool> {
        let checks = Participant::ALL
            .iter()
            .map(|&p| async move { (p, self.probe_health(p).await) });
        futures_util::future::join_all(checks).await.into_iter().collect()
    }
}

fn classify_send_error(
    descriptor: &ParticipantDescriptor,
    timeout: Duration,
    err: reqwest::Error,
) -> CommError {
    if err.is_timeout() {
        CommError::Timeout {
            participant: descriptor.name.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        CommError::ConnectFailed {
            participant: descriptor.name.to_string(),
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_method_maps_to_reqwest_method() {
        assert_eq!(reqwest::Method::from(HttpMethod::Get), reqwest::Method::GET);
        assert_eq!(reqwest::Method::from(HttpMethod::Post), reqwest::Method::POST);
        assert_eq!(reqwest::Method::from(HttpMethod::Put), reqwest::Method::PUT);
    }

    #[tokio::test]
    async fn unknown_participant_is_rejected_before_any_network_call() {
        let communicator = ServiceCommunicator::with_descriptors(
            vec![],
            RetryPolicy::default(),
            Duration::from_secs(1),
        );

        let err = communicator
            .send::<()>(Participant::Order, "/api/orders", HttpMethod::Post, None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, CommError::UnknownParticipant(_)));
    }

    #[tokio::test]
    async fn probe_health_returns_false_for_unresolvable_participant() {
        let communicator = ServiceCommunicator::with_descriptors(
            vec![],
            RetryPolicy::default(),
            Duration::from_secs(1),
        );
        assert!(!communicator.probe_health(Participant::Payment).await);
    }
}
