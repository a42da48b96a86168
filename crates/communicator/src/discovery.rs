use std::collections::HashMap;

use common::Participant;

/// The resolved, immutable address of one participant.
///
/// Constructed once at communicator startup (§6 "Discovery is resolved once
/// at communicator construction; the communicator does not re-resolve
/// between calls").
#[derive(Debug, Clone)]
pub struct ParticipantDescriptor {
    pub name: Participant,
    pub base_url: String,
    pub health_path: &'static str,
}

impl ParticipantDescriptor {
    pub fn new(name: Participant, base_url: impl Into<String>) -> Self {
        Self {
            name,
            base_url: base_url.into(),
            health_path: "/health",
        }
    }

    /// Joins a relative endpoint path onto this participant's base address.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

/// Overrides for participant discovery, checked before environment
/// variables and the hostname convention.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOverrides {
    explicit: HashMap<Participant, String>,
    /// When set, the hostname-convention fallback uses `localhost` instead
    /// of `<participant>-service`.
    pub local_dev: bool,
}

impl DiscoveryOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, participant: Participant, base_url: impl Into<String>) -> Self {
        self.explicit.insert(participant, base_url.into());
        self
    }

    pub fn local_dev(mut self, enabled: bool) -> Self {
        self.local_dev = enabled;
        self
    }
}

/// Resolves the base address for every participant, in precedence order:
/// (a) an explicit override, (b) the `<PARTICIPANT>_SERVICE_URL` environment
/// variable, (c) the `http://<participant>-service:<port>` convention
/// (or `http://localhost:<port>` in local-dev mode).
pub fn discover_all(overrides: &DiscoveryOverrides) -> Vec<ParticipantDescriptor> {
    Participant::ALL
        .iter()
        .map(|&p| ParticipantDescriptor::new(p, discover_one(p, overrides)))
        .collect()
}

fn discover_one(participant: Participant, overrides: &DiscoveryOverrides) -> String {
    if let Some(explicit) = overrides.explicit.get(&participant) {
        return explicit.clone();
    }

    if let Ok(from_env) = std::env::var(participant.env_var()) {
        if !from_env.is_empty() {
            return from_env;
        }
    }

    let host = if overrides.local_dev {
        "localhost".to_string()
    } else {
        format!("{}-service", participant.as_str())
    };
    format!("http://{host}:{port}", port = participant.default_port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_override_wins() {
        let overrides =
            DiscoveryOverrides::new().with_override(Participant::Payment, "http://test:1234");
        assert_eq!(discover_one(Participant::Payment, &overrides), "http://test:1234");
    }

    #[test]
    fn convention_hostname_uses_default_port() {
        let overrides = DiscoveryOverrides::new();
        // SAFETY: test runs single-threaded within this process's env scope via serial test ordering
        std::env::remove_var(Participant::Inventory.env_var());
        assert_eq!(
            discover_one(Participant::Inventory, &overrides),
            "http://inventory-service:8001"
        );
    }

    #[test]
    fn local_dev_swaps_host_for_localhost() {
        let overrides = DiscoveryOverrides::new().local_dev(true);
        std::env::remove_var(Participant::Shipping.env_var());
        assert_eq!(
            discover_one(Participant::Shipping, &overrides),
            "http://localhost:8003"
        );
    }

    #[test]
    fn url_for_joins_base_and_endpoint() {
        let descriptor = ParticipantDescriptor::new(Participant::Order, "http://order-service:8000/");
        assert_eq!(
            descriptor.url_for("/api/orders"),
            "http://order-service:8000/api/orders"
        );
    }

    #[test]
    fn discover_all_covers_every_participant() {
        let descriptors = discover_all(&DiscoveryOverrides::new());
        assert_eq!(descriptors.len(), 5);
    }
}
