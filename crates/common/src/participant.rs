use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the five external services the saga orchestrator talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Participant {
    Order,
    Inventory,
    Payment,
    Shipping,
    Notification,
}

impl Participant {
    /// All participants, in the order the order-fulfillment saga calls them.
    pub const ALL: [Participant; 5] = [
        Participant::Order,
        Participant::Inventory,
        Participant::Payment,
        Participant::Shipping,
        Participant::Notification,
    ];

    /// Lowercase name used in env var prefixes, convention hostnames, and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Participant::Order => "order",
            Participant::Inventory => "inventory",
            Participant::Payment => "payment",
            Participant::Shipping => "shipping",
            Participant::Notification => "notification",
        }
    }

    /// The `<PARTICIPANT>_SERVICE_URL` environment variable name for this participant.
    pub fn env_var(&self) -> String {
        format!("{}_SERVICE_URL", self.as_str().to_uppercase())
    }

    /// Default port under the `http://<participant>-service:<port>` convention.
    pub fn default_port(&self) -> u16 {
        match self {
            Participant::Order => 8000,
            Participant::Inventory => 8001,
            Participant::Payment => 8002,
            Participant::Shipping => 8003,
            Participant::Notification => 8004,
        }
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string does not name a known participant.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown participant: {0}")]
pub struct ParticipantParseError(pub String);

impl std::str::FromStr for Participant {
    type Err = ParticipantParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order" => Ok(Participant::Order),
            "inventory" => Ok(Participant::Inventory),
            "payment" => Ok(Participant::Payment),
            "shipping" => Ok(Participant::Shipping),
            "notification" => Ok(Participant::Notification),
            other => Err(ParticipantParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        for p in Participant::ALL {
            let parsed: Participant = p.to_string().parse().unwrap();
            assert_eq!(parsed, p);
        }
    }

    #[test]
    fn env_var_follows_convention() {
        assert_eq!(Participant::Inventory.env_var(), "INVENTORY_SERVICE_URL");
    }

    #[test]
    fn default_ports_match_spec() {
        assert_eq!(Participant::Order.default_port(), 8000);
        assert_eq!(Participant::Notification.default_port(), 8004);
    }

    #[test]
    fn rejects_unknown_name() {
        assert!("carrier".parse::<Participant>().is_err());
    }
}
