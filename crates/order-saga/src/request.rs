use serde::{Deserialize, Serialize};

/// The inbound request that starts an order-fulfillment saga, accepted at
/// `POST /api/coordinator/orders`.
///
/// Shipping address is kept as an opaque JSON object — the coordinator never
/// inspects its fields, only forwards it to the order and shipping
/// participants, so there is nothing to gain from typing it further here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer_id: String,
    pub items: Vec<LineItem>,
    pub total_amount: f64,
    pub shipping_address: serde_json::Value,
    pub payment_method: String,
    pub shipping_method: String,
    /// Notification channels, e.g. `["email", "sms"]`. Defaults to email
    /// only when omitted.
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
}

fn default_channels() -> Vec<String> {
    vec!["email".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_default_to_email_when_omitted() {
        let json = serde_json::json!({
            "customer_id": "c-1",
            "items": [{"product_id": "p-1", "quantity": 2, "unit_price": 9.99}],
            "total_amount": 19.98,
            "shipping_address": {"line1": "1 Market St"},
            "payment_method": "CREDIT_CARD",
            "shipping_method": "STANDARD",
        });
        let request: OrderRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.channels, vec!["email".to_string()]);
    }
}
