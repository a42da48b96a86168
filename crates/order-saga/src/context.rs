use saga_engine::SagaContext;
use serde_json::{Map, Value, json};

use crate::request::OrderRequest;

/// Builds the saga's initial shared context from the inbound order request.
/// Every field the five steps' payload builders read comes from here.
pub fn initial_context(request: &OrderRequest) -> SagaContext {
    let value = serde_json::to_value(request).unwrap_or_else(|_| json!({}));
    SagaContext::from(value)
}

/// Compile-time-checked accessors over the order-fulfillment saga's shared
/// context, for the keys enumerated in the saga's step table. The engine
/// itself stays untyped (`SagaContext` is a bare JSON object); this trait is
/// the typed record the design notes call for, layered on top rather than
/// baked into the generic engine.
pub trait OrderContextExt {
    fn order_id(&self) -> Option<String>;
    fn customer_id(&self) -> Option<String>;
    fn items(&self) -> Option<&Value>;
    fn total_amount(&self) -> Option<f64>;
    fn shipping_address(&self) -> Option<&Value>;
    fn payment_method(&self) -> Option<String>;
    fn shipping_method(&self) -> Option<String>;
    fn channels(&self) -> Option<&Value>;
    fn inventory_reservations(&self) -> Option<&Value>;
    fn payment_id(&self) -> Option<String>;
    fn shipping_id(&self) -> Option<String>;
    fn tracking_number(&self) -> Option<String>;
    fn notification_id(&self) -> Option<String>;
}

impl OrderContextExt for SagaContext {
    fn order_id(&self) -> Option<String> {
        string_field(self, "order_id")
    }

    fn customer_id(&self) -> Option<String> {
        string_field(self, "customer_id")
    }

    fn items(&self) -> Option<&Value> {
        self.get("items")
    }

    fn total_amount(&self) -> Option<f64> {
        self.get("total_amount").and_then(Value::as_f64)
    }

    fn shipping_address(&self) -> Option<&Value> {
        self.get("shipping_address")
    }

    fn payment_method(&self) -> Option<String> {
        string_field(self, "payment_method")
    }

    fn shipping_method(&self) -> Option<String> {
        string_field(self, "shipping_method")
    }

    fn channels(&self) -> Option<&Value> {
        self.get("channels")
    }

    fn inventory_reservations(&self) -> Option<&Value> {
        self.get("inventory_reservations")
    }

    fn payment_id(&self) -> Option<String> {
        string_field(self, "payment_id")
    }

    fn shipping_id(&self) -> Option<String> {
        string_field(self, "shipping_id")
    }

    fn tracking_number(&self) -> Option<String> {
        string_field(self, "tracking_number")
    }

    fn notification_id(&self) -> Option<String> {
        string_field(self, "notification_id")
    }
}

fn string_field(context: &SagaContext, key: &str) -> Option<String> {
    context.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Extracts a response field as an owned [`Value`], defaulting to `Null` so
/// a response merger never panics on a missing key — a malformed participant
/// response surfaces as a `null` identifier downstream, not a crash.
pub fn response_field(response: &Value, key: &str) -> Value {
    response.get(key).cloned().unwrap_or(Value::Null)
}

/// Convenience for building a one-entry response fragment.
pub fn fragment(key: &str, value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{LineItem, OrderRequest};

    fn sample_request() -> OrderRequest {
        OrderRequest {
            customer_id: "c-1".to_string(),
            items: vec![LineItem {
                product_id: "p-1".to_string(),
                quantity: 2,
                unit_price: 99.99,
            }],
            total_amount: 199.98,
            shipping_address: json!({"line1": "1 Market St"}),
            payment_method: "CREDIT_CARD".to_string(),
            shipping_method: "STANDARD".to_string(),
            channels: vec!["email".to_string()],
        }
    }

    #[test]
    fn initial_context_exposes_request_fields() {
        let context = initial_context(&sample_request());
        assert_eq!(context.customer_id(), Some("c-1".to_string()));
        assert_eq!(context.total_amount(), Some(199.98));
        assert_eq!(context.payment_method(), Some("CREDIT_CARD".to_string()));
        assert!(context.order_id().is_none());
    }

    #[test]
    fn response_field_defaults_to_null() {
        let response = json!({"ok": true});
        assert_eq!(response_field(&response, "missing"), Value::Null);
    }
}
