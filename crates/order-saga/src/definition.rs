use std::sync::Arc;

use common::Participant;
use saga_engine::Step;
use serde_json::json;

use crate::context::{OrderContextExt, fragment, response_field};

/// Builds the five-step order-fulfillment saga, in call order: order,
/// inventory, payment, shipping, notification. Endpoints, payload shape, and
/// response-merge keys follow the order-saga step table exactly; this is the
/// one place that table is encoded.
pub fn steps() -> Vec<Step> {
    vec![create_order(), reserve_inventory(), process_payment(), schedule_shipping(), send_notification()]
}

fn create_order() -> Step {
    Step::new(
        "create_order",
        Participant::Order,
        "/api/orders",
        "/api/orders/{order_id}/cancel",
        Arc::new(|ctx| {
            json!({
                "customer_id": ctx.customer_id(),
                "items": ctx.items(),
                "total_amount": ctx.total_amount(),
                "shipping_address": ctx.shipping_address(),
                "payment_method": ctx.payment_method(),
                "shipping_method": ctx.shipping_method(),
            })
        }),
        Arc::new(|resp, _ctx| fragment("order_id", response_field(resp, "order_id"))),
    )
}

fn reserve_inventory() -> Step {
    Step::new(
        "reserve_inventory",
        Participant::Inventory,
        "/api/inventory/reserve",
        "/api/inventory/release",
        Arc::new(|ctx| {
            json!({
                "order_id": ctx.order_id(),
                "items": ctx.items(),
            })
        }),
        Arc::new(|resp, _ctx| fragment("inventory_reservations", response_field(resp, "inventory_reservations"))),
    )
    // Inventory may reserve some items and refuse the rest in the same
    // response; the partial reservation must still be released even though
    // the step overall counts as a business refusal.
    .compensate_on_business_refusal()
}

fn process_payment() -> Step {
    Step::new(
        "process_payment",
        Participant::Payment,
        "/api/payments/process",
        "/api/payments/refund",
        Arc::new(|ctx| {
            json!({
                "order_id": ctx.order_id(),
                "customer_id": ctx.customer_id(),
                "total_amount": ctx.total_amount(),
                "payment_method": ctx.payment_method(),
            })
        }),
        Arc::new(|resp, _ctx| fragment("payment_id", response_field(resp, "payment_id"))),
    )
}

fn schedule_shipping() -> Step {
    Step::new(
        "schedule_shipping",
        Participant::Shipping,
        "/api/shipping/schedule",
        "/api/shipping/cancel",
        Arc::new(|ctx| {
            json!({
                "order_id": ctx.order_id(),
                "shipping_address": ctx.shipping_address(),
                "shipping_method": ctx.shipping_method(),
                "items": ctx.items(),
            })
        }),
        Arc::new(|resp, _ctx| {
            let mut merged = fragment("shipping_id", response_field(resp, "shipping_id"));
            merged.insert("tracking_number".to_string(), response_field(resp, "tracking_number"));
            merged
        }),
    )
}

fn send_notification() -> Step {
    Step::new(
        "send_notification",
        Participant::Notification,
        "/api/notifications/send",
        "/api/notifications/cancel",
        Arc::new(|ctx| {
            json!({
                "order_id": ctx.order_id(),
                "customer_id": ctx.customer_id(),
                "notification_type": "order_confirmation",
                "channels": ctx.channels(),
            })
        }),
        Arc::new(|resp, _ctx| fragment("notification_id", response_field(resp, "notification_id"))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_steps_in_spec_order() {
        let defs = steps();
        let participants: Vec<Participant> = defs.iter().map(|s| s.participant).collect();
        assert_eq!(
            participants,
            vec![
                Participant::Order,
                Participant::Inventory,
                Participant::Payment,
                Participant::Shipping,
                Participant::Notification,
            ]
        );
    }

    #[test]
    fn only_inventory_compensates_on_business_refusal() {
        let defs = steps();
        for step in &defs {
            let expected = step.participant == Participant::Inventory;
            assert_eq!(step.compensate_on_business_refusal, expected, "{}", step.name);
        }
    }

    #[test]
    fn order_compensation_endpoint_is_templated() {
        let defs = steps();
        assert_eq!(defs[0].compensation_endpoint, "/api/orders/{order_id}/cancel");
    }
}
