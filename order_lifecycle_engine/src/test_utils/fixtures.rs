use chrono::Utc;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType},
    webhook::ShippingEvent,
    MemoryDatabase,
};

/// Two widgets at 10.00 and one gadget at 5.00. The total is 25.00.
pub fn sample_new_order() -> NewOrder {
    NewOrder::new("cust-42", vec![OrderItem::new("widget", 2, 10.0), OrderItem::new("gadget", 1, 5.0)])
}

/// Seeds `db` with a copy of the sample order in the given status and returns it.
pub async fn seed_order(db: &MemoryDatabase, order_id: &str, status: OrderStatusType) -> Order {
    let mut order = Order::from_new_order(OrderId::from(order_id), sample_new_order(), Utc::now());
    order.status = status;
    db.insert_order(order.clone()).await;
    order
}

pub fn shipping_event(order_id: &str, shipment_id: &str, status: &str) -> ShippingEvent {
    ShippingEvent {
        shipment_id: shipment_id.to_string(),
        order_id: order_id.to_string(),
        event_type: "status_update".to_string(),
        status: status.to_string(),
        details: None,
        timestamp: 1_700_000_000,
    }
}

pub fn shipping_event_body(order_id: &str, shipment_id: &str, status: &str) -> Vec<u8> {
    serde_json::to_vec(&shipping_event(order_id, shipment_id, status)).unwrap_or_default()
}
