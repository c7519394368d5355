use std::cmp::Reverse;

use chrono::{DateTime, Duration, Utc};

use serde::Serialize;

use crate::lifecycle::{reminder_eligibility, OrderPolicy};
use crate::model::Order;

/// A `new` order with its derived place in line (1 = oldest)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingEntry {
    pub priority: usize,
    #[serde(flatten)]
    pub order: Order,
}

/// A recently ready order, annotated with whether the reminder action is available
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadyEntry {
    pub can_remind: bool,
    #[serde(flatten)]
    pub order: Order,
}

/// One guest's orders, as shown on their status page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuestOrders {
    pub pending: Vec<Order>,
    pub ready: Vec<Order>,
}

/// Orders waiting to be made, oldest first
pub fn pending_queue(orders: &[Order]) -> Vec<PendingEntry> {
    let mut pending: Vec<&Order> = orders.iter().filter(|o| !o.is_ready()).collect();
    pending.sort_by_key(|o| (o.created_at, o.id));

    pending
        .into_iter()
        .enumerate()
        .map(|(idx, order)| PendingEntry {
            priority: idx + 1,
            order: order.clone(),
        })
        .collect()
}

/// Whether a ready order is still inside the trailing window at `now`
pub fn is_recently_ready(order: &Order, now: DateTime<Utc>, window: Duration) -> bool {
    order
        .ready_since()
        .map_or(false, |ready_since| now - ready_since <= window)
}

/// Orders that became ready within the policy window, most recent first.
/// Entries age out as `now` moves on, without any change to the orders themselves.
pub fn recently_ready(orders: &[Order], now: DateTime<Utc>, policy: &OrderPolicy) -> Vec<ReadyEntry> {
    let mut ready: Vec<&Order> = orders
        .iter()
        .filter(|o| is_recently_ready(o, now, policy.ready_window))
        .collect();
    ready.sort_by_key(|o| Reverse(o.ready_since()));

    ready
        .into_iter()
        .map(|order| ReadyEntry {
            can_remind: reminder_eligibility(order, now, policy.reminder_cooldown).is_eligible(),
            order: order.clone(),
        })
        .collect()
}

/// Split one guest's orders into waiting (oldest first) and ready (latest first)
pub fn guest_orders(orders: &[Order]) -> GuestOrders {
    let pending = pending_queue(orders).into_iter().map(|e| e.order).collect();

    let mut ready: Vec<Order> = orders.iter().filter(|o| o.is_ready()).cloned().collect();
    ready.sort_by_key(|o| Reverse(o.ready_since()));

    GuestOrders { pending, ready }
}

/// Every order served so far, in arrival order
pub fn ready_log(orders: &[Order]) -> Vec<Order> {
    let mut ready: Vec<Order> = orders.iter().filter(|o| o.is_ready()).cloned().collect();
    ready.sort_by_key(|o| (o.created_at, o.id));
    ready
}
