use chrono::{DateTime, Duration, Utc};

use uuid::Uuid;

use crate::repo::OrderStore;

mod dispatch;
mod reminder;
mod transition;

pub use dispatch::{Delivery, Notifier};
pub use reminder::{
    reminder_eligibility, send_reminder, RemindError, ReminderEligibility, ReminderOutcome,
};
pub use transition::{mark_ready, LifecycleError, ReadyTransition};

/// Wait after `ready_at` before a reminder may be sent
pub const REMINDER_COOLDOWN_MINUTES: i64 = 10;
/// How long a ready order stays on the recently-ready list
pub const READY_WINDOW_MINUTES: i64 = 15;

/// Time-based rules for reminders and the recently-ready view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderPolicy {
    pub reminder_cooldown: Duration,
    pub ready_window: Duration,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self {
            reminder_cooldown: Duration::minutes(REMINDER_COOLDOWN_MINUTES),
            ready_window: Duration::minutes(READY_WINDOW_MINUTES),
        }
    }
}

/// Result of marking an order ready and notifying the guest
#[derive(Debug)]
pub struct ReadyOutcome {
    pub transition: ReadyTransition,
    /// `None` when this call was not the one that made the order ready
    pub delivery: Option<Delivery>,
}

/// Mark an order ready and, only if this call won the transition, text the guest.
/// A failed send never undoes readiness.
#[tracing::instrument(name = "Complete order", skip(store, notifier))]
pub async fn complete_order(
    store: &impl OrderStore,
    notifier: &Notifier,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<ReadyOutcome, LifecycleError> {
    let transition = mark_ready(store, id, now).await?;

    let delivery = match &transition {
        ReadyTransition::Advanced(order) => Some(notifier.notify_ready(order).await),
        ReadyTransition::Backfilled(_) | ReadyTransition::AlreadyReady(_) => None,
    };

    Ok(ReadyOutcome {
        transition,
        delivery,
    })
}
