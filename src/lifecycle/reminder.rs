use chrono::{DateTime, Duration, Utc};

use thiserror::Error;

use uuid::Uuid;

use crate::lifecycle::{Delivery, Notifier, OrderPolicy};
use crate::model::Order;
use crate::repo::OrderStore;

/// Whether a single follow-up message may be sent for an order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReminderEligibility {
    Eligible,
    /// The drink has not been made yet
    NotReady,
    /// The one permitted reminder has already gone out
    AlreadyReminded,
    /// Ready, but the cooldown since `ready_at` has not elapsed
    CoolingDown { remaining: Duration },
}

impl ReminderEligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Evaluate the reminder rules for `order` at `now`
pub fn reminder_eligibility(
    order: &Order,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> ReminderEligibility {
    let ready_since = match order.ready_since() {
        Some(ready_since) => ready_since,
        None => return ReminderEligibility::NotReady,
    };

    if order.reminded_at.is_some() {
        return ReminderEligibility::AlreadyReminded;
    }

    let elapsed = now - ready_since;
    if elapsed < cooldown {
        return ReminderEligibility::CoolingDown {
            remaining: cooldown - elapsed,
        };
    }

    ReminderEligibility::Eligible
}

/// A reminder attempt that passed the eligibility rules
#[derive(Debug)]
pub struct ReminderOutcome {
    /// The order as stored after the attempt
    pub order: Order,
    pub delivery: Delivery,
}

#[derive(Debug, Error)]
pub enum RemindError {
    #[error("Order {0} not found")]
    NotFound(Uuid),

    #[error("Order is not eligible for a reminder: {0:?}")]
    Ineligible(ReminderEligibility),

    #[error(transparent)]
    DatabaseError(#[from] sqlx::Error),
}

/// Send the one permitted reminder for a ready order.
///
/// The reminder is claimed with a conditional write before sending, and the
/// claim is released again unless the gateway accepts the message, so at rest
/// `reminded_at` is only set after a confirmed send.
#[tracing::instrument(name = "Send order reminder", skip(store, notifier, policy))]
pub async fn send_reminder(
    store: &impl OrderStore,
    notifier: &Notifier,
    policy: &OrderPolicy,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<ReminderOutcome, RemindError> {
    let order = store
        .fetch_order(id)
        .await?
        .ok_or(RemindError::NotFound(id))?;

    let eligibility = reminder_eligibility(&order, now, policy.reminder_cooldown);
    if !eligibility.is_eligible() {
        return Err(RemindError::Ineligible(eligibility));
    }

    if !notifier.is_enabled() {
        let delivery = notifier.notify_reminder(&order).await;
        return Ok(ReminderOutcome { order, delivery });
    }

    let claimed = match store
        .claim_reminder(id, now, now - policy.reminder_cooldown)
        .await?
    {
        Some(claimed) => claimed,
        None => return Err(lost_claim(store, id, now, policy).await),
    };

    let delivery = notifier.notify_reminder(&claimed).await;
    if delivery.is_sent() {
        return Ok(ReminderOutcome {
            order: claimed,
            delivery,
        });
    }

    if !store.release_reminder(id, now).await? {
        tracing::warn!("Reminder claim for order {} was already released", id);
    }

    Ok(ReminderOutcome {
        order: Order {
            reminded_at: None,
            ..claimed
        },
        delivery,
    })
}

/// Explain why a claim that passed the read-time check did not take effect
async fn lost_claim(
    store: &impl OrderStore,
    id: Uuid,
    now: DateTime<Utc>,
    policy: &OrderPolicy,
) -> RemindError {
    match store.fetch_order(id).await {
        Ok(Some(order)) => match reminder_eligibility(&order, now, policy.reminder_cooldown) {
            // Raced with another reminder that has since been released
            ReminderEligibility::Eligible => {
                RemindError::Ineligible(ReminderEligibility::AlreadyReminded)
            }
            other => RemindError::Ineligible(other),
        },
        Ok(None) => RemindError::NotFound(id),
        Err(error) => RemindError::DatabaseError(error),
    }
}
