use chrono::{DateTime, Utc};

use thiserror::Error;

use uuid::Uuid;

use crate::model::Order;
use crate::repo::OrderStore;

/// How a ready-transition request was resolved
#[derive(Debug, Clone, PartialEq)]
pub enum ReadyTransition {
    /// This call moved the order from `new` to `ready`
    Advanced(Order),
    /// Already ready but missing `ready_at`, which this call filled in
    Backfilled(Order),
    /// Already ready, nothing changed
    AlreadyReady(Order),
}

impl ReadyTransition {
    pub fn order(&self) -> &Order {
        match self {
            Self::Advanced(order) | Self::Backfilled(order) | Self::AlreadyReady(order) => order,
        }
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Order {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    DatabaseError(#[from] sqlx::Error),
}

/// Move an order to `ready` at most once.
///
/// Losing the conditional write is not an error: the order is already ready,
/// and a legacy row without `ready_at` gets it backfilled instead.
#[tracing::instrument(name = "Mark order ready", skip(store))]
pub async fn mark_ready(
    store: &impl OrderStore,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<ReadyTransition, LifecycleError> {
    if let Some(order) = store.mark_ready_if_new(id, now).await? {
        return Ok(ReadyTransition::Advanced(order));
    }

    let order = store
        .fetch_order(id)
        .await?
        .ok_or(LifecycleError::NotFound(id))?;

    if order.ready_at.is_some() {
        return Ok(ReadyTransition::AlreadyReady(order));
    }

    match store.backfill_ready_at(id, now).await? {
        Some(order) => {
            tracing::info!("Backfilled missing ready_at for order {}", id);
            Ok(ReadyTransition::Backfilled(order))
        }
        // Healed concurrently by another caller
        None => store
            .fetch_order(id)
            .await?
            .map(ReadyTransition::AlreadyReady)
            .ok_or(LifecycleError::NotFound(id)),
    }
}
