use chrono::{DateTime, Utc};

use sqlx::{PgExecutor, PgPool};

use uuid::Uuid;

use crate::domain::OrderStatus;
use crate::model::{NewOrder, Order};

/// Repository for interfacing with the orders table.
///
/// Every state change is a conditional write: the predicate on current state is
/// the only concurrency guard, so each returns the updated row only when it won.
pub struct OrdersRepo;

impl OrdersRepo {
    #[tracing::instrument(name = "Insert order", skip(executor))]
    pub async fn insert<'con>(
        executor: impl PgExecutor<'con>,
        new_order: &NewOrder,
    ) -> sqlx::Result<Order> {
        sqlx::query_as::<_, Order>(
            "insert into orders(profile_id, name, phone, photo_url, drink_id, drink_name, status)
             values ($1, $2, $3, $4, $5, $6, 'new')
             returning *",
        )
        .bind(new_order.profile_id)
        .bind(&new_order.name)
        .bind(new_order.phone.as_ref())
        .bind(&new_order.photo_url)
        .bind(new_order.drink_id)
        .bind(&new_order.drink_name)
        .fetch_one(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch order by id", skip(executor))]
    pub async fn fetch_by_id<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<Order>> {
        sqlx::query_as::<_, Order>("select * from orders where id=$1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    #[tracing::instrument(name = "Fetch all orders", skip(executor))]
    pub async fn fetch_all<'con>(executor: impl PgExecutor<'con>) -> sqlx::Result<Vec<Order>> {
        sqlx::query_as::<_, Order>("select * from orders order by created_at asc, id asc")
            .fetch_all(executor)
            .await
    }

    #[tracing::instrument(name = "Fetch orders by status", skip(executor))]
    pub async fn fetch_by_status<'con>(
        executor: impl PgExecutor<'con>,
        status: OrderStatus,
    ) -> sqlx::Result<Vec<Order>> {
        sqlx::query_as::<_, Order>(
            "select * from orders where status=$1 order by created_at asc, id asc",
        )
        .bind(status)
        .fetch_all(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch orders by phone", skip(executor))]
    pub async fn fetch_by_phone<'con>(
        executor: impl PgExecutor<'con>,
        phone: &str,
    ) -> sqlx::Result<Vec<Order>> {
        sqlx::query_as::<_, Order>(
            "select * from orders where phone=$1 order by created_at asc, id asc",
        )
        .bind(phone)
        .fetch_all(executor)
        .await
    }

    /// Ready orders whose ready time is at or after `since`, most recent first
    #[tracing::instrument(name = "Fetch orders ready since", skip(executor))]
    pub async fn fetch_ready_since<'con>(
        executor: impl PgExecutor<'con>,
        since: DateTime<Utc>,
    ) -> sqlx::Result<Vec<Order>> {
        sqlx::query_as::<_, Order>(
            "select * from orders
             where status='ready' and coalesce(ready_at, created_at) >= $1
             order by coalesce(ready_at, created_at) desc, id asc",
        )
        .bind(since)
        .fetch_all(executor)
        .await
    }

    /// Advance `new` -> `ready`. `None` when the order is missing or no longer `new`.
    #[tracing::instrument(name = "Mark order ready if new", skip(executor))]
    pub async fn mark_ready_if_new<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        ready_at: DateTime<Utc>,
    ) -> sqlx::Result<Option<Order>> {
        sqlx::query_as::<_, Order>(
            "update orders set status='ready', ready_at=$2
             where id=$1 and status='new'
             returning *",
        )
        .bind(id)
        .bind(ready_at)
        .fetch_optional(executor)
        .await
    }

    /// Stamp `ready_at` on a ready order that is missing it
    #[tracing::instrument(name = "Backfill order ready_at", skip(executor))]
    pub async fn backfill_ready_at<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        ready_at: DateTime<Utc>,
    ) -> sqlx::Result<Option<Order>> {
        sqlx::query_as::<_, Order>(
            "update orders set ready_at=$2
             where id=$1 and status='ready' and ready_at is null
             returning *",
        )
        .bind(id)
        .bind(ready_at)
        .fetch_optional(executor)
        .await
    }

    /// Claim the single reminder for a ready order that became ready no later than `ready_before`.
    /// A legacy row missing `ready_at` gets `created_at` stamped in the same write.
    #[tracing::instrument(name = "Claim order reminder", skip(executor))]
    pub async fn claim_reminder<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        reminded_at: DateTime<Utc>,
        ready_before: DateTime<Utc>,
    ) -> sqlx::Result<Option<Order>> {
        sqlx::query_as::<_, Order>(
            "update orders set reminded_at=$2, ready_at=coalesce(ready_at, created_at)
             where id=$1
               and status='ready'
               and reminded_at is null
               and coalesce(ready_at, created_at) <= $3
             returning *",
        )
        .bind(id)
        .bind(reminded_at)
        .bind(ready_before)
        .fetch_optional(executor)
        .await
    }

    /// Give back a reminder claim whose send did not go through
    #[tracing::instrument(name = "Release order reminder", skip(executor))]
    pub async fn release_reminder<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        reminded_at: DateTime<Utc>,
    ) -> sqlx::Result<bool> {
        let result =
            sqlx::query("update orders set reminded_at=null where id=$1 and reminded_at=$2")
                .bind(id)
                .bind(reminded_at)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// Order persistence used by the lifecycle rules.
/// NOTE: Lets the transition and reminder rules run against an in-memory table in tests
#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    async fn fetch_order(&self, id: Uuid) -> sqlx::Result<Option<Order>>;

    async fn mark_ready_if_new(
        &self,
        id: Uuid,
        ready_at: DateTime<Utc>,
    ) -> sqlx::Result<Option<Order>>;

    async fn backfill_ready_at(
        &self,
        id: Uuid,
        ready_at: DateTime<Utc>,
    ) -> sqlx::Result<Option<Order>>;

    async fn claim_reminder(
        &self,
        id: Uuid,
        reminded_at: DateTime<Utc>,
        ready_before: DateTime<Utc>,
    ) -> sqlx::Result<Option<Order>>;

    async fn release_reminder(&self, id: Uuid, reminded_at: DateTime<Utc>) -> sqlx::Result<bool>;
}

#[async_trait::async_trait]
impl OrderStore for PgPool {
    async fn fetch_order(&self, id: Uuid) -> sqlx::Result<Option<Order>> {
        OrdersRepo::fetch_by_id(self, id).await
    }

    async fn mark_ready_if_new(
        &self,
        id: Uuid,
        ready_at: DateTime<Utc>,
    ) -> sqlx::Result<Option<Order>> {
        OrdersRepo::mark_ready_if_new(self, id, ready_at).await
    }

    async fn backfill_ready_at(
        &self,
        id: Uuid,
        ready_at: DateTime<Utc>,
    ) -> sqlx::Result<Option<Order>> {
        OrdersRepo::backfill_ready_at(self, id, ready_at).await
    }

    async fn claim_reminder(
        &self,
        id: Uuid,
        reminded_at: DateTime<Utc>,
        ready_before: DateTime<Utc>,
    ) -> sqlx::Result<Option<Order>> {
        OrdersRepo::claim_reminder(self, id, reminded_at, ready_before).await
    }

    async fn release_reminder(&self, id: Uuid, reminded_at: DateTime<Utc>) -> sqlx::Result<bool> {
        OrdersRepo::release_reminder(self, id, reminded_at).await
    }
}
