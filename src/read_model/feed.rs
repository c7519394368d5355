use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use serde::Deserialize;

use sqlx::postgres::{PgListener, PgNotification};
use sqlx::PgPool;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::OrderStatus;
use crate::lifecycle::OrderPolicy;
use crate::model::Order;
use crate::read_model::{CommandResult, OrderBoard, OrderCommand, PendingCommand};
use crate::repo::OrdersRepo;
use crate::views::is_recently_ready;

/// Channel the orders table trigger publishes row changes on
pub const ORDER_CHANGES_CHANNEL: &str = "order_changes";

/// Which orders a subscriber wants to see
#[derive(Debug, Clone, PartialEq)]
pub enum OrderFilter {
    All,
    /// Orders still waiting to be made
    Pending,
    /// Ready orders inside the ready window
    RecentlyReady,
    /// Orders placed with this normalized phone number
    Guest(String),
}

impl OrderFilter {
    pub fn matches(&self, order: &Order, now: DateTime<Utc>, policy: &OrderPolicy) -> bool {
        match self {
            Self::All => true,
            Self::Pending => order.status == OrderStatus::New,
            Self::RecentlyReady => is_recently_ready(order, now, policy.ready_window),
            Self::Guest(phone) => &order.phone == phone,
        }
    }
}

/// Row change published by the orders table trigger
#[derive(Debug, Deserialize)]
struct OrderChange {
    order: Order,
}

/// Latest full board, `None` until the first load
type Snapshot = Option<Arc<Vec<Order>>>;

/// Source of live order snapshots.
///
/// A feed runs at most one background task. It holds the only change listener
/// and the periodic full reload, and publishes the whole board to every
/// subscription, which filters it locally. The reload also re-applies time
/// based filters.
#[derive(Debug, Clone)]
pub struct OrderFeed {
    hub: Arc<FeedHub>,
}

#[derive(Debug)]
struct FeedHub {
    pool: PgPool,
    poll_interval: Duration,
    policy: OrderPolicy,
    board: Arc<SharedBoard>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for FeedHub {
    fn drop(&mut self) {
        let worker = self.worker.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(worker) = worker.take() {
            worker.abort();
        }
    }
}

/// Board written by the feed task and by command callers
#[derive(Debug)]
struct SharedBoard {
    board: Mutex<Option<OrderBoard>>,
    snapshots: watch::Sender<Snapshot>,
    reload: Notify,
}

impl SharedBoard {
    fn load(&self, orders: Vec<Order>) {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        let board = board.get_or_insert_with(OrderBoard::default);
        board.replace_all(orders);
        self.publish(board);
    }

    /// Change a loaded board and publish it when `change` returns `Some`
    fn update<T>(&self, change: impl FnOnce(&mut OrderBoard) -> Option<T>) -> Option<T> {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        let board = board.as_mut()?;
        let result = change(board)?;
        self.publish(board);
        Some(result)
    }

    fn publish(&self, board: &OrderBoard) {
        self.snapshots
            .send_replace(Some(Arc::new(board.orders().to_vec())));
    }
}

impl OrderFeed {
    pub fn new(pool: PgPool, poll_interval: Duration, policy: OrderPolicy) -> Self {
        let (snapshots, _) = watch::channel(None);

        Self {
            hub: Arc::new(FeedHub {
                pool,
                poll_interval,
                policy,
                board: Arc::new(SharedBoard {
                    board: Mutex::new(None),
                    snapshots,
                    reload: Notify::new(),
                }),
                worker: Mutex::new(None),
            }),
        }
    }

    /// Nothing is fetched until the first call to `OrderSubscription::next`
    pub fn subscribe(&self, filter: OrderFilter) -> OrderSubscription {
        OrderSubscription {
            feed: self.clone(),
            filter,
            snapshots: None,
        }
    }

    /// Show a command's expected effect to subscribers ahead of the database.
    /// `None` when the board is not loaded yet or the command changes nothing.
    pub fn begin(&self, command: OrderCommand, now: DateTime<Utc>) -> Option<PendingCommand> {
        self.hub.board.update(|board| board.apply(command, now))
    }

    /// Publish what the database made of a command started with `begin`
    pub fn finish(&self, pending: Option<PendingCommand>, result: CommandResult) {
        self.hub.board.update(|board| {
            match (pending, result) {
                (Some(pending), result) => board.settle(pending, result),
                (None, CommandResult::Applied(order)) => board.merge(order),
                (None, CommandResult::Rejected(_)) => return None,
            }
            Some(())
        });
    }

    /// Start the feed task if it is not running and attach to its snapshots
    fn attach(&self) -> watch::Receiver<Snapshot> {
        let mut worker = self
            .hub
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if worker.as_ref().map_or(true, JoinHandle::is_finished) {
            *worker = Some(tokio::spawn(run_feed(
                self.hub.pool.clone(),
                self.hub.poll_interval,
                self.hub.board.clone(),
            )));
        }

        self.hub.board.snapshots.subscribe()
    }
}

/// Lazy, restartable sequence of filtered order snapshots
#[derive(Debug)]
pub struct OrderSubscription {
    feed: OrderFeed,
    filter: OrderFilter,
    snapshots: Option<watch::Receiver<Snapshot>>,
}

impl OrderSubscription {
    pub fn filter(&self) -> &OrderFilter {
        &self.filter
    }

    /// Wait for the next snapshot. The first call yields the current board.
    pub async fn next(&mut self) -> Option<Vec<Order>> {
        let attached = self.snapshots.is_some();
        if !attached {
            self.snapshots = Some(self.feed.attach());
        }

        let snapshots = self.snapshots.as_mut()?;
        if attached {
            snapshots.changed().await.ok()?;
        }

        loop {
            let snapshot = snapshots.borrow_and_update().clone();
            if let Some(orders) = snapshot {
                let now = Utc::now();
                return Some(
                    orders
                        .iter()
                        .filter(|o| self.filter.matches(o, now, &self.feed.hub.policy))
                        .cloned()
                        .collect(),
                );
            }
            snapshots.changed().await.ok()?;
        }
    }

    /// Ask the feed for a full reload and start over from the current board
    pub fn restart(&mut self) {
        self.snapshots = None;
        self.feed.hub.board.reload.notify_one();
    }
}

#[tracing::instrument(name = "Order feed", skip_all)]
async fn run_feed(pool: PgPool, poll_interval: Duration, shared: Arc<SharedBoard>) {
    let mut listener = listen(&pool).await;

    // First tick fires immediately and serves the initial load
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => reload(&pool, &shared).await,
            _ = shared.reload.notified() => reload(&pool, &shared).await,
            notification = recv(&mut listener) => match notification {
                Ok(notification) => match parse_change(&notification) {
                    Ok(change) => {
                        shared.update(|board| {
                            board.merge(change.order);
                            Some(())
                        });
                    }
                    Err(error) => {
                        tracing::warn!(error.cause_chain = ?error, "Skipping malformed order change");
                    }
                },
                Err(error) => {
                    tracing::warn!(
                        error.cause_chain = ?error,
                        "Order change listener failed, falling back to polling"
                    );
                    listener = None;
                }
            },
        }
    }
}

async fn reload(pool: &PgPool, shared: &SharedBoard) {
    match OrdersRepo::fetch_all(pool).await {
        Ok(orders) => shared.load(orders),
        Err(error) => tracing::error!(error.cause_chain = ?error, "Failed to reload orders"),
    }
}

async fn listen(pool: &PgPool) -> Option<PgListener> {
    let mut listener = match PgListener::connect_with(pool).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::warn!(error.cause_chain = ?error, "Failed to connect order change listener");
            return None;
        }
    };

    match listener.listen(ORDER_CHANGES_CHANNEL).await {
        Ok(()) => Some(listener),
        Err(error) => {
            tracing::warn!(error.cause_chain = ?error, "Failed to listen for order changes");
            None
        }
    }
}

async fn recv(listener: &mut Option<PgListener>) -> sqlx::Result<PgNotification> {
    match listener {
        Some(listener) => listener.recv().await,
        None => std::future::pending().await,
    }
}

fn parse_change(notification: &PgNotification) -> serde_json::Result<OrderChange> {
    serde_json::from_str(notification.payload())
}
