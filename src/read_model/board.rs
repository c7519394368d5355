use chrono::{DateTime, Utc};

use uuid::Uuid;

use crate::domain::OrderStatus;
use crate::model::Order;

/// Working copy of the orders table, sorted by arrival.
///
/// Rows from full reloads, change events and command results all land here
/// through `merge`, so whichever arrives last wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBoard {
    orders: Vec<Order>,
}

/// A change a client asks the server to make
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderCommand {
    MarkReady(Uuid),
    Remind(Uuid),
}

/// What the server made of a command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// The stored row after the command
    Applied(Order),
    Rejected(String),
}

/// An optimistic change waiting for its `CommandResult`
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommand {
    previous: Order,
    optimistic: Order,
}

impl OrderBoard {
    pub fn new(orders: Vec<Order>) -> Self {
        let mut board = Self { orders };
        board.sort();
        board
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn get(&self, id: Uuid) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// Swap in a full reload
    pub fn replace_all(&mut self, orders: Vec<Order>) {
        self.orders = orders;
        self.sort();
    }

    /// Insert or overwrite a single row
    pub fn merge(&mut self, order: Order) {
        match self.orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order,
            None => self.orders.push(order),
        }
        self.sort();
    }

    /// Apply a command locally ahead of the server.
    /// `None` when the command would not change anything.
    pub fn apply(&mut self, command: OrderCommand, now: DateTime<Utc>) -> Option<PendingCommand> {
        let previous = match command {
            OrderCommand::MarkReady(id) | OrderCommand::Remind(id) => self.get(id)?.clone(),
        };

        let mut optimistic = previous.clone();
        match command {
            OrderCommand::MarkReady(_) if previous.status == OrderStatus::New => {
                optimistic.status = OrderStatus::Ready;
                optimistic.ready_at = Some(now);
            }
            OrderCommand::Remind(_) if previous.is_ready() && previous.reminded_at.is_none() => {
                optimistic.reminded_at = Some(now);
            }
            _ => return None,
        }

        self.merge(optimistic.clone());
        Some(PendingCommand {
            previous,
            optimistic,
        })
    }

    /// Resolve an optimistic change: keep the server's row, or roll back.
    /// A rollback is skipped when a newer row arrived in the meantime.
    pub fn settle(&mut self, pending: PendingCommand, result: CommandResult) {
        match result {
            CommandResult::Applied(order) => self.merge(order),
            CommandResult::Rejected(reason) => {
                tracing::debug!("Rolling back order {}: {}", pending.previous.id, reason);
                if self.get(pending.previous.id) == Some(&pending.optimistic) {
                    self.merge(pending.previous);
                }
            }
        }
    }

    fn sort(&mut self) {
        self.orders.sort_by_key(|o| (o.created_at, o.id));
    }
}
