mod board;
mod feed;

pub use board::{CommandResult, OrderBoard, OrderCommand, PendingCommand};
pub use feed::{OrderFeed, OrderFilter, OrderSubscription, ORDER_CHANGES_CHANNEL};
