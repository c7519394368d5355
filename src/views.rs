mod queues;
mod ranking;

pub use queues::{
    guest_orders, is_recently_ready, pending_queue, ready_log, recently_ready, GuestOrders,
    PendingEntry, ReadyEntry,
};
pub use ranking::{ranking, RankingEntry};
