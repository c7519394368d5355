use std::collections::HashMap;

use chrono::{DateTime, Utc};

use serde::Serialize;

use crate::model::Order;

/// One guest's standing on the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    /// Profile ID, or `name:<name>` for orders placed without a profile
    pub key: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub count: usize,
    pub last_order_at: DateTime<Utc>,
}

/// Group orders by guest and rank by number of orders, then by most recent order
pub fn ranking(orders: &[Order]) -> Vec<RankingEntry> {
    let mut chronological: Vec<&Order> = orders.iter().collect();
    chronological.sort_by_key(|o| o.created_at);

    let mut guests: HashMap<String, RankingEntry> = HashMap::new();
    for order in chronological {
        let key = match order.profile_id {
            Some(profile_id) => profile_id.to_string(),
            None => format!("name:{}", order.name),
        };

        let entry = guests.entry(key.clone()).or_insert_with(|| RankingEntry {
            key,
            name: order.name.clone(),
            photo_url: None,
            count: 0,
            last_order_at: order.created_at,
        });
        entry.count += 1;
        entry.last_order_at = order.created_at;
        // Latest photo wins
        if order.photo_url.is_some() {
            entry.photo_url = order.photo_url.clone();
        }
    }

    let mut ranking: Vec<RankingEntry> = guests.into_values().collect();
    ranking.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.last_order_at.cmp(&a.last_order_at))
            .then_with(|| a.name.cmp(&b.name))
    });
    ranking
}
