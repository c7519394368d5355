use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use uuid::Uuid;

use crate::domain::{OrderStatus, PersonName, PhoneNumber, DEFAULT_COUNTRY_CODE};
use crate::model::{Drink, Profile};

/// New order request, guest identity denormalized from the profile
#[derive(Debug)]
pub struct NewOrder {
    pub profile_id: Option<Uuid>,
    pub name: String,
    pub phone: PhoneNumber,
    pub photo_url: Option<String>,
    pub drink_id: i32,
    pub drink_name: String,
}

impl NewOrder {
    /// Copy the guest's identity onto the order so later profile edits leave it intact
    pub fn for_guest(profile: &Profile, drink: &Drink) -> Self {
        Self {
            profile_id: Some(profile.id),
            name: profile.name.clone(),
            phone: PhoneNumber::normalize(&profile.phone, DEFAULT_COUNTRY_CODE),
            photo_url: profile.photo_url.clone(),
            drink_id: drink.id,
            drink_name: drink.name.clone(),
        }
    }

    /// Order given at the counter with an inline name and phone, tied to no profile
    pub fn walk_up(
        name: &PersonName,
        phone: PhoneNumber,
        photo_url: Option<String>,
        drink: &Drink,
    ) -> Self {
        Self {
            profile_id: None,
            name: name.as_ref().to_string(),
            phone,
            photo_url,
            drink_id: drink.id,
            drink_name: drink.name.clone(),
        }
    }
}

/// Stored order record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub profile_id: Option<Uuid>,
    pub name: String,
    pub phone: String,
    pub photo_url: Option<String>,
    pub drink_id: i32,
    pub drink_name: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    /// Set once the order first becomes ready
    pub ready_at: Option<DateTime<Utc>>,
    /// Set once the single reminder has been sent
    pub reminded_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn is_ready(&self) -> bool {
        self.status == OrderStatus::Ready
    }

    /// When the order became ready. Legacy ready rows without `ready_at` fall back to creation time.
    pub fn ready_since(&self) -> Option<DateTime<Utc>> {
        if self.is_ready() {
            Some(self.ready_at.unwrap_or(self.created_at))
        } else {
            None
        }
    }
}
