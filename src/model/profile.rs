use chrono::{DateTime, Utc};

use serde::Serialize;

use uuid::Uuid;

use crate::domain::{PersonName, PhoneNumber};

/// New guest registration
#[derive(Debug)]
pub struct NewProfile {
    /// Client generated ID, so a photo can be uploaded before the profile exists
    pub id: Option<Uuid>,
    pub name: PersonName,
    pub phone: PhoneNumber,
    pub photo_url: Option<String>,
}

/// Stored guest profile
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    /// Normalized at registration
    pub phone: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
