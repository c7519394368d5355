use serde::Serialize;

/// Menu item. Read-only for guests, availability toggled by staff.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Drink {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub available: bool,
}
