pub mod avatars;
pub mod drinks;
pub mod notifications;
pub mod orders;
pub mod profiles;
