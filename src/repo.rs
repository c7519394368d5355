mod drinks;
mod orders;
mod profiles;

pub use drinks::DrinksRepo;
pub use orders::{OrderStore, OrdersRepo};
pub use profiles::ProfilesRepo;
