mod drink;
mod order;
mod profile;

pub use drink::Drink;
pub use order::{NewOrder, Order};
pub use profile::{NewProfile, Profile};
