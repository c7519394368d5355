mod avatar;
mod order_status;
mod person_name;
mod phone_number;

pub use avatar::{AvatarImage, MAX_AVATAR_BYTES};
pub use order_status::OrderStatus;
pub use person_name::PersonName;
pub use phone_number::{PhoneNumber, DEFAULT_COUNTRY_CODE};
