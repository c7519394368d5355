mod avatar_store;
mod sms_client;

pub use avatar_store::{AvatarStore, StorageError};
pub use sms_client::{MessageReceipt, MessageSender, SmsClient, SmsError, TextMessage};
