mod drinks;
mod health_check;
mod notify;
mod profiles;
mod remind;
mod upload_avatar;
