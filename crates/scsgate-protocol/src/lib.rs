pub mod message;
pub mod telegram;

pub use message::Message;
pub use telegram::{Telegram, checksum, compose};
