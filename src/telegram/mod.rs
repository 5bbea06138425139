//! Telegram transport
//!
//! Long-polls the Bot API for incoming messages and delivers replies.
//! All text is sent with HTML parse mode.

pub mod client;
pub mod mock;
pub mod types;

pub use client::TelegramClient;
pub use mock::{MockTelegramClient, SentAction};
pub use types::{Message, Update, User};

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait MessengerService: Send + Sync {
    async fn get_me(&self) -> Result<User>;
    async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<()>;
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>>;
    async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i64>)
        -> Result<Message>;
    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: &str,
        spoiler: bool,
        reply_to: Option<i64>,
    ) -> Result<Message>;
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()>;
}
