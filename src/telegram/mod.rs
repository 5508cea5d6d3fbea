/*!
 * Chat transport.
 *
 * The conversation logic only needs to send a reply and edit a previously
 * sent message; `ChatTransport` captures exactly that. `client` implements it
 * on top of the Telegram Bot API.
 */

use async_trait::async_trait;

use crate::errors::TransportError;
use crate::session::models::ChatId;

pub mod client;
pub mod models;

pub use client::TelegramClient;
pub use models::BotCommand;

/// Identifier of a sent message, used to edit it later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub i64);

/// Outbound side of a chat
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `text` to `chat`
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageId, TransportError>;

    /// Replace the text of a message sent earlier
    async fn edit_message(&self, chat: ChatId, message: MessageId, text: &str) -> Result<(), TransportError>;
}
