//! Telegram Bot API client and transport adapter.
//!
//! A thin typed client over [`rest_client`] covering the handful of
//! methods the bot uses (`sendMessage`, `getUpdates`,
//! `answerCallbackQuery`), plus the [`notify::MessagingTransport`]
//! implementation with transient/fatal failure classification.

mod client;
mod error;
mod transport;
mod types;

pub use client::{TelegramClient, TELEGRAM_API_BASE};
pub use error::TelegramError;
pub use types::{
    CallbackQuery, Chat, InlineKeyboardButton, InlineKeyboardMarkup, Message, Update,
};
