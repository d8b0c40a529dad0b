//! Top-level wiring errors.

use p2p_client::P2pError;
use telegram::TelegramError;
use thiserror::Error;

/// Errors that prevent the bot from starting or keep it from running.
#[derive(Debug, Error)]
pub enum BotError {
    /// No token was provided.
    #[error("bot token missing: pass it as the first argument or set TELEGRAM_BOT_TOKEN")]
    MissingToken,

    /// Telegram client could not be built.
    #[error("telegram client: {0}")]
    Telegram(#[from] TelegramError),

    /// P2P client could not be built.
    #[error("P2P client: {0}")]
    P2p(#[from] P2pError),
}
