//! `MessagingTransport` implementation over the Bot API.

use crate::client::TelegramClient;
use async_trait::async_trait;
use model::SessionId;
use notify::{MessagingTransport, TransportError};

#[async_trait]
impl MessagingTransport for TelegramClient {
    async fn send(&self, id: SessionId, text: &str) -> Result<(), TransportError> {
        match self.send_message(id, text, None).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_transient() => Err(TransportError::Transient(err.to_string())),
            Err(err) => Err(TransportError::Fatal(err.to_string())),
        }
    }
}
