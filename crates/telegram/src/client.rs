//! Bot API client.

use crate::error::TelegramError;
use crate::types::{
    AnswerCallbackRequest, ApiResponse, InlineKeyboardMarkup, Message, SendMessageRequest, Update,
};
use model::SessionId;
use rest_client::RestClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Public host of the Bot API.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Long-poll timeout passed to `getUpdates`.
const LONG_POLL_TIMEOUT_SECS: u32 = 50;

/// Request timeout. Must exceed the long-poll timeout or every idle
/// `getUpdates` call would abort early.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(65);

/// Typed client for the handful of Bot API methods the bot uses.
pub struct TelegramClient {
    client: RestClient,
    /// URL prefix carrying the token, e.g. "/bot123:abc".
    prefix: String,
}

impl TelegramClient {
    /// Create a client against the public host.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(token: &str) -> Result<Self, TelegramError> {
        Self::with_base_url(TELEGRAM_API_BASE, token)
    }

    /// Create a client against a specific base URL (tests).
    pub fn with_base_url(base_url: &str, token: &str) -> Result<Self, TelegramError> {
        let client = RestClient::new(base_url, REQUEST_TIMEOUT)?;
        Ok(Self {
            client,
            prefix: format!("/bot{}", token),
        })
    }

    /// Unwrap the Bot API envelope into the result payload.
    fn unwrap_response<T>(response: ApiResponse<T>) -> Result<T, TelegramError> {
        if response.ok {
            response.result.ok_or(TelegramError::MissingResult)
        } else {
            Err(TelegramError::Api {
                code: response.error_code.unwrap_or(0),
                description: response
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            })
        }
    }

    /// Invoke one Bot API method with a JSON body.
    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, TelegramError> {
        let path = format!("{}/{}", self.prefix, method);
        let response: ApiResponse<T> = self.client.post_json(&path, body).await?;
        Self::unwrap_response(response)
    }

    /// Send a text message, optionally with an inline keyboard.
    pub async fn send_message(
        &self,
        chat: SessionId,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramError> {
        let request = SendMessageRequest {
            chat_id: chat.0,
            text,
            reply_markup: keyboard,
        };
        self.call("sendMessage", &request).await
    }

    /// Long-poll for updates newer than `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let path = format!("{}/getUpdates", self.prefix);
        let query = format!("offset={}&timeout={}", offset, LONG_POLL_TIMEOUT_SECS);
        let response: ApiResponse<Vec<Update>> = self.client.get(&path, Some(&query)).await?;
        Self::unwrap_response(response)
    }

    /// Acknowledge a callback query so the client stops its spinner.
    pub async fn answer_callback_query(&self, callback_id: &str) -> Result<(), TelegramError> {
        let request = AnswerCallbackRequest {
            callback_query_id: callback_id,
        };
        let _: bool = self.call("answerCallbackQuery", &request).await?;
        Ok(())
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The prefix embeds the token; never print it.
        f.debug_struct("TelegramClient")
            .field("base_url", &self.client.base_url())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response_unwraps_result() {
        let response = ApiResponse {
            ok: true,
            result: Some(vec![1, 2, 3]),
            description: None,
            error_code: None,
        };
        assert_eq!(
            TelegramClient::unwrap_response(response).unwrap(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn failed_response_carries_code_and_description() {
        let response: ApiResponse<()> = ApiResponse {
            ok: false,
            result: None,
            description: Some("Bad Request: chat not found".to_string()),
            error_code: Some(400),
        };

        match TelegramClient::unwrap_response(response) {
            Err(TelegramError::Api { code, description }) => {
                assert_eq!(code, 400);
                assert_eq!(description, "Bad Request: chat not found");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn ok_without_result_is_an_error() {
        let response: ApiResponse<()> = ApiResponse {
            ok: true,
            result: None,
            description: None,
            error_code: None,
        };
        assert!(matches!(
            TelegramClient::unwrap_response(response),
            Err(TelegramError::MissingResult)
        ));
    }

    #[test]
    fn debug_does_not_leak_the_token() {
        let client = TelegramClient::with_base_url("https://api.example.com", "123:secret").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret"));
    }
}
