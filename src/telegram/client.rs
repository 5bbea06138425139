use super::types::{
    ApiResponse, DeleteMessageRequest, DeleteWebhookRequest, GetUpdatesRequest, Message,
    ReplyParameters, SendMessageRequest, SendPhotoRequest, Update, User,
};
use super::MessengerService;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

const DEFAULT_API_URL: &str = "https://api.telegram.org";
const PARSE_MODE: &str = "HTML";

/// Bot API client. No request timeout is set, so long polls are bounded by
/// the server-side `timeout` parameter alone.
pub struct TelegramClient {
    client: Client,
    token: String,
    api_url: String,
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        Self::new_with_client(token, Client::new())
    }

    pub fn new_with_client(token: String, client: Client) -> Self {
        Self {
            client,
            token,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    async fn call<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        method: &str,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!("{}/bot{}/{}", self.api_url, self.token, method);
        // The URL embeds the bot token; strip it from transport errors.
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::error!("Failed to call Telegram {}: {}", method, e);
                e
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| e.without_url())?;

        let envelope: ApiResponse<Resp> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                tracing::error!("Failed to parse Telegram {} response: {}\nBody: {}", method, e, body);
                return Err(e.into());
            }
            Err(_) => {
                return Err(Error::Telegram {
                    code: i64::from(status.as_u16()),
                    description: body,
                })
            }
        };

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                description,
                error_code,
                ..
            } => {
                let code = error_code.unwrap_or_else(|| i64::from(status.as_u16()));
                let description =
                    description.unwrap_or_else(|| format!("{} returned no result", method));
                tracing::error!("Telegram {} failed ({}): {}", method, code, description);
                Err(Error::Telegram { code, description })
            }
        }
    }
}

#[async_trait]
impl MessengerService for TelegramClient {
    async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({})).await
    }

    async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<()> {
        let _: bool = self
            .call(
                "deleteWebhook",
                &DeleteWebhookRequest {
                    drop_pending_updates,
                },
            )
            .await?;
        Ok(())
    }

    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &GetUpdatesRequest {
                offset,
                timeout: timeout_secs,
                allowed_updates: vec!["message"],
            },
        )
        .await
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<Message> {
        self.call(
            "sendMessage",
            &SendMessageRequest {
                chat_id,
                text,
                parse_mode: PARSE_MODE,
                reply_parameters: reply_to.map(ReplyParameters::to),
            },
        )
        .await
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: &str,
        spoiler: bool,
        reply_to: Option<i64>,
    ) -> Result<Message> {
        self.call(
            "sendPhoto",
            &SendPhotoRequest {
                chat_id,
                photo: photo_url,
                caption,
                parse_mode: PARSE_MODE,
                has_spoiler: spoiler,
                reply_parameters: reply_to.map(ReplyParameters::to),
            },
        )
        .await
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let _: bool = self
            .call(
                "deleteMessage",
                &DeleteMessageRequest {
                    chat_id,
                    message_id,
                },
            )
            .await?;
        Ok(())
    }
}
