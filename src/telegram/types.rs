//! Telegram Bot API payloads (the subset this bot uses).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope wrapping every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReplyParameters {
    pub message_id: i64,
    pub allow_sending_without_reply: bool,
}

impl ReplyParameters {
    pub fn to(message_id: i64) -> Self {
        Self {
            message_id,
            allow_sending_without_reply: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct DeleteWebhookRequest {
    pub drop_pending_updates: bool,
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
}

#[derive(Debug, Serialize)]
pub struct SendPhotoRequest<'a> {
    pub chat_id: i64,
    /// HTTP URL; Telegram downloads the image itself.
    pub photo: &'a str,
    pub caption: &'a str,
    pub parse_mode: &'static str,
    pub has_spoiler: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
}

#[derive(Debug, Serialize)]
pub struct DeleteMessageRequest {
    pub chat_id: i64,
    pub message_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_deserialization() {
        let json = r#"{
            "update_id": 815,
            "message": {
                "message_id": 42,
                "date": 1760601600,
                "chat": { "id": -1001, "type": "supergroup", "title": "Art" },
                "from": { "id": 7, "is_bot": false, "first_name": "Olena", "username": "olena" },
                "text": "/img a fox"
            }
        }"#;

        let update: Update = serde_json::from_str(json).unwrap();
        let message = update.message.unwrap();
        assert_eq!(update.update_id, 815);
        assert_eq!(message.chat.id, -1001);
        assert_eq!(message.text.as_deref(), Some("/img a fox"));
        assert_eq!(message.date.timestamp(), 1760601600);
    }

    #[test]
    fn test_error_envelope_deserialization() {
        let json = r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#;
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(!response.ok);
        assert!(response.result.is_none());
        assert_eq!(response.error_code, Some(401));
    }

    #[test]
    fn test_send_photo_serialization_omits_missing_reply() {
        let request = SendPhotoRequest {
            chat_id: 1,
            photo: "https://img.test/1.jpg",
            caption: "cost",
            parse_mode: "HTML",
            has_spoiler: true,
            reply_parameters: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["has_spoiler"], true);
        assert!(json.get("reply_parameters").is_none());
    }
}
