use std::fmt;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::BotError;

/// Telegram's limit is 4096 characters per message
pub const MAX_MESSAGE_LEN: usize = 4096;

/// What Telegram POSTs to the webhook every time a user interacts with the bot.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Update {
    pub update_id: i64,
    pub message: Message,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
#[allow(dead_code)]
pub struct Message {
    pub text: String,
    pub chat: Chat,
    pub audio: Audio,
    pub voice: Voice,
    pub document: Document,
}

/// The conversation a message belongs to; replies go back to `id`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Audio {
    pub file_id: String,
    pub duration: i64,
}

/// Voice notes carry the same fields we care about as audio files.
pub type Voice = Audio;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Document {
    pub file_id: String,
    pub file_name: String,
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(update id: {}, message: {})", self.update_id, self.message)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(text: {}, chat: {}, audio {})",
            self.text, self.chat, self.audio
        )
    }
}

impl fmt::Display for Chat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(id: {})", self.id)
    }
}

impl fmt::Display for Audio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(file id: {}, duration: {})", self.file_id, self.duration)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(file id: {}, file name: {})", self.file_id, self.file_name)
    }
}

/// Decode a webhook body into an [`Update`].
///
/// Only the shape and the update id are checked. Empty text and a missing
/// chat id (which becomes 0) are let through.
pub fn decode_update(body: &[u8]) -> Result<Update, BotError> {
    let update: Update = serde_json::from_slice(body)?;

    if update.update_id == 0 {
        return Err(BotError::InvalidIdentifier);
    }

    Ok(update)
}

/// Split long messages for Telegram's 4096 char limit
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

/// Sends replies through the Bot API `sendMessage` method.
pub struct TelegramClient {
    client: reqwest::Client,
    send_message_url: String,
}

impl TelegramClient {
    /// `send_message_url` already contains the bot token.
    pub fn new(send_message_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            send_message_url,
        }
    }

    /// Post `text` to `chat_id` and return the raw response body.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<String, BotError> {
        let params = [("chat_id", chat_id.to_string()), ("text", text.to_string())];

        debug!("Sending {} bytes to chat {}", text.len(), chat_id);

        let response = self
            .client
            .post(&self.send_message_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| BotError::network("Error when posting text to the chat", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BotError::network("Error reading telegram response", e))?;

        info!("Body of the telegram response: {}", body);

        if !status.is_success() {
            return Err(BotError::Rejected { status, body });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_decode_full_update() {
        let body = br#"{
            "update_id": 10000,
            "message": {
                "text": "Drama, Heist",
                "chat": {"id": 1111111},
                "document": {"file_id": "doc-1", "file_name": "list.txt"}
            }
        }"#;

        let update = decode_update(body).unwrap();
        assert_eq!(update.update_id, 10000);
        assert_eq!(update.message.text, "Drama, Heist");
        assert_eq!(update.message.chat.id, 1111111);
        assert_eq!(update.message.document.file_name, "list.txt");
        assert_eq!(update.message.audio, Audio::default());
    }

    #[test]
    fn test_decode_preserves_text_verbatim() {
        let body = br#"{"update_id": 7, "message": {"text": "  Mixed CASE, text ", "chat": {"id": -42}}}"#;
        let update = decode_update(body).unwrap();
        assert_eq!(update.message.text, "  Mixed CASE, text ");
        assert_eq!(update.message.chat.id, -42);
    }

    #[test]
    fn test_decode_zero_update_id() {
        let body = br#"{"update_id": 0, "message": {"text": "/start", "chat": {"id": 5}}}"#;
        assert!(matches!(
            decode_update(body),
            Err(BotError::InvalidIdentifier)
        ));
    }

    #[test]
    fn test_decode_missing_update_id_is_zero() {
        let body = br#"{"message": {"text": "hi", "chat": {"id": 5}}}"#;
        assert!(matches!(
            decode_update(body),
            Err(BotError::InvalidIdentifier)
        ));
    }

    #[test]
    fn test_decode_missing_chat_defaults() {
        let body = br#"{"update_id": 3, "message": {"text": ""}}"#;
        let update = decode_update(body).unwrap();
        assert_eq!(update.message.chat.id, 0);
        assert_eq!(update.message.text, "");
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode_update(b"not json"), Err(BotError::Decode(_))));
        assert!(matches!(
            decode_update(br#"{"update_id": "abc"}"#),
            Err(BotError::Decode(_))
        ));
    }

    #[test]
    fn test_display() {
        let update = Update {
            update_id: 9,
            message: Message {
                text: "hi".to_string(),
                chat: Chat { id: 4 },
                audio: Audio {
                    file_id: "a1".to_string(),
                    duration: 30,
                },
                ..Message::default()
            },
        };
        assert_eq!(
            update.to_string(),
            "(update id: 9, message: (text: hi, chat: (id: 4), audio (file id: a1, duration: 30)))"
        );
        let doc = Document {
            file_id: "d1".to_string(),
            file_name: "x.pdf".to_string(),
        };
        assert_eq!(doc.to_string(), "(file id: d1, file name: x.pdf)");
    }

    #[test]
    fn test_split_short_message() {
        assert_eq!(split_message("hello", 10), vec!["hello"]);
        assert_eq!(split_message("", 10), vec![""]);
    }

    #[test]
    fn test_split_at_newline() {
        let chunks = split_message("Movie One\nMovie Two\n", 12);
        assert_eq!(chunks, vec!["Movie One\n", "Movie Two\n"]);
    }

    #[test]
    fn test_split_respects_char_boundary() {
        let text = "ééééé";
        let chunks = split_message(text, 3);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| c.len() <= 3));
    }

    #[tokio::test]
    async fn test_send_message_posts_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("chat_id".into(), "42".into()),
                Matcher::UrlEncoded("text".into(), "Movie One\nMovie Two\n".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let client = TelegramClient::new(format!("{}/bot123:abc/sendMessage", server.url()));
        let body = client
            .send_message(42, "Movie One\nMovie Two\n")
            .await
            .unwrap();

        assert_eq!(body, r#"{"ok":true}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_message_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/bot/sendMessage")
            .with_status(400)
            .with_body(r#"{"ok":false,"description":"Bad Request: message text is empty"}"#)
            .create_async()
            .await;

        let client = TelegramClient::new(format!("{}/bot/sendMessage", server.url()));
        match client.send_message(1, "").await {
            Err(BotError::Rejected { status, body }) => {
                assert_eq!(status.as_u16(), 400);
                assert!(body.contains("message text is empty"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_message_network_error() {
        let client = TelegramClient::new("http://127.0.0.1:1/bot/sendMessage".to_string());
        let result = client.send_message(1, "hi").await;
        assert!(matches!(result, Err(BotError::Network { .. })));
    }
}
