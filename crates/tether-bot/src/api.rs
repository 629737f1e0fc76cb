use crate::fault::Fault;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// One message somebody sent the bot.
#[derive(Debug, Clone)]
pub struct Incoming {
    pub chat_id: i64,
    pub text: String,
}

/// The messaging boundary. The long-poll runner only ever talks through
/// this, so tests can drive it with a scripted implementation.
pub trait Messenger {
    fn poll(&mut self) -> Result<Vec<Incoming>, ApiError>;
    fn send(&mut self, chat_id: i64, text: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed api payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("api rejected the call: {0}")]
    Rejected(Fault),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

/// Blocking Telegram Bot API client.
pub struct TelegramApi {
    client: reqwest::blocking::Client,
    base: String,
    poll_timeout_secs: u64,
    offset: i64,
}

impl TelegramApi {
    pub fn new(api_url: &str, token: &str, poll_timeout_secs: u64) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            // long polls hold the connection open for poll_timeout_secs
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .build()?;
        Ok(Self {
            client,
            base: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            poll_timeout_secs,
            offset: 0,
        })
    }

    fn call<T: DeserializeOwned>(&self, method: &str, payload: &Value) -> Result<T, ApiError> {
        let url = format!("{}/{}", self.base, method);
        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .body(serde_json::to_string(payload)?)
            .send()?;

        let status = response.status().as_u16();
        let body = response.text()?;
        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(err) => {
                if status != 200 {
                    return Err(ApiError::Rejected(Fault::classify_status(status, &body)));
                }
                return Err(ApiError::Payload(err));
            }
        };

        if !envelope.ok {
            let description = envelope
                .description
                .unwrap_or_else(|| "no description".to_string());
            return Err(ApiError::Rejected(Fault::classify_status(
                status,
                &description,
            )));
        }
        envelope
            .result
            .ok_or_else(|| ApiError::Rejected(Fault::Unknown("missing result field".to_string())))
    }
}

impl Messenger for TelegramApi {
    fn poll(&mut self) -> Result<Vec<Incoming>, ApiError> {
        let updates: Vec<Update> = self.call(
            "getUpdates",
            &json!({
                "timeout": self.poll_timeout_secs,
                "offset": self.offset,
                "allowed_updates": ["message"],
            }),
        )?;

        let mut incoming = Vec::new();
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            if let Some(text) = message.text {
                incoming.push(Incoming {
                    chat_id: message.chat.id,
                    text,
                });
            }
        }
        debug!(count = incoming.len(), "polled updates");
        Ok(incoming)
    }

    fn send(&mut self, chat_id: i64, text: &str) -> Result<(), ApiError> {
        let _: Value = self.call(
            "sendMessage",
            &json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "MarkdownV2",
            }),
        )?;
        Ok(())
    }
}
