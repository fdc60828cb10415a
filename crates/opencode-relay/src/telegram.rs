//! Telegram Bot API client (long polling).
//!
//! Only the four methods the relay needs are implemented. Every request URL
//! contains the bot token, so nothing here logs a URL and HTTP errors are
//! stripped of theirs on conversion to [`RelayError`].

use crate::error::{RelayError, RelayResult};
use crate::transport::{ChatTransport, InboundEvent, OutboundMessage};
use async_trait::async_trait;
use prompt_gate::SenderId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Slack added to the long-poll timeout before the HTTP request gives up.
const HTTP_GRACE: Duration = Duration::from_secs(10);
/// Timeout for calls that do not long-poll.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub web_app_data: Option<WebAppData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebAppData {
    pub data: String,
    pub button_text: String,
}

#[derive(Debug, Serialize)]
struct GetUpdatesParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct SendMessageParams<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyKeyboardMarkup<'a>>,
}

#[derive(Debug, Serialize)]
struct ReplyKeyboardMarkup<'a> {
    keyboard: Vec<Vec<KeyboardButton<'a>>>,
    resize_keyboard: bool,
}

#[derive(Debug, Serialize)]
struct KeyboardButton<'a> {
    text: &'a str,
    web_app: WebAppInfo<'a>,
}

#[derive(Debug, Serialize)]
struct WebAppInfo<'a> {
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct DeleteWebhookParams {
    drop_pending_updates: bool,
}

/// Reduce an update to a relay event. Updates without a message, and
/// commands other than `/start`, are dropped.
pub fn to_event(update: Update) -> Option<InboundEvent> {
    let message = update.message?;
    let chat_id = message.chat.id;
    let sender = message.from.as_ref().map(|u| SenderId(u.id));

    if let Some(data) = message.web_app_data {
        return Some(InboundEvent::Message {
            chat_id,
            sender,
            web_app_data: Some(data.data),
        });
    }

    match message.text.as_deref().map(command_name) {
        Some(Some("start")) => Some(InboundEvent::Start {
            chat_id,
            sender,
            sender_name: message.from.as_ref().map(User::full_name),
        }),
        Some(Some(_)) => None,
        _ => Some(InboundEvent::Message {
            chat_id,
            sender,
            web_app_data: None,
        }),
    }
}

/// `"/start@my_bot args"` -> `Some("start")`. Plain text -> `None`.
fn command_name(text: &str) -> Option<&str> {
    let word = text.strip_prefix('/')?.split_whitespace().next()?;
    Some(word.split('@').next().unwrap_or(word))
}

fn send_params(message: &OutboundMessage) -> SendMessageParams<'_> {
    let reply_markup = message.button.as_ref().map(|button| ReplyKeyboardMarkup {
        keyboard: vec![vec![KeyboardButton {
            text: &button.text,
            web_app: WebAppInfo { url: &button.url },
        }]],
        resize_keyboard: true,
    });
    SendMessageParams {
        chat_id: message.chat_id,
        text: &message.text,
        reply_markup,
    }
}

fn decode<T: DeserializeOwned>(status: reqwest::StatusCode, body: &str) -> RelayResult<T> {
    let response: ApiResponse<T> = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(_) if !status.is_success() => {
            return Err(RelayError::Telegram {
                code: i64::from(status.as_u16()),
                description: status
                    .canonical_reason()
                    .unwrap_or("unexpected response")
                    .to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    match (response.ok, response.result) {
        (true, Some(result)) => Ok(result),
        (true, None) => Err(RelayError::Telegram {
            code: i64::from(status.as_u16()),
            description: "response has no result".to_string(),
        }),
        (false, _) => Err(RelayError::Telegram {
            code: response
                .error_code
                .unwrap_or_else(|| i64::from(status.as_u16())),
            description: response.description.unwrap_or_default(),
        }),
    }
}

/// Long-polling Telegram client.
pub struct TelegramClient {
    http: reqwest::Client,
    /// `<api>/bot<token>`. Never logged.
    base: String,
    poll_timeout: Duration,
    offset: Option<i64>,
}

impl TelegramClient {
    pub fn new(api_url: &Url, token: &str, poll_timeout: Duration) -> RelayResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("opencode-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base: format!("{}/bot{}", api_url.as_str().trim_end_matches('/'), token),
            poll_timeout,
            offset: None,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base, method)
    }

    async fn call<P, R>(&self, method: &str, params: &P, timeout: Duration) -> RelayResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.method_url(method))
            .json(params)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        decode(status, &body).inspect_err(|e| {
            tracing::debug!(method, error = %e, "Telegram call failed");
        })
    }

    /// Check the token. Returns the bot's own user.
    pub async fn get_me(&self) -> RelayResult<User> {
        self.call("getMe", &serde_json::json!({}), REQUEST_TIMEOUT)
            .await
    }

    /// Remove any webhook so long polling works. With `drop_pending_updates`
    /// Telegram discards everything queued while the relay was down.
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> RelayResult<()> {
        let _: bool = self
            .call(
                "deleteWebhook",
                &DeleteWebhookParams {
                    drop_pending_updates,
                },
                REQUEST_TIMEOUT,
            )
            .await?;
        Ok(())
    }

    /// One `getUpdates` long poll. Advances the offset past every update
    /// returned, including ones that produce no event.
    pub async fn get_updates(&mut self) -> RelayResult<Vec<Update>> {
        let params = GetUpdatesParams {
            offset: self.offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: &["message"],
        };
        let updates: Vec<Update> = self
            .call("getUpdates", &params, self.poll_timeout + HTTP_GRACE)
            .await?;

        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.offset = Some(last + 1);
        }
        Ok(updates)
    }

    pub async fn send_message(&self, message: &OutboundMessage) -> RelayResult<()> {
        let _: serde_json::Value = self
            .call("sendMessage", &send_params(message), REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("poll_timeout", &self.poll_timeout)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn next_events(&mut self) -> RelayResult<Vec<InboundEvent>> {
        let updates = self.get_updates().await?;
        Ok(updates.into_iter().filter_map(to_event).collect())
    }

    async fn send(&self, message: OutboundMessage) -> RelayResult<()> {
        self.send_message(&message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::WebAppButton;
    use reqwest::StatusCode;

    fn update(json: serde_json::Value) -> Update {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn web_app_data_becomes_a_message_event() {
        let event = to_event(update(serde_json::json!({
            "update_id": 10,
            "message": {
                "message_id": 5,
                "date": 1700000000,
                "chat": {"id": 42, "type": "private"},
                "from": {"id": 42, "is_bot": false, "first_name": "Ada"},
                "web_app_data": {"data": "list files", "button_text": "🚀 Launch OpenCode"}
            }
        })));

        assert_eq!(
            event,
            Some(InboundEvent::Message {
                chat_id: 42,
                sender: Some(SenderId(42)),
                web_app_data: Some("list files".to_string()),
            })
        );
    }

    #[test]
    fn start_command_carries_the_full_name() {
        let event = to_event(update(serde_json::json!({
            "update_id": 11,
            "message": {
                "message_id": 6,
                "chat": {"id": 42},
                "from": {"id": 42, "first_name": "Ada", "last_name": "Lovelace"},
                "text": "/start@opencode_bot"
            }
        })));

        assert_eq!(
            event,
            Some(InboundEvent::Start {
                chat_id: 42,
                sender: Some(SenderId(42)),
                sender_name: Some("Ada Lovelace".to_string()),
            })
        );
    }

    #[test]
    fn plain_text_is_a_message_without_data() {
        let event = to_event(update(serde_json::json!({
            "update_id": 12,
            "message": {"message_id": 7, "chat": {"id": 42}, "from": {"id": 42, "first_name": "Ada"}, "text": "hello"}
        })));

        assert_eq!(
            event,
            Some(InboundEvent::Message {
                chat_id: 42,
                sender: Some(SenderId(42)),
                web_app_data: None,
            })
        );
    }

    #[test]
    fn other_commands_and_non_message_updates_are_dropped() {
        let help = update(serde_json::json!({
            "update_id": 13,
            "message": {"message_id": 8, "chat": {"id": 42}, "text": "/help"}
        }));
        assert_eq!(to_event(help), None);

        let edited = update(serde_json::json!({
            "update_id": 14,
            "edited_message": {"message_id": 8, "chat": {"id": 42}, "text": "x"}
        }));
        assert_eq!(to_event(edited), None);
    }

    #[test]
    fn message_without_sender_keeps_sender_empty() {
        let event = to_event(update(serde_json::json!({
            "update_id": 15,
            "message": {"message_id": 9, "chat": {"id": -100}, "web_app_data": {"data": "x", "button_text": "b"}}
        })));
        assert_eq!(event.and_then(|e| e.sender()), None);
    }

    #[test]
    fn command_names_are_parsed() {
        assert_eq!(command_name("/start"), Some("start"));
        assert_eq!(command_name("/start payload"), Some("start"));
        assert_eq!(command_name("/start@bot"), Some("start"));
        assert_eq!(command_name("start"), None);
        assert_eq!(command_name("/"), None);
    }

    #[test]
    fn decode_returns_the_result() {
        let body = r#"{"ok":true,"result":[{"update_id":1}]}"#;
        let updates: Vec<Update> = decode(StatusCode::OK, body).unwrap();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].message.is_none());
    }

    #[test]
    fn decode_maps_api_errors() {
        let body = r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#;
        let err = decode::<bool>(StatusCode::UNAUTHORIZED, body).unwrap_err();
        assert!(matches!(err, RelayError::Telegram { code: 401, .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn decode_handles_non_json_error_pages() {
        let err = decode::<bool>(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, RelayError::Telegram { code: 502, .. }));
        assert!(!err.is_fatal());

        let err = decode::<bool>(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, RelayError::Json(_)));
    }

    #[test]
    fn keyboard_serializes_as_a_web_app_button() {
        let message = OutboundMessage::text(42, "hi").with_button(WebAppButton {
            text: "🚀 Launch OpenCode".to_string(),
            url: "https://example.com/app".to_string(),
        });
        let params = send_params(&message);

        let json = serde_json::to_value(&params).unwrap();
        let button = &json["reply_markup"]["keyboard"][0][0];
        assert_eq!(button["text"], "🚀 Launch OpenCode");
        assert_eq!(button["web_app"]["url"], "https://example.com/app");
        assert_eq!(json["reply_markup"]["resize_keyboard"], true);

        let plain = OutboundMessage::text(1, "x");
        assert!(serde_json::to_value(send_params(&plain)).unwrap().get("reply_markup").is_none());
    }

    #[test]
    fn debug_output_hides_the_token() {
        let url = Url::parse("https://api.telegram.org").unwrap();
        let client = TelegramClient::new(&url, "123:very-secret", Duration::from_secs(30)).unwrap();
        assert!(!format!("{client:?}").contains("very-secret"));
        assert_eq!(
            client.method_url("getMe"),
            "https://api.telegram.org/bot123:very-secret/getMe"
        );
    }
}
