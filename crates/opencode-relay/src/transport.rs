//! The seam between the relay loop and the chat platform.

use crate::error::RelayResult;
use async_trait::async_trait;
use prompt_gate::SenderId;

/// One inbound chat event, already reduced to what the relay acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// The `/start` command.
    Start {
        chat_id: i64,
        sender: Option<SenderId>,
        sender_name: Option<String>,
    },
    /// Any other message. `web_app_data` is the Mini App payload, if any.
    Message {
        chat_id: i64,
        sender: Option<SenderId>,
        web_app_data: Option<String>,
    },
}

impl InboundEvent {
    pub fn chat_id(&self) -> i64 {
        match self {
            Self::Start { chat_id, .. } | Self::Message { chat_id, .. } => *chat_id,
        }
    }

    pub fn sender(&self) -> Option<SenderId> {
        match self {
            Self::Start { sender, .. } | Self::Message { sender, .. } => *sender,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Message { .. } => "message",
        }
    }
}

/// A reply keyboard with a single button that opens the Mini App.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAppButton {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    pub button: Option<WebAppButton>,
}

impl OutboundMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            button: None,
        }
    }

    pub fn with_button(mut self, button: WebAppButton) -> Self {
        self.button = Some(button);
        self
    }
}

/// Chat platform as seen by the relay.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Wait for the next batch of events. May return an empty batch when the
    /// long poll times out.
    async fn next_events(&mut self) -> RelayResult<Vec<InboundEvent>>;

    /// Deliver one message. Failures are reported, never retried.
    async fn send(&self, message: OutboundMessage) -> RelayResult<()>;
}
