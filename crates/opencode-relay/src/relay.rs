//! Main relay loop orchestration.

use crate::error::RelayResult;
use crate::transport::{ChatTransport, InboundEvent, OutboundMessage, WebAppButton};
use prompt_gate::{
    AuditEvent, AuditRecord, AuditSink, Gatekeeper, RejectionKind, Request, SanitizedPrompt,
    SenderId, Verdict,
};
use std::sync::Arc;
use std::time::Duration;
use terminal_launcher::{Launcher, USER_FACING_FAILURE};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const LAUNCH_BUTTON_TEXT: &str = "🚀 Launch OpenCode";
pub const NO_DATA_TEXT: &str = "Error: No data received from Mini App.";

/// Characters of the prompt echoed back in the confirmation.
const PREVIEW_CHARS: usize = 100;

/// How a single inbound event ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `/start` from the allowed sender; the Mini App button was offered.
    Welcomed,
    /// Refused. `visible` is false for unauthorized senders, who get no reply.
    Rejected { visible: bool },
    Launched { pid: Option<u32> },
    LaunchFailed,
}

/// Pause after a failed poll: `first` after one failure, `repeated` while
/// failures keep coming.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub first: Duration,
    pub repeated: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            repeated: Duration::from_secs(5),
        }
    }
}

impl Backoff {
    fn delay(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures <= 1 {
            self.first
        } else {
            self.repeated
        }
    }
}

/// Single-worker relay between the chat transport, the gate and the launcher.
pub struct Relay<T> {
    transport: T,
    gatekeeper: Gatekeeper,
    launcher: Launcher,
    audit: Arc<dyn AuditSink>,
    mini_app_url: String,
    backoff: Backoff,
}

impl<T: ChatTransport> Relay<T> {
    pub fn new(
        transport: T,
        gatekeeper: Gatekeeper,
        launcher: Launcher,
        audit: Arc<dyn AuditSink>,
        mini_app_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            gatekeeper,
            launcher,
            audit,
            mini_app_url: mini_app_url.into(),
            backoff: Backoff::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run the relay loop until a fatal error.
    ///
    /// Events are handled one at a time in arrival order. A failed poll is
    /// logged and followed by a pause; events are never retried.
    pub async fn run(&mut self) -> RelayResult<()> {
        info!(
            allowed_sender = %self.gatekeeper.config().allowed_sender,
            max_prompt_chars = self.gatekeeper.config().max_prompt_chars,
            "Starting relay loop"
        );

        let mut consecutive_failures: u32 = 0;
        loop {
            match self.transport.next_events().await {
                Ok(events) => {
                    consecutive_failures = 0;
                    if events.is_empty() {
                        debug!("No updates, continuing to poll...");
                    }
                    for event in events {
                        self.handle(event).await;
                    }
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Fatal transport error, stopping");
                    return Err(e);
                }
                Err(e) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    let delay = self.backoff.delay(consecutive_failures);
                    warn!(
                        error = %e,
                        consecutive_failures,
                        delay_ms = delay.as_millis() as u64,
                        "Polling failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Handle one event to completion, including the reply.
    pub async fn handle(&self, event: InboundEvent) -> Outcome {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "event",
            request_id = %request_id,
            kind = event.kind(),
            chat_id = event.chat_id()
        );
        self.dispatch(request_id, event).instrument(span).await
    }

    async fn dispatch(&self, request_id: Uuid, event: InboundEvent) -> Outcome {
        match event {
            InboundEvent::Start {
                chat_id,
                sender,
                sender_name,
            } => self.start(request_id, chat_id, sender, sender_name).await,
            InboundEvent::Message {
                chat_id,
                sender,
                web_app_data,
            } => self.prompt(request_id, chat_id, sender, web_app_data).await,
        }
    }

    async fn start(
        &self,
        request_id: Uuid,
        chat_id: i64,
        sender: Option<SenderId>,
        sender_name: Option<String>,
    ) -> Outcome {
        if !self.gatekeeper.is_allowed(sender) {
            self.gatekeeper
                .evaluate(request_id, &Request::new(sender, "/start"));
            return Outcome::Rejected { visible: false };
        }

        info!(sender = ?sender, "Sending Mini App button");
        let name = sender_name.as_deref().unwrap_or("there");
        let welcome = format!(
            "👋 Hello, {name}!\n\n\
             I'm your OpenCode Bot. I can help you run OpenCode commands remotely.\n\n\
             Click the button below to open the Mini App and enter your prompt."
        );
        self.reply(
            OutboundMessage::text(chat_id, welcome).with_button(WebAppButton {
                text: LAUNCH_BUTTON_TEXT.to_string(),
                url: self.mini_app_url.clone(),
            }),
        )
        .await;
        Outcome::Welcomed
    }

    async fn prompt(
        &self,
        request_id: Uuid,
        chat_id: i64,
        sender: Option<SenderId>,
        web_app_data: Option<String>,
    ) -> Outcome {
        let Some(raw_text) = web_app_data else {
            if !self.gatekeeper.is_allowed(sender) {
                self.gatekeeper.evaluate(request_id, &Request::new(sender, ""));
                return Outcome::Rejected { visible: false };
            }
            warn!(sender = ?sender, "Message without Mini App data");
            self.reply(OutboundMessage::text(chat_id, NO_DATA_TEXT)).await;
            return Outcome::Rejected { visible: true };
        };

        let request = Request::new(sender, raw_text);
        match self.gatekeeper.evaluate(request_id, &request) {
            Verdict::Allowed(prompt) => {
                self.launch(request_id, chat_id, sender, &prompt).await
            }
            Verdict::Rejected(RejectionKind::Unauthorized) => Outcome::Rejected { visible: false },
            Verdict::Rejected(kind) => {
                let reason = kind.user_message().unwrap_or_default();
                self.reply(OutboundMessage::text(chat_id, format!("❌ Error: {reason}")))
                    .await;
                Outcome::Rejected { visible: true }
            }
        }
    }

    async fn launch(
        &self,
        request_id: Uuid,
        chat_id: i64,
        sender: Option<SenderId>,
        prompt: &SanitizedPrompt,
    ) -> Outcome {
        match self.launcher.launch(prompt).await {
            Ok(handle) => {
                self.audit.record(AuditRecord::new(
                    request_id,
                    sender,
                    AuditEvent::launched(handle.pid),
                ));
                info!(pid = ?handle.pid, prompt_chars = prompt.char_count(), "Prompt launched");
                self.reply(OutboundMessage::text(chat_id, confirmation(prompt.literal())))
                    .await;
                Outcome::Launched { pid: handle.pid }
            }
            Err(e) => {
                self.audit.record(AuditRecord::new(
                    request_id,
                    sender,
                    AuditEvent::launch_failed(e.code(), e.to_string()),
                ));
                error!(error = %e, code = e.code(), "Launch failed");
                self.reply(OutboundMessage::text(chat_id, USER_FACING_FAILURE))
                    .await;
                Outcome::LaunchFailed
            }
        }
    }

    async fn reply(&self, message: OutboundMessage) {
        if let Err(e) = self.transport.send(message).await {
            error!(error = %e, "Failed to send reply");
        }
    }
}

/// Success text with the first [`PREVIEW_CHARS`] characters of the prompt.
fn confirmation(prompt: &str) -> String {
    format!(
        "✅ Command sent to the terminal!\n\n\
         📝 Your prompt: {}\n\n\
         💻 A terminal window should now be open with OpenCode running.",
        preview(prompt)
    )
}

fn preview(prompt: &str) -> String {
    let mut chars = prompt.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
