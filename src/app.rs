use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use crate::agent::{AgentClient, AskReply};

pub const FALLBACK_ERROR_MESSAGE: &str =
    "Sorry, there was an error processing your request. Please try again.";

const WELCOME_MESSAGE: &str = "Hello! I'm your CDP Support Assistant. \
    How can I help you with your Customer Data Platform questions today?";

/// Sentinel the backend's identifier step uses for "not identified".
/// Arrives as a real string, distinct from JSON null.
const NONE_SENTINEL: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AwaitingResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Plain(String),
    /// Answer annotated with the platform it concerns and, when
    /// identified, the specific task.
    Annotated {
        platform: String,
        task: Option<String>,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub body: MessageBody,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            body: MessageBody::Plain(text.into()),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Bot,
            body: MessageBody::Plain(text.into()),
        }
    }

    /// Classify an agent reply. Platform and task annotate the message
    /// only when present and not the "None" sentinel.
    pub fn from_reply(reply: AskReply) -> Self {
        let AskReply { answer, cdp, task } = reply;
        match cdp.filter(|c| c != NONE_SENTINEL) {
            Some(platform) => Self {
                role: ChatRole::Bot,
                body: MessageBody::Annotated {
                    platform,
                    task: task.filter(|t| t != NONE_SENTINEL),
                    text: answer,
                },
            },
            None => Self::bot(answer),
        }
    }

    /// The answer text, without any annotation.
    pub fn text(&self) -> &str {
        match &self.body {
            MessageBody::Plain(text) => text,
            MessageBody::Annotated { text, .. } => text,
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub phase: SessionPhase,

    // Input state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Chat state
    pub messages: Vec<ChatMessage>,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // In-flight work
    pub ask_task: Option<JoinHandle<Result<AskReply>>>,
    pub cdps_task: Option<JoinHandle<Result<Vec<String>>>>,

    pub agent: AgentClient,
}

impl App {
    pub fn new(agent: AgentClient) -> Self {
        Self {
            should_quit: false,
            phase: SessionPhase::Idle,

            input: String::new(),
            cursor: 0,

            messages: Vec::new(),
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            ask_task: None,
            cdps_task: None,

            agent,
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.phase == SessionPhase::AwaitingResponse
    }

    pub fn greet(&mut self) {
        self.push_message(ChatMessage::bot(WELCOME_MESSAGE));
    }

    /// Kick off the startup fetch of supported platform names. The
    /// result is picked up by `poll_platforms`.
    pub fn fetch_supported_cdps(&mut self) {
        let agent = self.agent.clone();
        self.cdps_task = Some(tokio::spawn(async move { agent.supported_cdps().await }));
    }

    /// Send the current input as a question. Silent no-op while a
    /// request is outstanding or when the trimmed input is empty.
    pub fn send_question(&mut self) {
        if self.is_awaiting() {
            return;
        }
        let question = self.input.trim().to_string();
        if question.is_empty() {
            return;
        }

        debug!(question = %question, "sending question");

        self.push_message(ChatMessage::user(question.clone()));
        self.input.clear();
        self.cursor = 0;
        self.phase = SessionPhase::AwaitingResponse;
        self.scroll_to_bottom();

        let agent = self.agent.clone();
        self.ask_task = Some(tokio::spawn(async move { agent.ask(&question).await }));
    }

    /// Pick up a finished ask request, if any.
    pub async fn poll_response(&mut self) {
        if !self.ask_task.as_ref().is_some_and(|t| t.is_finished()) {
            return;
        }
        if let Some(task) = self.ask_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(err) => Err(anyhow::anyhow!("ask task panicked: {err}")),
            };
            self.finish_request(result);
        }
    }

    /// Completion path for the ask flow. Runs for success and failure
    /// alike and always returns the session to `Idle`. The typing
    /// indicator goes away with the phase, before the reply lands.
    pub fn finish_request(&mut self, result: Result<AskReply>) {
        self.phase = SessionPhase::Idle;
        self.animation_frame = 0;
        match result {
            Ok(reply) => self.push_message(ChatMessage::from_reply(reply)),
            Err(err) => {
                warn!(error = %err, "ask request failed");
                self.push_message(ChatMessage::bot(FALLBACK_ERROR_MESSAGE));
            }
        }
    }

    /// Pick up the startup platforms fetch, if finished. Failures stay
    /// off-screen: the only visible effect of success is the platform
    /// list message.
    pub async fn poll_platforms(&mut self) {
        if !self.cdps_task.as_ref().is_some_and(|t| t.is_finished()) {
            return;
        }
        if let Some(task) = self.cdps_task.take() {
            match task.await {
                Ok(Ok(cdps)) if !cdps.is_empty() => self.announce_platforms(&cdps),
                Ok(Ok(_)) => debug!("server reported no supported CDPs"),
                Ok(Err(err)) => warn!(error = %err, "failed to fetch supported CDPs"),
                Err(err) => warn!(error = %err, "supported CDPs task panicked"),
            }
        }
    }

    pub fn announce_platforms(&mut self, cdps: &[String]) {
        let cdp_list = cdps.join(", ");
        self.push_message(ChatMessage::bot(format!(
            "I can answer questions about these CDP platforms: {}. What would you like to know?",
            cdp_list
        )));
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.scroll_to_bottom();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_awaiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat scrolling
    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        if self.chat_scroll < self.max_scroll() {
            self.chat_scroll = self.chat_scroll.saturating_add(1);
        }
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.visible_height() / 2;
        self.chat_scroll = self.chat_scroll.saturating_sub(half_page);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.visible_height() / 2;
        self.chat_scroll = (self.chat_scroll + half_page).min(self.max_scroll());
    }

    /// Scroll so the newest entry (and the typing indicator, when a
    /// request is in flight) is visible.
    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        self.total_chat_lines().saturating_sub(self.visible_height())
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    /// Rendered line count of the whole chat, accounting for wrapping
    /// at the current chat width.
    fn total_chat_lines(&self) -> u16 {
        // Default to 50 columns until the first render fills in the size
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in &self.messages {
            total_lines += 1; // Role line ("You:" or "Agent:")
            if matches!(msg.body, MessageBody::Annotated { .. }) {
                total_lines += 1; // Badge line
            }
            for line in msg.text().lines() {
                // Character count, not byte length, for UTF-8 content
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.is_awaiting() {
            total_lines += 2; // Role line + typing indicator
        }

        total_lines
    }
}
