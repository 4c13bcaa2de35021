//! Chat session state machine.
//!
//! A session owns the transcript for one document. Submitting a question
//! appends the user message immediately and hands back a [`PendingAsk`];
//! the answer (or failure) is applied later through [`ChatSession::resolve`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::DocumentApi;
use crate::error::InsightResult;
use crate::types::Message;

/// Appended when the backend fails to answer
pub const APOLOGY_MESSAGE: &str = "Sorry, I couldn't get an answer for that. Please try again.";

/// Identifier of one outstanding `ask` request within a session
pub type RequestId = u64;

/// Whether the session is waiting for the assistant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    #[default]
    Idle,
    AwaitingReply,
}

/// How resolutions of superseded requests are treated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReplyPolicy {
    /// Only the most recently issued request may append and go idle
    #[default]
    LatestOnly,
    /// Every resolution appends and returns the session to idle
    Unconditional,
}

/// A question that must be sent to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAsk {
    pub request_id: RequestId,
    pub question: String,
}

/// Transcript and in-flight state for one document
#[derive(Debug, Clone)]
pub struct ChatSession {
    document_name: Option<String>,
    transcript: Vec<Message>,
    input: String,
    state: ChatState,
    policy: ReplyPolicy,
    next_request_id: RequestId,
    in_flight: Option<RequestId>,
}

impl ChatSession {
    /// Create a session seeded with the assistant greeting
    pub fn new(document_name: Option<&str>) -> Self {
        Self::with_policy(document_name, ReplyPolicy::default())
    }

    pub fn with_policy(document_name: Option<&str>, policy: ReplyPolicy) -> Self {
        let greeting = Message::assistant(format!(
            "Hi there! I'm ready to answer questions about {} once it's processed. How can I help you today?",
            document_name.unwrap_or("your document")
        ));

        Self {
            document_name: document_name.map(str::to_string),
            transcript: vec![greeting],
            input: String::new(),
            state: ChatState::Idle,
            policy,
            next_request_id: 1,
            in_flight: None,
        }
    }

    pub fn document_name(&self) -> Option<&str> {
        self.document_name.as_deref()
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn policy(&self) -> ReplyPolicy {
        self.policy
    }

    /// Whether the assistant is responding
    pub fn is_awaiting_reply(&self) -> bool {
        self.state == ChatState::AwaitingReply
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the input buffer
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Whether the current input would be accepted by [`submit_input`](Self::submit_input)
    pub fn can_submit(&self) -> bool {
        !self.input.trim().is_empty()
    }

    /// Submit the current input buffer
    pub fn submit_input(&mut self) -> Option<PendingAsk> {
        let text = std::mem::take(&mut self.input);
        let pending = self.submit(&text);
        if pending.is_none() {
            self.input = text;
        }
        pending
    }

    /// Append a user question and start a request for it.
    ///
    /// Blank text is ignored and returns `None`.
    pub fn submit(&mut self, text: &str) -> Option<PendingAsk> {
        if text.trim().is_empty() {
            return None;
        }

        self.transcript.push(Message::user(text));
        self.input.clear();

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        if let Some(previous) = self.in_flight.replace(request_id) {
            debug!(previous, request_id, "Superseding in-flight request");
        }
        self.state = ChatState::AwaitingReply;

        Some(PendingAsk {
            request_id,
            question: text.to_string(),
        })
    }

    /// Apply the outcome of a request.
    ///
    /// Returns `true` when the outcome changed the transcript.
    pub fn resolve(&mut self, request_id: RequestId, outcome: InsightResult<String>) -> bool {
        if self.policy == ReplyPolicy::LatestOnly && self.in_flight != Some(request_id) {
            warn!(
                request_id,
                in_flight = ?self.in_flight,
                "Dropping reply for superseded request"
            );
            return false;
        }

        let content = match outcome {
            Ok(content) => content,
            Err(e) => {
                warn!(request_id, "Ask failed: {}", e);
                APOLOGY_MESSAGE.to_string()
            }
        };

        self.transcript.push(Message::assistant(content));
        self.in_flight = None;
        self.state = ChatState::Idle;
        true
    }

    /// Submit a question, wait for the backend, and apply the reply.
    ///
    /// Returns the assistant message, or `None` when the text was blank.
    pub async fn ask<A>(&mut self, api: &A, text: &str) -> Option<&Message>
    where
        A: DocumentApi + ?Sized,
    {
        let pending = self.submit(text)?;
        let outcome = api.ask(&pending.question).await;
        if self.resolve(pending.request_id, outcome) {
            self.transcript.last()
        } else {
            None
        }
    }
}
