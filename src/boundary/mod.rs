//! Boundary contracts for external collaborators.
//!
//! Speech capture, text-to-speech, and rendering live outside the core;
//! they feed and consume plain strings through these seams. Concrete
//! implementations belong to the embedding application (the driver binary
//! ships line-oriented stdin/stdout ones).

use async_trait::async_trait;

use crate::catalog::Question;
use crate::error::AppResult;

/// One chunk of recognized or typed input.
///
/// Partial events grow the session draft; only final events (or an
/// explicit user confirmation) are eligible to commit.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEvent {
    /// The recognized text so far.
    pub text: String,
    /// Whether the recognizer considers this utterance complete.
    pub is_final: bool,
}

impl TranscriptEvent {
    /// A partial, still-growing transcript
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    /// A completed utterance
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Source of transcript events: a speech recognizer or a text input.
#[async_trait]
pub trait TranscriptSource: Send {
    /// Next event, or `None` when the input is exhausted.
    async fn next_event(&mut self) -> AppResult<Option<TranscriptEvent>>;
}

/// Renders or speaks the current question. The core only supplies the
/// strings.
#[async_trait]
pub trait PromptSink: Send + Sync {
    /// Present a question to the user.
    async fn present(&self, question: &Question) -> AppResult<()>;
    /// Surface a user-correctable error inline, leaving the current
    /// question displayed.
    async fn present_error(&self, message: &str) -> AppResult<()>;
}
