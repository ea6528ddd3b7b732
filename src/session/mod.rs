//! Session orchestration: per-session chat history, dispatch of user actions
//! to the services, narration of replies.
//!
//! Text chat records a [`ChatTurn`] per successful exchange. Voice chat and
//! follow-up questions about extracted text do not touch the history.

pub mod display;
mod services;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub use services::Services;

use crate::llm::CompletionError;
use crate::stt::RecognitionResult;
use crate::tts::NarrationError;
use crate::vision::{ExtractError, Extraction};

/// Prefix of narrated answers to follow-up questions.
const FOLLOW_UP_PREFIX: &str = "Based on the extracted text: ";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("input is empty")]
    EmptyInput,
    #[error("no extracted text to ask about")]
    NoExtraction,
    #[error("nothing recognized: {0:?}")]
    NotHeard(RecognitionResult),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Extraction(#[from] ExtractError),
}

/// One successful text exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub user_text: String,
    pub assistant_text: String,
    pub created_at: DateTime<Utc>,
}

/// A voice exchange: what was heard and the reply to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceExchange {
    pub heard: String,
    pub reply: String,
}

pub struct Session {
    services: Services,
    history: Vec<ChatTurn>,
    narration_enabled: bool,
    last_extraction: Option<Extraction>,
}

impl Session {
    pub fn new(services: Services, narration_enabled: bool) -> Self {
        Self {
            services,
            history: Vec::new(),
            narration_enabled,
            last_extraction: None,
        }
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn narration_enabled(&self) -> bool {
        self.narration_enabled
    }

    pub fn set_narration(&mut self, enabled: bool) {
        info!(enabled, "Narration toggled");
        self.narration_enabled = enabled;
    }

    pub fn last_extraction(&self) -> Option<&Extraction> {
        self.last_extraction.as_ref()
    }

    /// Send typed text to the model. On success the turn is recorded, then
    /// the reply is narrated.
    pub async fn text_chat(&mut self, text: &str) -> Result<ChatTurn, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let reply = self.services.conversation.ask(text, None).await?;

        let turn = ChatTurn {
            user_text: text.to_string(),
            assistant_text: reply,
            created_at: Utc::now(),
        };
        self.history.push(turn.clone());
        debug!(turns = self.history.len(), "Chat turn recorded");

        self.narrate(&turn.assistant_text);
        Ok(turn)
    }

    /// Listen for one spoken question and answer it. `on_heard` runs with
    /// the recognized text before the model is asked.
    pub async fn voice_chat(
        &mut self,
        on_heard: impl FnOnce(&str),
    ) -> Result<VoiceExchange, SessionError> {
        let heard = match self.services.capturer.listen().await {
            RecognitionResult::Utterance(text) => text,
            other => return Err(SessionError::NotHeard(other)),
        };
        on_heard(&heard);

        let reply = self.services.conversation.ask(&heard, None).await?;
        self.narrate(&reply);
        Ok(VoiceExchange { heard, reply })
    }

    /// Run OCR on an encoded image. The result becomes the subject of later
    /// follow-up questions; a failure clears it.
    pub async fn extract_text(&mut self, image: Vec<u8>) -> Result<Extraction, SessionError> {
        match self.services.extractor.extract_image_async(image).await {
            Ok(extraction) => {
                self.last_extraction = Some(extraction.clone());
                Ok(extraction)
            }
            Err(e) => {
                self.last_extraction = None;
                Err(e.into())
            }
        }
    }

    /// Ask a question about the last extraction. The returned text carries
    /// the same prefix that is narrated.
    pub async fn ask_about_extraction(&self, question: &str) -> Result<String, SessionError> {
        let extraction = self.last_extraction.as_ref().ok_or(SessionError::NoExtraction)?;
        if question.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let prompt = format!("Based on this extracted text: '{extraction}'\n\nQuestion: {question}");
        let answer = self.services.conversation.ask(&prompt, None).await?;

        let reply = format!("{FOLLOW_UP_PREFIX}{answer}");
        self.narrate(&reply);
        Ok(reply)
    }

    fn narrate(&self, text: &str) {
        if !self.narration_enabled {
            return;
        }
        match self.services.narrator.narrate(text) {
            Ok(()) | Err(NarrationError::Disabled) => {}
            Err(e) => debug!("Narration skipped: {}", e),
        }
    }

    /// Stop the narrator, letting queued speech finish.
    pub fn shutdown(&mut self) {
        self.services.narrator.shutdown();
    }
}
