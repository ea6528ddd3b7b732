//! User-facing wording for session results.

use crate::llm::CompletionError;
use crate::stt::RecognitionResult;

use super::SessionError;

pub const AI_UNAVAILABLE: &str = "❌ AI service not available. Please check your API configuration.";
pub const LISTEN_TIMEOUT: &str = "⏰ Listening timeout. Please try again.";
pub const NOT_UNDERSTOOD: &str = "🤷 Sorry, I couldn't understand that. Please speak more clearly.";

/// Message shown for a failed session operation.
pub fn error_message(err: &SessionError) -> String {
    match err {
        SessionError::EmptyInput => "Please type a question first.".into(),
        SessionError::NoExtraction => "Extract text from an image before asking about it.".into(),
        SessionError::Completion(CompletionError::NotConfigured) => AI_UNAVAILABLE.into(),
        SessionError::Completion(e) => format!("❌ Error communicating with AI: {e}"),
        SessionError::Extraction(e) => format!("❌ Error extracting text: {e}"),
        SessionError::NotHeard(result) => recognition_message(result),
    }
}

/// Message for a recognition outcome that produced no utterance.
pub fn recognition_message(result: &RecognitionResult) -> String {
    match result {
        RecognitionResult::Utterance(text) => text.clone(),
        RecognitionResult::TimedOut => LISTEN_TIMEOUT.into(),
        RecognitionResult::Unintelligible => NOT_UNDERSTOOD.into(),
        RecognitionResult::ServiceError(detail) => {
            format!("❌ Speech recognition service error: {detail}")
        }
        RecognitionResult::UnknownError(detail) => format!("❌ Unexpected error: {detail}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::ExtractError;

    #[test]
    fn completion_errors() {
        assert_eq!(
            error_message(&SessionError::Completion(CompletionError::NotConfigured)),
            AI_UNAVAILABLE
        );
        let msg = error_message(&SessionError::Completion(CompletionError::Api {
            status: 401,
            body: "invalid key".into(),
        }));
        assert_eq!(msg, "❌ Error communicating with AI: API returned 401: invalid key");
    }

    #[test]
    fn recognition_outcomes() {
        assert_eq!(
            error_message(&SessionError::NotHeard(RecognitionResult::TimedOut)),
            LISTEN_TIMEOUT
        );
        assert_eq!(
            recognition_message(&RecognitionResult::Unintelligible),
            NOT_UNDERSTOOD
        );
        assert_eq!(
            recognition_message(&RecognitionResult::ServiceError("quota".into())),
            "❌ Speech recognition service error: quota"
        );
        assert_eq!(
            recognition_message(&RecognitionResult::UnknownError("no mic".into())),
            "❌ Unexpected error: no mic"
        );
    }

    #[test]
    fn extraction_error_is_prefixed() {
        let msg = error_message(&SessionError::Extraction(ExtractError::EngineUnavailable(
            "tesseract not found".into(),
        )));
        assert_eq!(msg, "❌ Error extracting text: tesseract not found");
    }
}
