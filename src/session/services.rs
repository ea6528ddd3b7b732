//! Process-wide services, built once at startup and handed to the session.

use std::sync::Arc;

use tracing::{info, warn};

use crate::audio::Microphone;
use crate::config::AssistantConfig;
use crate::llm::{CompletionConfig, ConversationEngine};
use crate::stt::listener::StateObserver;
use crate::stt::{create_stt_engine, ListenSettings, SpeechCapturer, SttEngine, UnavailableStt};
use crate::tts::{create_tts_engine, AudioPlayer, AudioSink, Narrator, TtsEngine, SPEECH_VOLUME};
use crate::vision::{create_ocr_engine, TextExtractor};

pub struct Services {
    pub extractor: TextExtractor,
    pub capturer: SpeechCapturer,
    pub conversation: ConversationEngine,
    pub narrator: Narrator,
}

impl Services {
    pub fn new(
        extractor: TextExtractor,
        capturer: SpeechCapturer,
        conversation: ConversationEngine,
        narrator: Narrator,
    ) -> Self {
        Self {
            extractor,
            capturer,
            conversation,
            narrator,
        }
    }

    /// Construct the production services from config.
    ///
    /// A missing completion credential, an unusable speech adapter setting
    /// or a broken audio output only disables the feature that needs it.
    pub fn build(
        config: &AssistantConfig,
        completion: Option<CompletionConfig>,
        observer: Option<StateObserver>,
    ) -> Self {
        let ocr = create_ocr_engine(&config.ocr.tesseract_cmd, &config.ocr.language);
        info!(engine = %ocr.name(), "OCR engine selected");
        let extractor = TextExtractor::new(Arc::from(ocr));

        let speech = &config.speech;
        let stt = create_stt_engine(
            &speech.adapter,
            speech.api_key.as_deref(),
            speech.endpoint.as_deref(),
            speech.model.as_deref(),
        )
        .unwrap_or_else(|e| -> Box<dyn SttEngine> {
            warn!(adapter = %speech.adapter, "Voice chat disabled: {:#}", e);
            Box::new(UnavailableStt::new(e.to_string()))
        });
        info!(engine = %stt.name(), "STT engine selected");
        let settings = ListenSettings {
            locale: speech.locale.clone(),
            ..ListenSettings::default()
        };
        let mut capturer = SpeechCapturer::new(
            Arc::new(Microphone::new(speech.input_device.clone())),
            Arc::from(stt),
            settings,
        );
        if let Some(observer) = observer {
            capturer = capturer.with_observer(observer);
        }

        let conversation = ConversationEngine::new(completion);

        let narration = config.narration.clone();
        let narrator = Narrator::start(Box::new(
            move || -> anyhow::Result<(Box<dyn TtsEngine>, Box<dyn AudioSink>)> {
                let engine = create_tts_engine(
                    &narration.adapter,
                    narration.voice.as_deref(),
                    narration.api_key.as_deref(),
                    narration.endpoint.as_deref(),
                )?;
                let player = AudioPlayer::new(narration.output_device.as_deref(), SPEECH_VOLUME)?;
                Ok((engine, Box::new(player)))
            },
        ));

        Self::new(extractor, capturer, conversation, narrator)
    }
}
