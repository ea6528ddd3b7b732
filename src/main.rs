//! Assistant core entry point.
//!
//! Communicates with the front end via JSON-line IPC on stdin/stdout.
//! Builds the services, then handles one command at a time until `stop`
//! or until stdin closes.

use std::sync::Arc;

use base64::Engine as _;
use tracing::{error, info};
use uuid::Uuid;

use assistant_core::audio::{list_input_devices, list_output_devices, CaptureState};
use assistant_core::config::{self, paths};
use assistant_core::ipc::bridge::{emit_error, emit_event, spawn_stdin_reader};
use assistant_core::ipc::{AssistantCommand, AssistantEvent, AudioDeviceInfo};
use assistant_core::llm::CompletionConfig;
use assistant_core::logging;
use assistant_core::session::display::error_message;
use assistant_core::session::{Services, Session};
use assistant_core::stt::listener::StateObserver;

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init(&paths::get_log_dir()) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    config::load_dotenv();

    // Emit starting event immediately so the front end knows we're alive.
    emit_event(&AssistantEvent::Starting {});

    emit_event(&AssistantEvent::Loading {
        step: "Reading configuration...".to_string(),
    });
    let assistant_config = config::read_assistant_config();
    info!(
        stt = %assistant_config.speech.adapter,
        tts = %assistant_config.narration.adapter,
        narration = assistant_config.narration.enabled,
        "Configuration loaded"
    );

    let completion = match CompletionConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Completion endpoint misconfigured: {}", e);
            emit_error(&e.to_string());
            None
        }
    };

    emit_event(&AssistantEvent::Loading {
        step: "Starting services...".to_string(),
    });
    let observer: StateObserver = Arc::new(|state: CaptureState| {
        emit_event(&AssistantEvent::CaptureState {
            state: state.to_string(),
        });
    });
    let services = Services::build(&assistant_config, completion, Some(observer));
    let mut session = Session::new(services, assistant_config.narration.enabled);

    emit_event(&AssistantEvent::Loading {
        step: "Starting IPC bridge...".to_string(),
    });
    let mut cmd_rx = spawn_stdin_reader();

    emit_event(&AssistantEvent::Ready {});
    info!("Assistant core ready");

    // Commands are handled strictly one after another.
    while let Some(command) = cmd_rx.recv().await {
        if !handle_command(&mut session, command).await {
            break;
        }
    }

    info!("Assistant core shutting down");
    session.shutdown();
}

/// Handle a single command.
/// Returns `false` if the main loop should exit.
async fn handle_command(session: &mut Session, cmd: AssistantCommand) -> bool {
    match cmd {
        AssistantCommand::Ping {} => {
            emit_event(&AssistantEvent::Pong {});
        }

        AssistantCommand::Stop {} => {
            emit_event(&AssistantEvent::Stopping {});
            return false;
        }

        AssistantCommand::TextChat { text } => match session.text_chat(&text).await {
            Ok(turn) => emit_event(&AssistantEvent::Reply {
                msg_id: Uuid::new_v4().to_string(),
                user_text: turn.user_text,
                text: turn.assistant_text,
                source: "text".into(),
            }),
            Err(e) => emit_error(&error_message(&e)),
        },

        AssistantCommand::VoiceChat {} => {
            let result = session
                .voice_chat(|heard| {
                    emit_event(&AssistantEvent::Transcription {
                        text: heard.to_string(),
                    })
                })
                .await;
            match result {
                Ok(exchange) => emit_event(&AssistantEvent::Reply {
                    msg_id: Uuid::new_v4().to_string(),
                    user_text: exchange.heard,
                    text: exchange.reply,
                    source: "voice".into(),
                }),
                Err(e) => emit_error(&error_message(&e)),
            }
        }

        AssistantCommand::ExtractText { path, image } => {
            let bytes = match load_image(path.as_deref(), image.as_deref()).await {
                Ok(b) => b,
                Err(e) => {
                    emit_error(&format!("❌ Error extracting text: {e}"));
                    return true;
                }
            };
            match session.extract_text(bytes).await {
                Ok(extraction) => emit_event(&AssistantEvent::Extraction {
                    found: extraction.text().is_some(),
                    text: extraction.to_string(),
                }),
                Err(e) => emit_error(&error_message(&e)),
            }
        }

        AssistantCommand::AskAboutText { question } => {
            match session.ask_about_extraction(&question).await {
                Ok(reply) => emit_event(&AssistantEvent::Reply {
                    msg_id: Uuid::new_v4().to_string(),
                    user_text: question,
                    text: reply,
                    source: "extraction".into(),
                }),
                Err(e) => emit_error(&error_message(&e)),
            }
        }

        AssistantCommand::History {} => {
            emit_event(&AssistantEvent::History {
                turns: session.history().to_vec(),
            });
        }

        AssistantCommand::SetNarration { enabled } => {
            session.set_narration(enabled);
            emit_event(&AssistantEvent::NarrationChanged { enabled });
        }

        AssistantCommand::ListAudioDevices {} => {
            let (input, output) = tokio::task::spawn_blocking(|| {
                (list_input_devices(), list_output_devices())
            })
            .await
            .unwrap_or_default();
            emit_event(&AssistantEvent::AudioDevices {
                input: AudioDeviceInfo::numbered(input),
                output: AudioDeviceInfo::numbered(output),
            });
        }
    }

    true
}

/// Image bytes from a file path or a base64 payload (plain or `data:` URL).
async fn load_image(path: Option<&str>, image: Option<&str>) -> anyhow::Result<Vec<u8>> {
    if let Some(path) = path {
        return tokio::fs::read(path)
            .await
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path, e));
    }
    let Some(encoded) = image else {
        anyhow::bail!("no image provided");
    };
    let payload = match encoded.split_once(";base64,") {
        Some((_, data)) => data,
        None => encoded,
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| anyhow::anyhow!("invalid base64 image: {}", e))
}
