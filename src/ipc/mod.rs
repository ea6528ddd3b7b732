//! IPC protocol types for the front end.
//!
//! Events use `{"event": "<name>", "data": {...}}` format (core -> front end).
//! Commands use `{"command": "<name>", ...}` format (front end -> core).

pub mod bridge;

use serde::{Deserialize, Serialize};

use crate::session::ChatTurn;

// ---------------------------------------------------------------------------
// Events: core -> front end (stdout)
// ---------------------------------------------------------------------------

/// All events emitted via stdout as JSON lines.
///
/// Serialized as `{"event": "<variant>", "data": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum AssistantEvent {
    Starting {},
    Loading { step: String },
    Ready {},
    Pong {},
    Stopping {},
    CaptureState { state: String },
    Transcription { text: String },
    Reply {
        #[serde(rename = "msgId")]
        msg_id: String,
        #[serde(rename = "userText")]
        user_text: String,
        text: String,
        source: String,
    },
    Extraction { text: String, found: bool },
    History { turns: Vec<ChatTurn> },
    NarrationChanged { enabled: bool },
    AudioDevices {
        input: Vec<AudioDeviceInfo>,
        output: Vec<AudioDeviceInfo>,
    },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDeviceInfo {
    pub id: i32,
    pub name: String,
}

impl AudioDeviceInfo {
    pub fn numbered(names: Vec<String>) -> Vec<Self> {
        names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Self { id: i as i32, name })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Commands: front end -> core (stdin)
// ---------------------------------------------------------------------------

/// All commands received via stdin as JSON lines.
///
/// Deserialized from `{"command": "<variant>", ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command")]
#[serde(rename_all = "snake_case")]
pub enum AssistantCommand {
    Ping {},
    Stop {},
    TextChat {
        text: String,
    },
    VoiceChat {},
    ExtractText {
        /// Path to an image file.
        #[serde(default)]
        path: Option<String>,
        /// Base64-encoded image bytes (optionally a `data:` URL).
        #[serde(default)]
        image: Option<String>,
    },
    AskAboutText {
        question: String,
    },
    History {},
    SetNarration {
        enabled: bool,
    },
    ListAudioDevices {},
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_snake_case() {
        let json = serde_json::to_value(AssistantEvent::CaptureState {
            state: "listening".into(),
        })
        .unwrap();
        assert_eq!(json["event"], "capture_state");
        assert_eq!(json["data"]["state"], "listening");

        let json = serde_json::to_value(AssistantEvent::Ready {}).unwrap();
        assert_eq!(json, serde_json::json!({"event": "ready", "data": {}}));
    }

    #[test]
    fn reply_uses_camel_case_ids() {
        let json = serde_json::to_value(AssistantEvent::Reply {
            msg_id: "m1".into(),
            user_text: "2+2?".into(),
            text: "4".into(),
            source: "text".into(),
        })
        .unwrap();
        assert_eq!(json["data"]["msgId"], "m1");
        assert_eq!(json["data"]["userText"], "2+2?");
    }

    #[test]
    fn commands_deserialize() {
        let cmd: AssistantCommand =
            serde_json::from_str(r#"{"command":"text_chat","text":"hi"}"#).unwrap();
        assert!(matches!(cmd, AssistantCommand::TextChat { text } if text == "hi"));

        let cmd: AssistantCommand =
            serde_json::from_str(r#"{"command":"extract_text","path":"/tmp/a.png"}"#).unwrap();
        assert!(matches!(
            cmd,
            AssistantCommand::ExtractText { path: Some(_), image: None }
        ));

        let cmd: AssistantCommand = serde_json::from_str(r#"{"command":"voice_chat"}"#).unwrap();
        assert!(matches!(cmd, AssistantCommand::VoiceChat {}));
    }

    #[test]
    fn device_ids_follow_enumeration_order() {
        let devices = AudioDeviceInfo::numbered(vec!["a".into(), "b".into()]);
        assert_eq!(devices[1].id, 1);
        assert_eq!(devices[1].name, "b");
    }
}
