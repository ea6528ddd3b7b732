//! Assistant core: text chat, voice chat and image text extraction behind a
//! JSON-line IPC front end.

pub mod audio;
pub mod config;
pub mod ipc;
pub mod llm;
pub mod logging;
pub mod session;
pub mod stt;
pub mod tts;
pub mod vad;
pub mod vision;
