//! Contract types for the ASR adapter boundary (C2, §4.1, §6.3).
//!
//! This crate deliberately stops at the abstracted contract: vendor wire
//! formats are out of scope (§1) and never appear here. `asr-client` owns the
//! concrete adapter implementations and the reconnecting driver; this crate
//! only defines what they produce and consume.

mod config;
mod error;

pub use config::SessionConfig;
pub use error::AsrError;
pub use pipeline_types::TranscriptSegment;

/// `send_audio` accepts PCM16LE 16 kHz mono frames, 20 ms / 640 bytes by
/// default (§6.3). The adapter does not interpret the bytes beyond framing.
pub type AudioFrame = Vec<u8>;

/// Connection lifecycle of the ASR adapter (§4.1). A reconnect policy applies
/// only while `Connected`; `Disconnected` is both the initial and terminal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Draining,
}

/// One item of the adapter's outbound stream: either a transcript update or a
/// connection-status change. A background task drains this stream while the
/// caller independently calls `send_audio` — the two must be safe to run
/// concurrently.
#[derive(Debug, Clone)]
pub enum AsrEvent {
    Segment(TranscriptSegment),
    Status(ConnectionStatus),
}
