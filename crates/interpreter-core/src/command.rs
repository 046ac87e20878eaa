use asr_interface::AudioFrame;
use pipeline_types::{CorrelationId, JobId};

/// The command surface into the core (§6.1). `load_session` is intentionally
/// absent: it's a direct pass-through to the persistence collaborator, out
/// of scope (§1) beyond the narrow [`crate::persistence::PersistenceSink`]
/// callbacks. `get_history` is in scope — it reads the in-memory
/// `SegmentStore` the core already owns for the running session, no
/// persistence collaborator required.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(tag = "command", content = "params", rename_all = "snake_case")]
pub enum Command {
    StartListening { source_lang: String, target_lang: String, correlation_id: Option<CorrelationId> },
    StopListening,
    PauseListening,
    ResumeListening,
    /// Fire-and-forget; never replied to.
    SendAudioChunk(AudioFrame),
    ClearHistory,
    /// All finalized segments with `end_ts >= since_ts` (the whole session
    /// when omitted), in store order.
    GetHistory { since_ts: Option<i64> },
    GenerateVocabulary,
    GenerateFinalReport,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ack {
    Started { correlation_id: CorrelationId },
    Stopped,
    Paused,
    Resumed,
    Cleared,
    VocabularyQueued { job_id: JobId },
    FinalReportQueued { job_id: JobId },
}
