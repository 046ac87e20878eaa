use crate::ids::{CorrelationId, JobId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Per-segment, low-latency translation track.
    Realtime,
    /// Sentence/paragraph-level, higher-quality history track.
    History,
    Summary,
    /// Ad-hoc translation requested by the user (e.g. vocabulary, report).
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
}

/// One unit of work dispatched to an `LlmAdapter` by the translation queue (§4.5).
///
/// Invariant: at most one active job per `(kind, linked_id)` pair, where
/// `linked_id` is whichever of `source_text`'s originating segment/sentence id
/// the caller used to key the enqueue — tracked by the queue, not this type.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct TranslationJob {
    pub id: JobId,
    pub kind: JobKind,
    pub priority: Priority,
    pub source_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub enqueued_ts: i64,
    pub deadline_ts: Option<i64>,
    pub correlation_id: CorrelationId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    RateLimited,
    Timeout,
    AuthInvalid,
    BadRequest,
    Cancelled,
    Internal,
}

impl ErrorKind {
    /// Transient classes the queue retries with backoff (§4.5, §7).
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transport | ErrorKind::RateLimited)
    }

    /// Fatal to the whole pipeline, not just the job (§7).
    pub fn is_fatal_to_session(self) -> bool {
        matches!(self, ErrorKind::AuthInvalid)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct TranslationResult {
    pub job_id: JobId,
    pub target_text: Option<String>,
    pub first_token_ts: Option<i64>,
    pub complete_ts: i64,
    pub tokens: Option<u32>,
    pub error: Option<ErrorKind>,
}

impl TranslationResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
