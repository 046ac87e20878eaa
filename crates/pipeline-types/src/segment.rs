use crate::ids::{ParagraphId, SegmentId, SentenceId};

/// One ASR segment, interim or final (§3, §4.1).
///
/// Interim results share a `SegmentId` until a final arrives with the same
/// id; once `is_final` is observed true for an id, no further mutation of
/// that id is valid and the id is retired by the adapter.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct TranscriptSegment {
    pub id: SegmentId,
    pub text: String,
    pub is_final: bool,
    /// Confidence in `[0, 1]`; vendors that don't report one send `1.0`.
    pub confidence: f32,
    pub start_ts: i64,
    pub end_ts: i64,
    pub language: String,
}

/// A maximal run of finals whose concatenation ends at a sentence terminator,
/// times out, or reaches `max_segments` (§4.3).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct CombinedSentence {
    pub id: SentenceId,
    pub segment_ids: Vec<SegmentId>,
    pub source_text: String,
    pub start_ts: i64,
    pub end_ts: i64,
    pub segment_count: usize,
}

/// A `Paragraph` value only exists once the builder has already closed it
/// (§4.4) — there is no in-flight instance to carry a `collecting` state, so
/// the lifecycle starts at `Processing` (raw text published, cleanup
/// pending) and ends at `Completed` once `clean_text` is back-patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphStatus {
    Processing,
    Completed,
}

/// A run of sentences spanning roughly `[target_min_seconds, target_max_seconds]`,
/// produced by the optional paragraph builder (§4.4).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct Paragraph {
    pub id: ParagraphId,
    pub sentence_ids: Vec<SentenceId>,
    pub raw_text: String,
    /// Filler-removed text, back-patched asynchronously after `raw_text` is
    /// already published. `None` until cleanup completes.
    pub clean_text: Option<String>,
    pub start_ts: i64,
    pub end_ts: i64,
    pub word_count: u32,
    pub status: ParagraphStatus,
}
