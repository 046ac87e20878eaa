use crate::ids::JobId;

/// A progressive summary crossing one cumulative word-count threshold (§3,
/// §4.7). Identified by the `JobId` of the summarization job that produced
/// it — summaries have no identity of their own prior to being generated.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct Summary {
    pub id: JobId,
    pub threshold_words: u32,
    pub source_text: String,
    pub target_text: String,
    pub word_count: u32,
    pub start_ts: i64,
    pub end_ts: i64,
}
