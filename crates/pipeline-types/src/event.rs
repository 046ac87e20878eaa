use crate::ids::{CorrelationId, JobId, ParagraphId, SegmentId, SentenceId};
use crate::job::{ErrorKind, TranslationResult};
use crate::segment::{CombinedSentence, Paragraph, TranscriptSegment};
use crate::state::PipelineState;
use crate::summary::Summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

/// The event envelope's variant payload (§3 `Event`, §4.8, §6.2).
///
/// Kept as a single exhaustive tagged union rather than per-component ad-hoc
/// listener lists, per the re-architecture guidance in §9: all emission goes
/// through the event bus, which stamps `seq` — producers never mint it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    AsrPartial {
        segment: TranscriptSegment,
    },
    AsrFinal {
        segment: TranscriptSegment,
    },
    TranslationPartial {
        job_id: JobId,
        segment_id: Option<SegmentId>,
        sentence_id: Option<SentenceId>,
        paragraph_id: Option<ParagraphId>,
        delta: String,
    },
    TranslationFinal {
        job_id: JobId,
        segment_id: Option<SegmentId>,
        sentence_id: Option<SentenceId>,
        paragraph_id: Option<ParagraphId>,
        result: TranslationResult,
    },
    CombinedSentence {
        sentence: CombinedSentence,
    },
    ParagraphComplete {
        paragraph: Paragraph,
    },
    ProgressiveSummary {
        summary: Summary,
    },
    Vocabulary {
        job_id: JobId,
        terms: Vec<String>,
    },
    FinalReport {
        job_id: JobId,
        markdown: String,
    },
    Status {
        level: StatusLevel,
        state: Option<PipelineState>,
        message: String,
        /// Non-`error`/`status` events dropped for the receiving subscriber
        /// since the previous `status` event on this bus, per the backpressure
        /// policy in §4.8. Zero unless a subscriber has fallen behind.
        dropped_since_last: u32,
    },
    Error {
        kind: ErrorKind,
        message: String,
        recoverable: bool,
    },
}

/// Every event carries this envelope (§3, §6.2). Envelope schema is
/// versioned via `v`; additive payload changes bump a minor version
/// elsewhere, breaking changes bump `v`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct Event {
    pub v: u32,
    pub correlation_id: CorrelationId,
    /// Monotonic per-session sequence number, strictly increasing. Stamped
    /// by the event bus at publish time, never by the producing component.
    pub seq: u64,
    pub ts: i64,
    pub payload: EventPayload,
}

impl Event {
    pub const VERSION: u32 = 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_payload_round_trips_through_json() {
        let event = Event {
            v: Event::VERSION,
            correlation_id: CorrelationId::from("corr-1"),
            seq: 7,
            ts: 1000,
            payload: EventPayload::Status {
                level: StatusLevel::Warn,
                state: Some(PipelineState::Listening),
                message: "subscriber lagging".into(),
                dropped_since_last: 3,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.seq, 7);
        match back.payload {
            EventPayload::Status { dropped_since_last, .. } => assert_eq!(dropped_since_last, 3),
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
