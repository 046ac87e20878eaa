use llm_proxy::TranslateProfile;
use pipeline_types::{CorrelationId, JobKind, ParagraphId, Priority, SegmentId, SentenceId};

/// Whatever entity a job's result should be attributed back to. Also forms
/// half of the logical dedup key `(kind, linked_id)` from §4.5: "at most one
/// active job per `(kind, segment_id|sentence_id)` pair".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkedId {
    Segment(SegmentId),
    Sentence(SentenceId),
    Paragraph(ParagraphId),
    /// Session-scoped work with no single segment/sentence/paragraph owner —
    /// a progressive summary, a vocabulary list, or a final report.
    Adhoc(String),
}

impl LinkedId {
    pub fn segment_id(&self) -> Option<SegmentId> {
        match self {
            LinkedId::Segment(id) => Some(id.clone()),
            _ => None,
        }
    }

    pub fn sentence_id(&self) -> Option<SentenceId> {
        match self {
            LinkedId::Sentence(id) => Some(id.clone()),
            _ => None,
        }
    }

    pub fn paragraph_id(&self) -> Option<ParagraphId> {
        match self {
            LinkedId::Paragraph(id) => Some(id.clone()),
            _ => None,
        }
    }
}

/// What a caller hands the queue at `enqueue` time (§4.5, §6.1).
#[derive(Debug, Clone)]
pub struct EnqueueRequest {
    pub kind: JobKind,
    pub priority: Priority,
    pub linked_id: LinkedId,
    pub source_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub profile: TranslateProfile,
    pub correlation_id: CorrelationId,
}
