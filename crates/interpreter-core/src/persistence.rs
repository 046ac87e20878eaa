use pipeline_types::{CombinedSentence, CorrelationId, Summary, TranslationResult};

/// What gets handed to `on_history_block`: a batch of combined sentences
/// together with their completed history-track translations (§6.5).
#[derive(Debug, Clone)]
pub struct HistoryBlock {
    pub sentences: Vec<CombinedSentence>,
    pub translations: Vec<TranslationResult>,
}

#[derive(Debug, Clone)]
pub struct SessionMeta {
    pub correlation_id: CorrelationId,
    pub source_lang: String,
    pub target_lang: String,
    pub started_at_ms: i64,
}

/// Narrow callback boundary to the (out-of-scope) persistence collaborator
/// (§6.5, §1 "Session metadata persistence... is invoked via narrow
/// callbacks"). Mirrors the teacher's `ListenerRuntime`/`StorageRuntime`
/// split: a thin trait the host application implements, with synchronous,
/// best-effort methods the orchestrator never awaits on and never lets
/// block the pipeline.
pub trait PersistenceSink: Send + Sync {
    fn on_session_start(&self, _meta: &SessionMeta) {}
    fn on_history_block(&self, _block: &HistoryBlock) {}
    fn on_summary(&self, _summary: &Summary) {}
    fn on_final_report(&self, _markdown: &str) {}
    fn on_session_end(&self) {}
}

/// Default when the host application doesn't care about persistence.
pub struct NoopPersistenceSink;

impl PersistenceSink for NoopPersistenceSink {}
