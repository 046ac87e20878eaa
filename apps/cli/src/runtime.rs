use interpreter_core::{HistoryBlock, PersistenceSink, SessionMeta};
use pipeline_types::Summary;

/// Prints the narrow persistence callbacks to stderr, leaving stdout free for
/// the JSON event stream. Mirrors the teacher's bare `eprintln!`-based
/// `ListenerRuntime` demo implementation rather than wiring up a real store.
pub struct StderrPersistenceSink;

impl PersistenceSink for StderrPersistenceSink {
    fn on_session_start(&self, meta: &SessionMeta) {
        eprintln!(
            "[persistence] session_start correlation_id={} {}->{}",
            meta.correlation_id, meta.source_lang, meta.target_lang
        );
    }

    fn on_history_block(&self, block: &HistoryBlock) {
        eprintln!(
            "[persistence] history_block sentences={} translations={}",
            block.sentences.len(),
            block.translations.len()
        );
    }

    fn on_summary(&self, summary: &Summary) {
        eprintln!("[persistence] summary threshold_words={}", summary.threshold_words);
    }

    fn on_final_report(&self, markdown: &str) {
        eprintln!("[persistence] final_report {} bytes", markdown.len());
    }

    fn on_session_end(&self) {
        eprintln!("[persistence] session_end");
    }
}
