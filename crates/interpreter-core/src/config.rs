use asr_interface::SessionConfig;
use progressive_summarizer::ProgressiveSummarizerConfig;
use stream_coalescer::CoalescerConfig;
use transcript::{ParagraphBuilderConfig, SentenceCombinerConfig};
use translate_queue::QueueConfig;

/// Read-only configuration captured once at `start_listening` (C11 construction,
/// §4.10, §9 "Global state for language settings" → read-only `SessionConfig`).
/// Every component the orchestrator wires up is built from a clone of the
/// relevant sub-config; nothing here is mutated for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub session: SessionConfig,
    pub combiner: SentenceCombinerConfig,
    /// C5 is optional per §9's "disabled paragraph-builder paths" open
    /// question; the spec resolves it as a feature flag, reflected here as a
    /// per-session toggle rather than a compile-time one so the demo harness
    /// can exercise both paths.
    pub paragraphs_enabled: bool,
    pub paragraph: ParagraphBuilderConfig,
    pub queue: QueueConfig,
    pub coalescer: CoalescerConfig,
    pub summarizer: ProgressiveSummarizerConfig,
    /// Grace period the orchestrator waits for the queue to drain on stop
    /// before forcing the transition to `idle` regardless (§4.10 "drains C6
    /// with a 5 s grace").
    pub stop_grace_ms: i64,
    /// §7: repeated `Internal` errors within this window escalate the
    /// session to `error` rather than being swallowed individually.
    pub internal_error_window_ms: i64,
    pub internal_error_threshold: u32,
}

impl PipelineConfig {
    pub fn new(source_lang: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            session: SessionConfig::new(source_lang, target_lang),
            combiner: SentenceCombinerConfig::default(),
            paragraphs_enabled: true,
            paragraph: ParagraphBuilderConfig::default(),
            queue: QueueConfig::default(),
            coalescer: CoalescerConfig::default(),
            summarizer: ProgressiveSummarizerConfig::default(),
            stop_grace_ms: 5_000,
            internal_error_window_ms: 30_000,
            internal_error_threshold: 3,
        }
    }
}
