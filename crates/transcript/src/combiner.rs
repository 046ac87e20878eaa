use pipeline_ids::IdGenerator;
use pipeline_types::{CombinedSentence, SentenceId, TranscriptSegment};

const TERMINATORS: &[char] = &['.', '!', '?', '。', '！', '？'];

fn ends_with_terminator(text: &str) -> bool {
    text.chars().next_back().is_some_and(|c| TERMINATORS.contains(&c))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceCombinerConfig {
    pub min_segments: usize,
    pub max_segments: usize,
    pub timeout_ms: i64,
}

impl Default for SentenceCombinerConfig {
    fn default() -> Self {
        Self { min_segments: 1, max_segments: 3, timeout_ms: 1200 }
    }
}

/// Groups consecutive final segments into sentence-level units using
/// punctuation and timing (C4, §4.3).
///
/// `check_timeout` is driven by the orchestrator's timer loop, not by an
/// internal clock — this type holds no clock reference, only the timestamp
/// of the last append, so tests can advance time deterministically without
/// an injected `Clock`.
pub struct SentenceCombiner {
    config: SentenceCombinerConfig,
    id_gen: Box<dyn IdGenerator>,
    buffer_text: String,
    buffer_segment_ids: Vec<pipeline_types::SegmentId>,
    start_ts: Option<i64>,
    last_append_ts: i64,
    last_end_ts: i64,
}

impl SentenceCombiner {
    pub fn new(config: SentenceCombinerConfig, id_gen: Box<dyn IdGenerator>) -> Self {
        Self {
            config,
            id_gen,
            buffer_text: String::new(),
            buffer_segment_ids: Vec::new(),
            start_ts: None,
            last_append_ts: 0,
            last_end_ts: 0,
        }
    }

    /// Appends one final segment. `now_ms` is the wall-clock time of the
    /// append, used to drive the `timeout_ms` rule from `check_timeout`.
    ///
    /// An empty final (text after trim is empty) is ignored per §4.3.
    pub fn append(&mut self, segment: &TranscriptSegment, now_ms: i64) -> Option<CombinedSentence> {
        let trimmed = segment.text.trim();
        if trimmed.is_empty() {
            return None;
        }

        if self.buffer_segment_ids.is_empty() {
            self.start_ts = Some(segment.start_ts);
        }
        if !self.buffer_text.is_empty() {
            self.buffer_text.push(' ');
        }
        self.buffer_text.push_str(trimmed);
        self.buffer_segment_ids.push(segment.id.clone());
        self.last_append_ts = now_ms;
        self.last_end_ts = segment.end_ts;

        let terminator_hit =
            ends_with_terminator(&self.buffer_text) && self.buffer_segment_ids.len() >= self.config.min_segments;
        let max_hit = self.buffer_segment_ids.len() >= self.config.max_segments;

        (terminator_hit || max_hit).then(|| self.emit())
    }

    /// Emits the pending buffer if `timeout_ms` has elapsed since the last
    /// append. A no-op (returns `None`) when the buffer is empty, per §4.3's
    /// "if the buffer is empty when `timeout_ms` fires, no event is
    /// produced".
    pub fn check_timeout(&mut self, now_ms: i64) -> Option<CombinedSentence> {
        if self.buffer_segment_ids.is_empty() {
            return None;
        }
        (now_ms - self.last_append_ts >= self.config.timeout_ms).then(|| self.emit())
    }

    /// Flushes any partial buffer as a sentence even without a terminator.
    /// Called by the orchestrator on stop (§4.3).
    pub fn force_emit(&mut self) -> Option<CombinedSentence> {
        (!self.buffer_segment_ids.is_empty()).then(|| self.emit())
    }

    fn emit(&mut self) -> CombinedSentence {
        let id = SentenceId::from(self.id_gen.next_id());
        let segment_ids = std::mem::take(&mut self.buffer_segment_ids);
        let source_text = std::mem::take(&mut self.buffer_text);
        let segment_count = segment_ids.len();
        let start_ts = self.start_ts.take().unwrap_or(self.last_end_ts);

        CombinedSentence { id, segment_ids, source_text, start_ts, end_ts: self.last_end_ts, segment_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_ids::SequentialIdGen;
    use pipeline_types::SegmentId;

    fn seg(id: &str, text: &str, start_ts: i64, end_ts: i64) -> TranscriptSegment {
        TranscriptSegment {
            id: SegmentId::from(id),
            text: text.to_string(),
            is_final: true,
            confidence: 1.0,
            start_ts,
            end_ts,
            language: "en".to_string(),
        }
    }

    fn combiner(config: SentenceCombinerConfig) -> SentenceCombiner {
        SentenceCombiner::new(config, Box::new(SequentialIdGen::new("sent")))
    }

    #[test]
    fn emits_on_terminator() {
        let mut combiner = combiner(SentenceCombinerConfig::default());
        assert!(combiner.append(&seg("s1", "Hello.", 0, 100), 0).is_some());
    }

    #[test]
    fn buffers_until_terminator_across_segments() {
        let mut combiner = combiner(SentenceCombinerConfig::default());
        assert!(combiner.append(&seg("s1", "Hello", 0, 100), 0).is_none());
        let sentence = combiner.append(&seg("s2", "there.", 100, 200), 50).unwrap();
        assert_eq!(sentence.source_text, "Hello there.");
        assert_eq!(sentence.segment_ids, vec![SegmentId::from("s1"), SegmentId::from("s2")]);
        assert_eq!(sentence.start_ts, 0);
        assert_eq!(sentence.end_ts, 200);
    }

    #[test]
    fn emits_on_max_segments_without_terminator() {
        let config = SentenceCombinerConfig { max_segments: 2, ..Default::default() };
        let mut combiner = combiner(config);
        assert!(combiner.append(&seg("s1", "one", 0, 100), 0).is_none());
        let sentence = combiner.append(&seg("s2", "two", 100, 200), 10).unwrap();
        assert_eq!(sentence.segment_count, 2);
    }

    #[test]
    fn emits_on_timeout_since_last_append() {
        let mut combiner = combiner(SentenceCombinerConfig::default());
        combiner.append(&seg("s1", "partial phrase", 0, 100), 0);
        assert!(combiner.check_timeout(1000).is_none());
        let sentence = combiner.check_timeout(1300).unwrap();
        assert_eq!(sentence.source_text, "partial phrase");
    }

    #[test]
    fn timeout_on_empty_buffer_produces_nothing() {
        let mut combiner = combiner(SentenceCombinerConfig::default());
        assert!(combiner.check_timeout(999_999).is_none());
    }

    #[test]
    fn empty_final_is_ignored() {
        let mut combiner = combiner(SentenceCombinerConfig::default());
        assert!(combiner.append(&seg("s1", "   ", 0, 100), 0).is_none());
        assert!(combiner.check_timeout(999_999).is_none());
    }

    #[test]
    fn force_emit_flushes_without_terminator() {
        let mut combiner = combiner(SentenceCombinerConfig::default());
        combiner.append(&seg("s1", "dangling clause", 0, 100), 0);
        let sentence = combiner.force_emit().unwrap();
        assert_eq!(sentence.source_text, "dangling clause");
        assert!(combiner.force_emit().is_none(), "buffer should be empty after force_emit");
    }

    #[test]
    fn tie_break_terminator_and_max_segments_emits_once() {
        let config = SentenceCombinerConfig { max_segments: 1, ..Default::default() };
        let mut combiner = combiner(config);
        let sentence = combiner.append(&seg("s1", "Done.", 0, 100), 0);
        assert!(sentence.is_some());
        assert!(combiner.force_emit().is_none());
    }
}
