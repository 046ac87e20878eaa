use pipeline_ids::IdGenerator;
use pipeline_types::{CombinedSentence, Paragraph, ParagraphId, ParagraphStatus, SentenceId};

const TERMINATORS: &[char] = &['.', '!', '?', '。', '！', '？'];

fn ends_with_terminator(text: &str) -> bool {
    text.chars().next_back().is_some_and(|c| TERMINATORS.contains(&c))
}

const FILLER_WORDS: &[&str] = &["um", "uh", "uhh", "umm", "er", "erm"];

/// Strips lecture-speech filler words and collapses the resulting whitespace
/// (§4.4's "optional cleanup (filler removal)"). Runs off the hot path, in
/// the async stage the orchestrator spawns after a paragraph closes — cheap
/// enough today to be synchronous under the hood, but kept as a free
/// function so a future model-backed cleanup pass can replace the body
/// without touching the caller.
pub fn clean_paragraph_text(raw_text: &str) -> String {
    let lowered_words: Vec<&str> = raw_text.split_whitespace().collect();
    let mut cleaned = Vec::with_capacity(lowered_words.len());
    let mut skip_next = 0usize;
    for (index, word) in lowered_words.iter().enumerate() {
        if skip_next > 0 {
            skip_next -= 1;
            continue;
        }
        let bare = word.trim_matches(|c: char| c == ',' || c == '.').to_lowercase();
        if FILLER_WORDS.contains(&bare.as_str()) {
            continue;
        }
        if bare == "i" && lowered_words.get(index + 1).map(|w| w.trim_matches(',').to_lowercase()) == Some("mean".into())
        {
            skip_next = 1;
            continue;
        }
        cleaned.push(*word);
    }
    cleaned.join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParagraphBuilderConfig {
    pub target_min_seconds: i64,
    pub target_max_seconds: i64,
    /// A pause longer than this, following a sentence-terminating boundary,
    /// closes the paragraph early once `target_min_seconds` is met (§4.4).
    pub strong_pause_ms: i64,
}

impl Default for ParagraphBuilderConfig {
    fn default() -> Self {
        Self { target_min_seconds: 20, target_max_seconds: 60, strong_pause_ms: 800 }
    }
}

/// Groups sentences into 20-60s paragraphs for long-form history translation
/// (C5, §4.4). Optional: the orchestrator only wires this stage in when
/// paragraph-level translation is enabled, per the `paragraphs` feature.
pub struct ParagraphBuilder {
    config: ParagraphBuilderConfig,
    id_gen: Box<dyn IdGenerator>,
    sentence_ids: Vec<SentenceId>,
    raw_text: String,
    start_ts: Option<i64>,
    last_end_ts: i64,
}

impl ParagraphBuilder {
    pub fn new(config: ParagraphBuilderConfig, id_gen: Box<dyn IdGenerator>) -> Self {
        Self {
            config,
            id_gen,
            sentence_ids: Vec::new(),
            raw_text: String::new(),
            start_ts: None,
            last_end_ts: 0,
        }
    }

    /// Appends one sentence. Returns a completed paragraph either when this
    /// sentence pushes the running duration past `target_max_seconds`, or
    /// when the *previously* buffered content already met
    /// `target_min_seconds`, ended on a terminator, and the pause before
    /// this sentence exceeds `strong_pause_ms` — in which case this
    /// sentence starts the next paragraph rather than joining the closed
    /// one.
    pub fn append(&mut self, sentence: &CombinedSentence) -> Option<Paragraph> {
        let max_ms = self.config.target_max_seconds * 1000;
        let min_ms = self.config.target_min_seconds * 1000;

        if let Some(start_ts) = self.start_ts {
            let duration_so_far = self.last_end_ts - start_ts;
            let gap_before = sentence.start_ts - self.last_end_ts;

            if duration_so_far >= min_ms
                && ends_with_terminator(&self.raw_text)
                && gap_before > self.config.strong_pause_ms
            {
                let closed = self.emit();
                self.push(sentence);
                return Some(closed);
            }
        }

        self.push(sentence);

        let duration = self.last_end_ts - self.start_ts.unwrap_or(self.last_end_ts);
        (duration >= max_ms).then(|| self.emit())
    }

    /// Flushes any partial paragraph on session stop (§4.4, §4.10).
    pub fn force_flush(&mut self) -> Option<Paragraph> {
        (!self.sentence_ids.is_empty()).then(|| self.emit())
    }

    fn push(&mut self, sentence: &CombinedSentence) {
        if self.sentence_ids.is_empty() {
            self.start_ts = Some(sentence.start_ts);
        }
        if !self.raw_text.is_empty() {
            self.raw_text.push(' ');
        }
        self.raw_text.push_str(&sentence.source_text);
        self.sentence_ids.push(sentence.id.clone());
        self.last_end_ts = sentence.end_ts;
    }

    fn emit(&mut self) -> Paragraph {
        let id = ParagraphId::from(self.id_gen.next_id());
        let sentence_ids = std::mem::take(&mut self.sentence_ids);
        let raw_text = std::mem::take(&mut self.raw_text);
        let word_count = pipeline_types::count_words(&raw_text);
        let start_ts = self.start_ts.take().unwrap_or(self.last_end_ts);

        Paragraph {
            id,
            sentence_ids,
            raw_text,
            clean_text: None,
            start_ts,
            end_ts: self.last_end_ts,
            word_count,
            // Ready for the async filler-removal pass; the orchestrator
            // flips this to `Completed` once `clean_text` is back-patched.
            status: ParagraphStatus::Processing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_ids::SequentialIdGen;

    fn sentence(id: &str, text: &str, start_ts: i64, end_ts: i64) -> CombinedSentence {
        CombinedSentence {
            id: SentenceId::from(id),
            segment_ids: vec![],
            source_text: text.to_string(),
            start_ts,
            end_ts,
            segment_count: 1,
        }
    }

    fn builder(config: ParagraphBuilderConfig) -> ParagraphBuilder {
        ParagraphBuilder::new(config, Box::new(SequentialIdGen::new("para")))
    }

    #[test]
    fn closes_on_max_duration() {
        let config = ParagraphBuilderConfig { target_max_seconds: 10, ..Default::default() };
        let mut builder = builder(config);
        assert!(builder.append(&sentence("s1", "one.", 0, 5_000)).is_none());
        let paragraph = builder.append(&sentence("s2", "two.", 5_000, 11_000)).unwrap();
        assert_eq!(paragraph.sentence_ids.len(), 2);
        assert_eq!(paragraph.raw_text, "one. two.");
    }

    #[test]
    fn closes_early_on_strong_pause_past_min_duration() {
        let config =
            ParagraphBuilderConfig { target_min_seconds: 5, target_max_seconds: 60, strong_pause_ms: 800 };
        let mut builder = builder(config);
        assert!(builder.append(&sentence("s1", "closing thought.", 0, 6_000)).is_none());

        // 1s pause after a terminator, past the 5s minimum: closes here.
        let paragraph = builder.append(&sentence("s2", "new topic", 7_000, 9_000)).unwrap();
        assert_eq!(paragraph.sentence_ids, vec![SentenceId::from("s1")]);
        assert_eq!(paragraph.raw_text, "closing thought.");
    }

    #[test]
    fn short_pause_does_not_close_early() {
        let config =
            ParagraphBuilderConfig { target_min_seconds: 5, target_max_seconds: 60, strong_pause_ms: 800 };
        let mut builder = builder(config);
        builder.append(&sentence("s1", "closing thought.", 0, 6_000));
        assert!(builder.append(&sentence("s2", "still going", 6_200, 8_000)).is_none());
    }

    #[test]
    fn clean_paragraph_text_drops_filler_words() {
        assert_eq!(clean_paragraph_text("so, um, this is, uh, the idea"), "so, this is, the idea");
        assert_eq!(clean_paragraph_text("i mean the point is clear"), "the point is clear");
        assert_eq!(clean_paragraph_text("no filler here"), "no filler here");
    }

    #[test]
    fn force_flush_emits_partial_paragraph() {
        let mut builder = builder(ParagraphBuilderConfig::default());
        builder.append(&sentence("s1", "hanging.", 0, 1_000));
        let paragraph = builder.force_flush().unwrap();
        assert_eq!(paragraph.status, ParagraphStatus::Processing);
        assert!(builder.force_flush().is_none());
    }
}
