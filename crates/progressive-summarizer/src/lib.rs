//! Tracks cumulative source word count and fires summary jobs at
//! configurable thresholds (C8, §4.7).

use std::collections::VecDeque;

use pipeline_types::count_words;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressiveSummarizerConfig {
    /// Ascending word-count thresholds. Default `{400, 800, 1600, 2400}`.
    pub thresholds: Vec<u32>,
    /// Once the highest configured threshold has fired, continue triggering
    /// every additional `continuation_step` words (§4.7). Default 800.
    pub continuation_step: u32,
}

impl Default for ProgressiveSummarizerConfig {
    fn default() -> Self {
        Self { thresholds: vec![400, 800, 1600, 2400], continuation_step: 800 }
    }
}

/// One crossed threshold, ready to be enqueued as a `low`-priority summary
/// job (§4.7, §6.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryTrigger {
    pub threshold_words: u32,
    pub source_text: String,
    pub word_count: u32,
}

/// Stateful threshold tracker (C8). One instance per session.
pub struct ProgressiveSummarizer {
    thresholds: VecDeque<u32>,
    continuation_step: u32,
    cumulative_words: u32,
    pending_text: String,
    last_fired_threshold: Option<u32>,
}

impl ProgressiveSummarizer {
    pub fn new(config: ProgressiveSummarizerConfig) -> Self {
        Self {
            thresholds: config.thresholds.into_iter().collect(),
            continuation_step: config.continuation_step,
            cumulative_words: 0,
            pending_text: String::new(),
            last_fired_threshold: None,
        }
    }

    pub fn cumulative_words(&self) -> u32 {
        self.cumulative_words
    }

    /// Feeds one finalized source segment's text (post-trim). Whitespace-only
    /// text contributes nothing. Returns every threshold crossed by this
    /// call, in ascending order — ordinarily zero or one, but a single large
    /// final can cross more than one at once; `source_text` is non-decreasing
    /// in `word_count` across the returned triggers (§8 invariant 6).
    pub fn on_final_text(&mut self, text: &str) -> Vec<SummaryTrigger> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        if !self.pending_text.is_empty() {
            self.pending_text.push(' ');
        }
        self.pending_text.push_str(trimmed);
        self.cumulative_words += count_words(trimmed);

        let mut triggers = Vec::new();
        while self.cumulative_words >= self.next_target() {
            let target = self.next_target();
            let source_text = std::mem::take(&mut self.pending_text);
            let word_count = self.cumulative_words;

            if self.thresholds.front() == Some(&target) {
                self.thresholds.pop_front();
            }
            self.last_fired_threshold = Some(target);

            triggers.push(SummaryTrigger { threshold_words: target, source_text, word_count });
        }

        triggers
    }

    fn next_target(&self) -> u32 {
        self.thresholds
            .front()
            .copied()
            .unwrap_or_else(|| self.last_fired_threshold.unwrap_or(0) + self.continuation_step)
    }
}
