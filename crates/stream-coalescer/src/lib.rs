//! Debounces/force-commits rapidly-changing interim outputs per logical
//! stream key (C7, §4.6, §9).
//!
//! Generic over both the key (a `SegmentId`/`JobId`-shaped string in
//! practice) and the value (ASR interim text, translation delta text) so
//! the same coalescing logic serves both the ASR interim stream and the
//! translation-delta stream without duplicating it, per the "shared
//! mutable current strings" re-architecture note in §9 — state here is
//! keyed per-stream, never exposed as a global mutable.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoalescerConfig {
    pub debounce_ms: i64,
    pub max_hold_ms: i64,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self { debounce_ms: 120, max_hold_ms: 400 }
    }
}

/// What `update` decided for one stream key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoalesceOutcome<V> {
    /// Emit immediately: either the debounce window elapsed and the value
    /// changed, or the hold window forced a commit regardless.
    Emit(V),
    /// Value changed but neither window has elapsed yet; not emitted.
    Suppressed,
    /// The update didn't change anything observable (value equals the last
    /// emitted value); never emitted, never counted as suppressed.
    Unchanged,
}

struct StreamState<V> {
    latest: V,
    last_emitted: Option<V>,
    last_emit_ts: i64,
    first_change_ts: i64,
    suppressed_count: u32,
}

/// Per-key coalescing state (C7). Not `Send`-bound by itself; callers own
/// placing this behind whatever synchronization their runtime needs, per
/// §5's single-owner-actor guidance.
pub struct StreamCoalescer<K, V> {
    config: CoalescerConfig,
    streams: HashMap<K, StreamState<V>>,
}

impl<K, V> StreamCoalescer<K, V>
where
    K: Eq + Hash,
    V: Clone + PartialEq,
{
    pub fn new(config: CoalescerConfig) -> Self {
        Self { config, streams: HashMap::new() }
    }

    /// Records a new value for `key` and decides whether to emit it now.
    pub fn update(&mut self, key: K, value: V, now_ms: i64) -> CoalesceOutcome<V> {
        let state = self.streams.entry(key).or_insert_with(|| StreamState {
            latest: value.clone(),
            last_emitted: None,
            last_emit_ts: now_ms,
            first_change_ts: now_ms,
            suppressed_count: 0,
        });

        if state.last_emitted.as_ref() == Some(&value) {
            state.latest = value;
            return CoalesceOutcome::Unchanged;
        }

        state.latest = value.clone();

        let debounce_due = now_ms - state.last_emit_ts >= self.config.debounce_ms;
        let force_commit_due = now_ms - state.first_change_ts >= self.config.max_hold_ms;

        if debounce_due || force_commit_due {
            state.last_emitted = Some(value.clone());
            state.last_emit_ts = now_ms;
            state.first_change_ts = now_ms;
            CoalesceOutcome::Emit(value)
        } else {
            state.suppressed_count += 1;
            CoalesceOutcome::Suppressed
        }
    }

    /// Emits immediately and clears state for `key`, guaranteeing the final
    /// value is always observed even if it was mid-suppression (§4.6).
    pub fn finalize(&mut self, key: K, value: V) -> V {
        self.streams.remove(&key);
        value
    }

    /// Count of values suppressed for `key` since it last emitted, without
    /// resetting it. Surfaced for metrics per §4.6's "suppressed
    /// intermediate values are counted".
    pub fn suppressed_count(&self, key: &K) -> u32 {
        self.streams.get(key).map(|s| s.suppressed_count).unwrap_or(0)
    }

    pub fn active_streams(&self) -> usize {
        self.streams.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coalescer() -> StreamCoalescer<&'static str, String> {
        StreamCoalescer::new(CoalescerConfig { debounce_ms: 100, max_hold_ms: 300 })
    }

    #[test]
    fn update_inside_debounce_window_is_suppressed() {
        let mut c = coalescer();
        // debounce window measured from stream-creation time (now_ms ==
        // last_emit_ts), so a change strictly inside it is suppressed.
        let outcome = c.update("seg-1", "He".to_string(), 50);
        assert_eq!(outcome, CoalesceOutcome::Suppressed);
    }

    #[test]
    fn emits_once_debounce_window_elapses() {
        let mut c = coalescer();
        assert_eq!(c.update("seg-1", "He".to_string(), 10), CoalesceOutcome::Suppressed);
        assert_eq!(
            c.update("seg-1", "Hello".to_string(), 150),
            CoalesceOutcome::Emit("Hello".to_string())
        );
    }

    #[test]
    fn force_commits_after_max_hold_even_if_debounce_not_elapsed() {
        let mut c = coalescer();
        c.update("seg-1", "H".to_string(), 0);
        c.update("seg-1", "He".to_string(), 50);
        c.update("seg-1", "Hel".to_string(), 90);
        // Still inside the 100ms debounce window relative to last emit at 0,
        // but first_change_ts (0) + max_hold_ms (300) forces a commit by 300.
        let outcome = c.update("seg-1", "Hell".to_string(), 305);
        assert_eq!(outcome, CoalesceOutcome::Emit("Hell".to_string()));
    }

    #[test]
    fn identical_value_is_unchanged_not_suppressed() {
        let mut c = coalescer();
        c.update("seg-1", "Hello".to_string(), 150);
        assert_eq!(c.update("seg-1", "Hello".to_string(), 160), CoalesceOutcome::Unchanged);
    }

    #[test]
    fn finalize_always_emits_and_clears_state() {
        let mut c = coalescer();
        c.update("seg-1", "He".to_string(), 10);
        let finalized = c.finalize("seg-1", "Hello.".to_string());
        assert_eq!(finalized, "Hello.");
        assert_eq!(c.active_streams(), 0);
    }

    #[test]
    fn suppressed_updates_are_counted() {
        let mut c = coalescer();
        c.update("seg-1", "H".to_string(), 0);
        c.update("seg-1", "He".to_string(), 10);
        c.update("seg-1", "Hel".to_string(), 20);
        assert_eq!(c.suppressed_count(&"seg-1"), 2);
    }
}
