use std::collections::HashMap;

use pipeline_types::{SegmentId, TranscriptSegment};

/// Result of appending one final segment (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// True when the segment's `end_ts` was older than the current
    /// watermark, meaning it had to be inserted out of order rather than
    /// pushed onto the tail. The orchestrator publishes a `resync` event
    /// when this is true.
    pub resync: bool,
}

/// Append-only, in-memory ordered log of finalized segments (C3, §4.2).
///
/// Finals are expected in non-decreasing `end_ts` order; a late arrival is
/// inserted at its sorted position rather than rejected, and the caller is
/// told to raise a `resync` event.
#[derive(Debug, Default)]
pub struct SegmentStore {
    // Kept sorted by `end_ts`; ties broken by arrival order.
    segments: Vec<TranscriptSegment>,
    index: HashMap<SegmentId, usize>,
    watermark_ts: i64,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finalized segment. `segment.is_final` must already be
    /// `true` — the store only ever holds finals.
    pub fn append_final(&mut self, segment: TranscriptSegment) -> AppendOutcome {
        debug_assert!(segment.is_final, "SegmentStore only accepts final segments");

        if let Some(&pos) = self.index.get(&segment.id) {
            // Same id re-finalized: the adapter guarantees this doesn't
            // happen once `is_final` was observed, but don't panic on a
            // misbehaving vendor — overwrite in place and leave ordering
            // untouched.
            self.segments[pos] = segment;
            return AppendOutcome { resync: false };
        }

        let resync = segment.end_ts < self.watermark_ts;
        let insert_at = if resync {
            self.segments.partition_point(|existing| existing.end_ts <= segment.end_ts)
        } else {
            self.segments.len()
        };

        self.watermark_ts = self.watermark_ts.max(segment.end_ts);
        self.segments.insert(insert_at, segment.clone());
        self.reindex_from(insert_at);

        AppendOutcome { resync }
    }

    fn reindex_from(&mut self, from: usize) {
        for (offset, segment) in self.segments[from..].iter().enumerate() {
            self.index.insert(segment.id.clone(), from + offset);
        }
    }

    /// All finals with `end_ts >= ts`, in store order.
    pub fn get_since(&self, ts: i64) -> Vec<TranscriptSegment> {
        let start = self.segments.partition_point(|s| s.end_ts < ts);
        self.segments[start..].to_vec()
    }

    pub fn snapshot(&self) -> Vec<TranscriptSegment> {
        self.segments.clone()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Resets all state. Used by `clear_history`; does not affect metrics
    /// (§4.10).
    pub fn clear(&mut self) {
        self.segments.clear();
        self.index.clear();
        self.watermark_ts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(id: &str, end_ts: i64) -> TranscriptSegment {
        TranscriptSegment {
            id: SegmentId::from(id),
            text: format!("segment {id}"),
            is_final: true,
            confidence: 1.0,
            start_ts: end_ts - 100,
            end_ts,
            language: "en".to_string(),
        }
    }

    #[test]
    fn appends_in_order_without_resync() {
        let mut store = SegmentStore::new();
        assert!(!store.append_final(seg("a", 100)).resync);
        assert!(!store.append_final(seg("b", 200)).resync);
        assert!(!store.append_final(seg("c", 300)).resync);

        let ids: Vec<_> = store.snapshot().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SegmentId::from("a"), SegmentId::from("b"), SegmentId::from("c")]);
    }

    #[test]
    fn out_of_order_final_triggers_resync_and_is_sorted_in() {
        let mut store = SegmentStore::new();
        store.append_final(seg("a", 100));
        store.append_final(seg("c", 300));
        let outcome = store.append_final(seg("b", 200));

        assert!(outcome.resync);
        let ids: Vec<_> = store.snapshot().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SegmentId::from("a"), SegmentId::from("b"), SegmentId::from("c")]);
    }

    #[test]
    fn get_since_filters_by_end_ts() {
        let mut store = SegmentStore::new();
        store.append_final(seg("a", 100));
        store.append_final(seg("b", 200));
        store.append_final(seg("c", 300));

        let since = store.get_since(150);
        let ids: Vec<_> = since.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SegmentId::from("b"), SegmentId::from("c")]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut store = SegmentStore::new();
        store.append_final(seg("a", 100));
        store.clear();
        assert!(store.is_empty());
        assert!(!store.append_final(seg("a", 50)).resync);
    }
}
