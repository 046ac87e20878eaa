/// Tuning knobs for the translation queue (C6, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Jobs dispatched in parallel against the `LlmAdapter`. Default 3.
    pub max_concurrency: usize,
    /// `queued + active` above this rejects new enqueues with `QueueFull`.
    /// Not sized by the spec; 256 gives ample headroom over realistic
    /// session rates without letting a stuck adapter grow unboundedly.
    pub max_queue: usize,
    /// Hard wall-clock budget per dispatched attempt. Default 7000 ms.
    pub request_timeout_ms: i64,
    /// Jobs older than this are promoted one priority level. Default 15 s.
    pub max_wait_ms: i64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { max_concurrency: 3, max_queue: 256, request_timeout_ms: 7_000, max_wait_ms: 15_000 }
    }
}
