use asr_interface::AsrError;
use translate_queue::QueueError;

use crate::state::StateError;

/// Top-level error surfaced by the orchestrator's command interface (§6.1,
/// §7). Wraps the per-crate error taxonomies (`AsrError`, `QueueError`) plus
/// command-level validation failures that have no lower-level cause.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("pipeline already running")]
    AlreadyRunning,

    #[error("pipeline is not running")]
    NotRunning,

    #[error(transparent)]
    InvalidTransition(#[from] StateError),

    #[error("asr error: {0}")]
    Asr(#[from] AsrError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl PipelineError {
    /// Stable machine-readable code for the `Error { code }` command reply
    /// (§6.1, §8 "Re-issuing `start_listening`... returns `Error{code:
    /// "already_running"}`").
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::AlreadyRunning => "already_running",
            PipelineError::NotRunning => "not_running",
            PipelineError::InvalidTransition(_) => "bad_request",
            PipelineError::Asr(_) => "asr_error",
            PipelineError::Queue(_) => "queue_full",
            PipelineError::BadRequest(_) => "bad_request",
        }
    }
}
