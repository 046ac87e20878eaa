use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::error::LlmError;
use crate::request::TranslateRequest;
use crate::TranslateDelta;

pub type LlmFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LlmError>> + Send + 'a>>;

/// One LLM provider's translation boundary (§4.5, §6.4). The translation
/// queue is the only caller; it owns retry/backoff, concurrency limits, and
/// per-request timeouts, so an adapter only has to stream deltas for a
/// single in-flight request.
pub trait LlmAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn translate_stream(
        &self,
        request: TranslateRequest,
    ) -> LlmFuture<'_, mpsc::Receiver<Result<TranslateDelta, LlmError>>>;
}
