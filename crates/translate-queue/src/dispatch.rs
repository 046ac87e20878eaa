use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use llm_proxy::{IdleTimeoutStream, LlmError, TranslateDelta, TranslateRequest};
use pipeline_types::{ErrorKind, EventPayload, TranslationJob, TranslationResult};
use stream_coalescer::CoalesceOutcome;
use tokio_util::sync::CancellationToken;

use crate::request::LinkedId;
use crate::scheduler::Key;
use crate::Inner;

enum AttemptOutcome {
    Final(TranslationResult),
    Retryable(ErrorKind),
}

/// Runs one dispatched job to completion: retried attempts against the
/// adapter, each wall-clock bounded by `request_timeout_ms`, then publishes
/// exactly one `translation_final` unless the session was cancelled first
/// (§4.5, §5, §8 invariant 5).
pub(crate) async fn run_job(
    inner: Arc<Inner>,
    job: TranslationJob,
    linked_id: LinkedId,
    cancellation: CancellationToken,
) {
    let key: Key = (job.kind, linked_id.clone());

    tokio::select! {
        biased;
        _ = cancellation.cancelled() => {
            tracing::debug!(job_id = %job.id, "translation_job_cancelled");
        }
        result = dispatch_with_retry(&inner, &job, &linked_id) => {
            inner.publish_final(&job, &linked_id, result);
        }
    }

    inner.coalescer.lock().unwrap().finalize(job.id.clone(), String::new());
    inner.finish(&key);
}

async fn dispatch_with_retry(inner: &Inner, job: &TranslationJob, linked_id: &LinkedId) -> TranslationResult {
    let policy = ExponentialBuilder::default()
        .with_jitter()
        .with_factor(2.0)
        .with_min_delay(Duration::from_millis(500))
        .with_max_times(2);

    let outcome = (|| async { attempt(inner, job, linked_id).await })
        .retry(policy)
        .notify(|kind: &ErrorKind, dur: Duration| {
            tracing::warn!(
                job_id = %job.id,
                error_kind = ?kind,
                retry_delay_ms = dur.as_millis(),
                "translation_retry"
            );
        })
        .when(|kind: &ErrorKind| kind.is_retryable())
        .await;

    match outcome {
        Ok(result) => result,
        Err(kind) => TranslationResult {
            job_id: job.id.clone(),
            target_text: None,
            first_token_ts: None,
            complete_ts: inner.clock.now_ms(),
            tokens: None,
            error: Some(kind),
        },
    }
}

async fn attempt(inner: &Inner, job: &TranslationJob, linked_id: &LinkedId) -> Result<TranslationResult, ErrorKind> {
    let deadline = Duration::from_millis(inner.config.request_timeout_ms as u64);

    match tokio::time::timeout(deadline, run_single_attempt(inner, job, linked_id)).await {
        Ok(AttemptOutcome::Final(result)) => Ok(result),
        Ok(AttemptOutcome::Retryable(kind)) => Err(kind),
        Err(_elapsed) => Ok(timeout_result(inner, job)),
    }
}

fn timeout_result(inner: &Inner, job: &TranslationJob) -> TranslationResult {
    TranslationResult {
        job_id: job.id.clone(),
        target_text: None,
        first_token_ts: None,
        complete_ts: inner.clock.now_ms(),
        tokens: None,
        error: Some(ErrorKind::Timeout),
    }
}

async fn run_single_attempt(inner: &Inner, job: &TranslationJob, linked_id: &LinkedId) -> AttemptOutcome {
    let request = TranslateRequest {
        source_text: job.source_text.clone(),
        source_lang: job.source_lang.clone(),
        target_lang: job.target_lang.clone(),
        profile: inner.profile_for(job.kind),
    };

    let receiver = match inner.adapter.translate_stream(request).await {
        Ok(receiver) => receiver,
        Err(err) => return classify(job, err, inner.clock.now_ms()),
    };

    let mut stream = IdleTimeoutStream::new(receiver);
    let mut accumulated = String::new();
    let mut first_token_ts = None;

    loop {
        match stream.next().await {
            Some(Ok(TranslateDelta::Token(token))) => {
                if first_token_ts.is_none() {
                    first_token_ts = Some(inner.clock.now_ms());
                }
                accumulated.push_str(&token);
                inner.emit_partial(job, linked_id, accumulated.clone());
            }
            Some(Ok(TranslateDelta::Done { text, tokens })) => {
                return AttemptOutcome::Final(TranslationResult {
                    job_id: job.id.clone(),
                    target_text: Some(text),
                    first_token_ts,
                    complete_ts: inner.clock.now_ms(),
                    tokens,
                    error: None,
                });
            }
            Some(Err(err)) => return classify(job, err, inner.clock.now_ms()),
            None => {
                return AttemptOutcome::Final(TranslationResult {
                    job_id: job.id.clone(),
                    target_text: Some(accumulated),
                    first_token_ts,
                    complete_ts: inner.clock.now_ms(),
                    tokens: None,
                    error: None,
                });
            }
        }
    }
}

fn classify(job: &TranslationJob, err: LlmError, now_ms: i64) -> AttemptOutcome {
    if err.kind.is_retryable() {
        AttemptOutcome::Retryable(err.kind)
    } else {
        AttemptOutcome::Final(TranslationResult {
            job_id: job.id.clone(),
            target_text: None,
            first_token_ts: None,
            complete_ts: now_ms,
            tokens: None,
            error: Some(err.kind),
        })
    }
}

impl Inner {
    fn profile_for(&self, kind: pipeline_types::JobKind) -> llm_proxy::TranslateProfile {
        use llm_proxy::TranslateProfile;
        use pipeline_types::JobKind;
        match kind {
            JobKind::Realtime => TranslateProfile::Realtime,
            JobKind::History | JobKind::Summary | JobKind::User => TranslateProfile::Quality,
        }
    }

    fn emit_partial(&self, job: &TranslationJob, linked_id: &LinkedId, accumulated: String) {
        let now = self.clock.now_ms();
        let outcome = self.coalescer.lock().unwrap().update(job.id.clone(), accumulated, now);
        if let CoalesceOutcome::Emit(delta) = outcome {
            self.bus.publish(EventPayload::TranslationPartial {
                job_id: job.id.clone(),
                segment_id: linked_id.segment_id(),
                sentence_id: linked_id.sentence_id(),
                paragraph_id: linked_id.paragraph_id(),
                delta,
            });
        }
    }

    pub(crate) fn publish_final(&self, job: &TranslationJob, linked_id: &LinkedId, result: TranslationResult) {
        self.bus.publish(EventPayload::TranslationFinal {
            job_id: job.id.clone(),
            segment_id: linked_id.segment_id(),
            sentence_id: linked_id.sentence_id(),
            paragraph_id: linked_id.paragraph_id(),
            result,
        });
    }
}
