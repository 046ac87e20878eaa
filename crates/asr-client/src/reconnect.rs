use std::time::Duration;

use asr_interface::{AsrError, AsrEvent, SessionConfig};
use backon::{ExponentialBuilder, Retryable};
use tokio::sync::mpsc;

use crate::adapter::RealtimeAsrAdapter;

/// Reconnect policy for a dropped ASR transport (§4.1): base 500 ms, factor
/// 2, +/-20% jitter, capped at 8 s, at most 5 attempts. Applies only while
/// the session is `connected`; `AuthInvalid` is never retried.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

pub fn reconnect_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_jitter()
        .with_factor(2.0)
        .with_min_delay(Duration::from_millis(500))
        .with_max_delay(Duration::from_secs(8))
        .with_max_times(MAX_RECONNECT_ATTEMPTS as usize)
}

/// Re-opens the transport after a drop, preserving `config` (and therefore
/// the session's correlation id continuity — segments produced post-reconnect
/// continue the same id sequence since the id generator lives above this
/// call, not inside the adapter).
pub async fn reconnect<A: RealtimeAsrAdapter>(
    adapter: &mut A,
    config: &SessionConfig,
) -> Result<mpsc::Receiver<AsrEvent>, AsrError> {
    let mut attempts = 0u32;

    (|| async {
        attempts += 1;
        adapter.connect(config).await
    })
    .retry(reconnect_backoff())
    .notify(|err: &AsrError, dur: Duration| {
        tracing::warn!(
            error = %err,
            retry_delay_ms = dur.as_millis(),
            "asr_reconnect_retry"
        );
    })
    .when(|err: &AsrError| matches!(err, AsrError::Transport(_) | AsrError::Io(_)))
    .await
    .map_err(|_| AsrError::ReconnectExhausted { attempts })
}
