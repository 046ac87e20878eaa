use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::LlmError;
use crate::TranslateDelta;

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(2);

/// Wraps a raw adapter stream with the "synthesize completion on idle"
/// guarantee (§8 boundary behavior: "LLM delta stream ending without a
/// completion marker: adapter must synthesize completion on 2 s idle").
/// Adapters only need to stream tokens; this is the one place that rule is
/// implemented, shared by every provider.
pub struct IdleTimeoutStream {
    receiver: mpsc::Receiver<Result<TranslateDelta, LlmError>>,
    idle_timeout: Duration,
    accumulated: String,
    done: bool,
}

impl IdleTimeoutStream {
    pub fn new(receiver: mpsc::Receiver<Result<TranslateDelta, LlmError>>) -> Self {
        Self::with_idle_timeout(receiver, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(
        receiver: mpsc::Receiver<Result<TranslateDelta, LlmError>>,
        idle_timeout: Duration,
    ) -> Self {
        Self { receiver, idle_timeout, accumulated: String::new(), done: false }
    }

    pub async fn next(&mut self) -> Option<Result<TranslateDelta, LlmError>> {
        if self.done {
            return None;
        }

        match tokio::time::timeout(self.idle_timeout, self.receiver.recv()).await {
            Ok(Some(Ok(TranslateDelta::Token(token)))) => {
                self.accumulated.push_str(&token);
                Some(Ok(TranslateDelta::Token(token)))
            }
            Ok(Some(Ok(done))) => {
                self.done = true;
                Some(Ok(done))
            }
            Ok(Some(Err(err))) => {
                self.done = true;
                Some(Err(err))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(_elapsed) => {
                self.done = true;
                tracing::warn!("llm_stream_idle_timeout_synthesizing_completion");
                Some(Ok(TranslateDelta::Done { text: self.accumulated.clone(), tokens: None }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_tokens_and_done() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(TranslateDelta::Token("hola".into()))).await.unwrap();
        tx.send(Ok(TranslateDelta::Done { text: "hola".into(), tokens: Some(1) })).await.unwrap();
        drop(tx);

        let mut stream = IdleTimeoutStream::new(rx);
        assert_eq!(stream.next().await, Some(Ok(TranslateDelta::Token("hola".into()))));
        assert_eq!(
            stream.next().await,
            Some(Ok(TranslateDelta::Done { text: "hola".into(), tokens: Some(1) }))
        );
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn synthesizes_completion_after_idle_timeout() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(TranslateDelta::Token("bon".into()))).await.unwrap();
        tx.send(Ok(TranslateDelta::Token("jour".into()))).await.unwrap();

        let mut stream = IdleTimeoutStream::with_idle_timeout(rx, Duration::from_millis(50));
        stream.next().await;
        stream.next().await;

        tokio::time::advance(Duration::from_millis(60)).await;
        let synthesized = stream.next().await;
        assert_eq!(
            synthesized,
            Some(Ok(TranslateDelta::Done { text: "bonjour".into(), tokens: None }))
        );
        assert_eq!(stream.next().await, None);
    }
}
