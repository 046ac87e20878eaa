//! A synthetic provider that replays a fixed script of deltas, for tests and
//! the demo CLI.

use tokio::sync::mpsc;

use crate::adapter::{LlmAdapter, LlmFuture};
use crate::error::LlmError;
use crate::request::TranslateRequest;
use crate::TranslateDelta;

pub struct ScriptedLlmAdapter {
    script: Vec<Result<TranslateDelta, LlmError>>,
}

impl ScriptedLlmAdapter {
    pub fn new(script: Vec<Result<TranslateDelta, LlmError>>) -> Self {
        Self { script }
    }

    /// Convenience constructor: streams `text` one word at a time, then a
    /// `Done` carrying the whole string back.
    pub fn echoing(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut script: Vec<_> = text
            .split_whitespace()
            .map(|word| Ok(TranslateDelta::Token(format!("{word} "))))
            .collect();
        script.push(Ok(TranslateDelta::Done { text, tokens: None }));
        Self::new(script)
    }
}

impl LlmAdapter for ScriptedLlmAdapter {
    fn name(&self) -> &str {
        "scripted"
    }

    fn translate_stream(
        &self,
        _request: TranslateRequest,
    ) -> LlmFuture<'_, mpsc::Receiver<Result<TranslateDelta, LlmError>>> {
        let script = self.script.clone();
        Box::pin(async move {
            let (tx, rx) = mpsc::channel(script.len().max(1));
            for item in script {
                tx.send(item).await.ok();
            }
            Ok(rx)
        })
    }
}
