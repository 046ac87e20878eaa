use llm_proxy::{LlmAdapter, LlmError, LlmFuture, TranslateDelta, TranslateRequest};
use tokio::sync::mpsc;

/// A translator that doesn't translate: it streams the source text back one
/// word at a time, tagged with the target language. Stands in for a real
/// provider in the demo harness, the way `ScriptedLlmAdapter` stands in for
/// one in tests — the difference is this one actually reacts to each
/// request instead of replaying a fixed script.
pub struct EchoTranslator;

impl LlmAdapter for EchoTranslator {
    fn name(&self) -> &str {
        "echo"
    }

    fn translate_stream(
        &self,
        request: TranslateRequest,
    ) -> LlmFuture<'_, mpsc::Receiver<Result<TranslateDelta, LlmError>>> {
        Box::pin(async move {
            let tagged = format!("[{}] {}", request.target_lang, request.source_text);
            let words: Vec<String> = tagged.split_whitespace().map(str::to_string).collect();
            let (tx, rx) = mpsc::channel(words.len().max(1) + 1);
            for word in &words {
                tx.send(Ok(TranslateDelta::Token(format!("{word} ")))).await.ok();
            }
            tx.send(Ok(TranslateDelta::Done { text: tagged, tokens: Some(words.len() as u32) })).await.ok();
            Ok(rx)
        })
    }
}
