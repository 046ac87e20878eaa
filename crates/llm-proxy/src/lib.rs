//! The LLM adapter boundary (§4.5, §6.4).
//!
//! `LlmAdapter` is the single per-provider seam; the translation queue in
//! `translate-queue` is the only caller. [`IdleTimeoutStream`] wraps a raw
//! adapter stream with the "synthesize completion on 2 s idle" guarantee
//! (§8) so individual adapters don't each have to implement it.

mod adapter;
mod error;
mod idle;
mod request;

pub use adapter::{LlmAdapter, LlmFuture};
pub use error::LlmError;
pub use idle::IdleTimeoutStream;
pub use request::{TranslateProfile, TranslateRequest};

/// One item of an adapter's translation stream (§6.4).
#[derive(Debug, Clone, PartialEq)]
pub enum TranslateDelta {
    Token(String),
    Done { text: String, tokens: Option<u32> },
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;
