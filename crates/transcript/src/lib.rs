//! Segment accumulation and sentence/paragraph combination (C3, C4, C5).
//!
//! Each stage is a plain stateful value, not a callback registry: callers
//! drive it with `append`/`process` and get emitted entities back as return
//! values, per the inversion-of-control guidance in §9 ("components expose
//! an outbound `Sink<T>`... orchestrator wires sinks to sources"). Here the
//! "sink" is just the return type; `interpreter-core` is the only thing that
//! decides what happens to what comes back (publish to the bus, feed the
//! next stage, etc).

mod combiner;
mod store;

#[cfg(feature = "paragraphs")]
mod paragraph;

pub use combiner::{SentenceCombiner, SentenceCombinerConfig};
pub use store::{AppendOutcome, SegmentStore};

#[cfg(feature = "paragraphs")]
pub use paragraph::{clean_paragraph_text, ParagraphBuilder, ParagraphBuilderConfig};
