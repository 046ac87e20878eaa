//! Wires C2-C10 into one session-scoped orchestrator (C11, §4.10).
//!
//! [`actors::InterpreterActor`] is the `ractor` actor a host application
//! spawns once per process; each `start_listening` call builds a fresh
//! [`actors::InterpreterArgs`]-configured session graph and tears it down
//! wholesale on `stop_listening` or fatal error. Everything this crate
//! depends on (ASR, LLM, transcript accumulation, the translation queue, the
//! event bus) is a narrow trait or concrete type from a lower crate; this is
//! the only crate that knows how they're supposed to fit together.

pub mod actors;
mod command;
mod config;
mod error;
mod persistence;
mod state;

pub use command::{Ack, Command};
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use persistence::{HistoryBlock, NoopPersistenceSink, PersistenceSink, SessionMeta};
pub use state::{PipelineStateMachine, StateError, Transition};

pub use actors::{InterpreterActor, InterpreterArgs, InterpreterMsg};
