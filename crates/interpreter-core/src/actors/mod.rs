mod asr_driver;
mod pipeline;

pub use pipeline::{InterpreterActor, InterpreterArgs, InterpreterMsg};
