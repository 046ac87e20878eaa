use pipeline_types::PipelineState;

/// The events that drive `PipelineStateMachine` transitions (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    StartCommand,
    AsrConnected,
    AsrFatal,
    Timeout,
    PauseCommand,
    ResumeCommand,
    StopCommand,
    Drained,
    Fatal,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("transition {transition:?} is not valid from state {from:?}")]
pub struct StateError {
    pub from: PipelineState,
    pub transition: Transition,
}

/// Pipeline lifecycle state machine (C9, §4.9). Pure and synchronous — it
/// holds no I/O and no clock, so the orchestrator can unit-test every
/// transition and guard in isolation from the rest of the pipeline.
#[derive(Debug, Default)]
pub struct PipelineStateMachine {
    state: PipelineState,
}

impl PipelineStateMachine {
    pub fn new() -> Self {
        Self { state: PipelineState::Idle }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Applies one transition, returning the resulting state or rejecting it
    /// if it isn't legal from the current state.
    pub fn apply(&mut self, transition: Transition) -> Result<PipelineState, StateError> {
        use PipelineState::*;
        use Transition::*;

        let next = match (self.state, transition) {
            (Idle, StartCommand) => Starting,
            (Starting, AsrConnected) => Listening,
            (Starting, AsrFatal | Timeout) => Error,
            (Listening, PauseCommand) => Paused,
            (Paused, ResumeCommand) => Listening,
            (Listening, StopCommand) => Stopping,
            (Stopping, Drained) => Idle,
            (_, Fatal) => Error,
            (Error, Reset) => Idle,
            _ => return Err(StateError { from: self.state, transition }),
        };

        self.state = next;
        Ok(next)
    }

    /// `send_audio` is accepted only while `listening` (§4.9 guards).
    pub fn can_send_audio(&self) -> bool {
        self.state == PipelineState::Listening
    }

    /// `enqueue` is accepted in `listening` or `stopping`, to allow the
    /// queue to drain on shutdown (§4.9 guards).
    pub fn can_enqueue(&self) -> bool {
        matches!(self.state, PipelineState::Listening | PipelineState::Stopping)
    }

    /// Language changes are accepted only at rest; mid-stream changes
    /// require a controlled restart (§4.9 guards).
    pub fn can_change_language(&self) -> bool {
        self.state == PipelineState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_cycle() {
        let mut fsm = PipelineStateMachine::new();
        assert_eq!(fsm.apply(Transition::StartCommand).unwrap(), PipelineState::Starting);
        assert_eq!(fsm.apply(Transition::AsrConnected).unwrap(), PipelineState::Listening);
        assert!(fsm.can_send_audio());
        assert_eq!(fsm.apply(Transition::PauseCommand).unwrap(), PipelineState::Paused);
        assert!(!fsm.can_send_audio());
        assert_eq!(fsm.apply(Transition::ResumeCommand).unwrap(), PipelineState::Listening);
        assert_eq!(fsm.apply(Transition::StopCommand).unwrap(), PipelineState::Stopping);
        assert!(fsm.can_enqueue());
        assert_eq!(fsm.apply(Transition::Drained).unwrap(), PipelineState::Idle);
    }

    #[test]
    fn starting_to_error_on_asr_fatal() {
        let mut fsm = PipelineStateMachine::new();
        fsm.apply(Transition::StartCommand).unwrap();
        assert_eq!(fsm.apply(Transition::AsrFatal).unwrap(), PipelineState::Error);
        assert_eq!(fsm.apply(Transition::Reset).unwrap(), PipelineState::Idle);
    }

    #[test]
    fn fatal_is_reachable_from_any_state() {
        let mut fsm = PipelineStateMachine::new();
        fsm.apply(Transition::StartCommand).unwrap();
        fsm.apply(Transition::AsrConnected).unwrap();
        assert_eq!(fsm.apply(Transition::Fatal).unwrap(), PipelineState::Error);
    }

    #[test]
    fn rejects_illegal_transition() {
        let mut fsm = PipelineStateMachine::new();
        let err = fsm.apply(Transition::AsrConnected).unwrap_err();
        assert_eq!(err.from, PipelineState::Idle);
        assert_eq!(fsm.state(), PipelineState::Idle, "rejected transition leaves state unchanged");
    }

    #[test]
    fn language_change_guard_only_idle() {
        let mut fsm = PipelineStateMachine::new();
        assert!(fsm.can_change_language());
        fsm.apply(Transition::StartCommand).unwrap();
        assert!(!fsm.can_change_language());
    }

    #[test]
    fn enqueue_guard_allows_listening_and_stopping_only() {
        let mut fsm = PipelineStateMachine::new();
        assert!(!fsm.can_enqueue());
        fsm.apply(Transition::StartCommand).unwrap();
        assert!(!fsm.can_enqueue());
        fsm.apply(Transition::AsrConnected).unwrap();
        assert!(fsm.can_enqueue());
        fsm.apply(Transition::StopCommand).unwrap();
        assert!(fsm.can_enqueue());
    }
}
