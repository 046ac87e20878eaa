/// Pipeline lifecycle state (§3, §4.9). Transitions and guards live in
/// `interpreter-core`; this type is the shared vocabulary both the
/// orchestrator and the event bus speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Starting,
    Listening,
    Paused,
    Stopping,
    Error,
}

impl Default for PipelineState {
    fn default() -> Self {
        PipelineState::Idle
    }
}
