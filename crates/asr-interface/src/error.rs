/// Error kinds the ASR adapter surfaces to the orchestrator (§4.1, §7).
///
/// `Transport` is retried by the reconnect policy; `AuthInvalid` escalates to
/// the orchestrator as a non-recoverable `error` event. Malformed vendor
/// messages are not represented here — they are logged and dropped without
/// closing the connection.
#[derive(Debug, thiserror::Error)]
pub enum AsrError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication failed: {0}")]
    AuthInvalid(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("reconnect attempts exhausted after {attempts} tries")]
    ReconnectExhausted { attempts: u32 },

    #[error("adapter is not connected")]
    NotConnected,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
