use std::future::Future;
use std::pin::Pin;

use asr_interface::{AsrError, AsrEvent, AudioFrame, SessionConfig};
use tokio::sync::mpsc;

pub type AsrFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AsrError>> + Send + 'a>>;

/// One vendor's realtime ASR wire protocol (§4.1, §6.3).
///
/// Implementors own the transport (websocket, gRPC stream, whatever the
/// vendor speaks); `ReconnectingAsrSession` owns everything vendor-agnostic
/// on top: reconnection, id continuity, and `finalize()`-on-silence.
///
/// `send_audio` must be safe to call while a background task is draining the
/// stream returned by `connect`.
pub trait RealtimeAsrAdapter: Send + 'static {
    fn provider_name(&self) -> &'static str;

    /// Opens the connection and returns the adapter's outbound event stream.
    /// Each call replaces any previous stream — used both for the initial
    /// connect and for reconnection after a transport drop.
    fn connect(&mut self, config: &SessionConfig) -> AsrFuture<'_, mpsc::Receiver<AsrEvent>>;

    fn send_audio(&self, frame: AudioFrame) -> Result<(), AsrError>;

    /// Flushes any pending interim into a final. Called by the session after
    /// `utterance_end_ms` of silence, and by the orchestrator on stop.
    fn finalize(&mut self) -> AsrFuture<'_, ()>;

    fn close(&mut self) -> AsrFuture<'_, ()>;
}

/// Lets the orchestrator hold a vendor chosen at runtime behind one concrete
/// `ReconnectingAsrSession<Box<dyn RealtimeAsrAdapter>>` type instead of
/// being generic over every vendor crate it might be linked against.
impl RealtimeAsrAdapter for Box<dyn RealtimeAsrAdapter> {
    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn connect(&mut self, config: &SessionConfig) -> AsrFuture<'_, mpsc::Receiver<AsrEvent>> {
        (**self).connect(config)
    }

    fn send_audio(&self, frame: AudioFrame) -> Result<(), AsrError> {
        (**self).send_audio(frame)
    }

    fn finalize(&mut self) -> AsrFuture<'_, ()> {
        (**self).finalize()
    }

    fn close(&mut self) -> AsrFuture<'_, ()> {
        (**self).close()
    }
}
