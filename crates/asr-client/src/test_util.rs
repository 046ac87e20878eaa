//! A synthetic adapter that replays a fixed script of events, for tests and
//! the demo CLI. Never talks to a real vendor.

use asr_interface::{AsrError, AsrEvent, AudioFrame, SessionConfig};
use tokio::sync::mpsc;

use crate::adapter::{AsrFuture, RealtimeAsrAdapter};

pub struct ScriptedAdapter {
    events: Vec<AsrEvent>,
}

impl ScriptedAdapter {
    pub fn new(events: Vec<AsrEvent>) -> Self {
        Self { events }
    }
}

impl RealtimeAsrAdapter for ScriptedAdapter {
    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn connect(&mut self, _config: &SessionConfig) -> AsrFuture<'_, mpsc::Receiver<AsrEvent>> {
        let events = std::mem::take(&mut self.events);
        Box::pin(async move {
            let (tx, rx) = mpsc::channel(events.len().max(1));
            for event in events {
                // Script is pre-sized to the channel capacity; a send
                // failure here means the receiver was dropped before we
                // could hand it back, which never happens in this adapter.
                tx.send(event).await.ok();
            }
            Ok(rx)
        })
    }

    fn send_audio(&self, _frame: AudioFrame) -> Result<(), AsrError> {
        Ok(())
    }

    fn finalize(&mut self) -> AsrFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn close(&mut self) -> AsrFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}
