use std::time::Duration;

use asr_interface::{AsrError, AsrEvent, ConnectionStatus, SessionConfig, TranscriptSegment};
use pipeline_ids::IdGenerator;
use pipeline_types::SegmentId;
use tokio::sync::mpsc;

use crate::adapter::RealtimeAsrAdapter;
use crate::reconnect;
use crate::stable_prefix::shares_stable_prefix;

/// The vendor-agnostic driver the orchestrator talks to (§4.1).
///
/// Wraps one [`RealtimeAsrAdapter`] and adds everything the spec requires
/// that isn't vendor-specific: the `disconnected -> connecting -> connected
/// -> draining -> disconnected` state machine, reconnection with id
/// continuity, the stable-prefix id-synthesis rule, and `finalize()`-on-
/// silence.
pub struct ReconnectingAsrSession<A: RealtimeAsrAdapter> {
    adapter: A,
    config: SessionConfig,
    status: ConnectionStatus,
    receiver: Option<mpsc::Receiver<AsrEvent>>,
    id_gen: Box<dyn IdGenerator>,
    /// `(id, text)` of the interim currently in flight, if any. Used both
    /// for the stable-prefix rule and as the source for synthesized finals.
    current_interim: Option<(SegmentId, TranscriptSegment)>,
}

impl<A: RealtimeAsrAdapter> ReconnectingAsrSession<A> {
    pub fn new(adapter: A, config: SessionConfig, id_gen: Box<dyn IdGenerator>) -> Self {
        Self {
            adapter,
            config,
            status: ConnectionStatus::Disconnected,
            receiver: None,
            id_gen,
            current_interim: None,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub async fn connect(&mut self) -> Result<(), AsrError> {
        self.status = ConnectionStatus::Connecting;
        let receiver = self.adapter.connect(&self.config).await?;
        self.receiver = Some(receiver);
        self.status = ConnectionStatus::Connected;
        Ok(())
    }

    pub fn send_audio(&self, frame: asr_interface::AudioFrame) -> Result<(), AsrError> {
        if self.status != ConnectionStatus::Connected {
            return Err(AsrError::NotConnected);
        }
        self.adapter.send_audio(frame)
    }

    /// Waits for the next normalized event, reconnecting transparently on a
    /// dropped transport and synthesizing a final from the pending interim
    /// after `utterance_end_ms` of silence (§4.1).
    pub async fn next_event(&mut self) -> Result<Option<AsrEvent>, AsrError> {
        loop {
            if self.status != ConnectionStatus::Connected {
                return Ok(None);
            }

            let timeout = Duration::from_millis(self.config.utterance_end_ms as u64);
            let receiver = self
                .receiver
                .as_mut()
                .expect("connected session always has a receiver");

            match tokio::time::timeout(timeout, receiver.recv()).await {
                Ok(Some(AsrEvent::Segment(segment))) => {
                    return Ok(Some(AsrEvent::Segment(self.assign_id(segment))));
                }
                Ok(Some(status @ AsrEvent::Status(_))) => return Ok(Some(status)),
                Ok(None) => {
                    // Transport dropped; reconnect preserving the session
                    // config (and therefore correlation id continuity).
                    match reconnect::reconnect(&mut self.adapter, &self.config).await {
                        Ok(receiver) => {
                            self.receiver = Some(receiver);
                            continue;
                        }
                        Err(err) => {
                            self.status = ConnectionStatus::Disconnected;
                            return Err(err);
                        }
                    }
                }
                Err(_elapsed) => {
                    if let Some(event) = self.synthesize_finalize() {
                        return Ok(Some(event));
                    }
                    continue;
                }
            }
        }
    }

    /// Flushes any pending interim into a final, via the adapter if it
    /// supports it and locally otherwise. Called by the orchestrator on
    /// stop, and internally after `utterance_end_ms` of silence.
    pub async fn finalize(&mut self) -> Result<Option<AsrEvent>, AsrError> {
        self.adapter.finalize().await?;
        Ok(self.synthesize_finalize())
    }

    pub async fn close(&mut self) -> Result<(), AsrError> {
        self.status = ConnectionStatus::Draining;
        let result = self.adapter.close().await;
        self.status = ConnectionStatus::Disconnected;
        self.receiver = None;
        result
    }

    fn synthesize_finalize(&mut self) -> Option<AsrEvent> {
        let (_, mut segment) = self.current_interim.take()?;
        segment.is_final = true;
        Some(AsrEvent::Segment(segment))
    }

    fn assign_id(&mut self, mut segment: TranscriptSegment) -> TranscriptSegment {
        if segment.id.as_str().is_empty() {
            let reuse = self
                .current_interim
                .as_ref()
                .filter(|(_, current)| shares_stable_prefix(&current.text, &segment.text))
                .map(|(id, _)| id.clone());

            segment.id = reuse.unwrap_or_else(|| SegmentId::from(self.id_gen.next_id()));
        }

        if segment.is_final {
            self.current_interim = None;
        } else {
            self.current_interim = Some((segment.id.clone(), segment.clone()));
        }

        segment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::ScriptedAdapter;

    /// Drops its outbound channel after the first `connect()` call, then
    /// serves the rest of the script on the next — simulates a mid-session
    /// transport drop for the reconnect test below.
    struct FlakyAdapter {
        first_batch: Vec<AsrEvent>,
        second_batch: Vec<AsrEvent>,
        connects: u32,
    }

    impl FlakyAdapter {
        fn new(first_batch: Vec<AsrEvent>, second_batch: Vec<AsrEvent>) -> Self {
            Self { first_batch, second_batch, connects: 0 }
        }
    }

    impl RealtimeAsrAdapter for FlakyAdapter {
        fn provider_name(&self) -> &'static str {
            "flaky"
        }

        fn connect(&mut self, _config: &SessionConfig) -> crate::adapter::AsrFuture<'_, mpsc::Receiver<AsrEvent>> {
            self.connects += 1;
            let batch = if self.connects == 1 {
                std::mem::take(&mut self.first_batch)
            } else {
                std::mem::take(&mut self.second_batch)
            };
            Box::pin(async move {
                let (tx, rx) = mpsc::channel(batch.len().max(1));
                for event in batch {
                    tx.send(event).await.ok();
                }
                // `tx` drops here, closing the channel so `recv()` returns
                // `None` and the session treats it as a transport drop.
                Ok(rx)
            })
        }

        fn send_audio(&self, _frame: asr_interface::AudioFrame) -> Result<(), AsrError> {
            Ok(())
        }

        fn finalize(&mut self) -> crate::adapter::AsrFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }

        fn close(&mut self) -> crate::adapter::AsrFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn reconnects_transparently_after_transport_drop() {
        let adapter = FlakyAdapter::new(
            vec![AsrEvent::Segment(segment("s5", "partial utterance", false))],
            vec![AsrEvent::Segment(segment("s5", "partial utterance continues", true))],
        );
        let mut session = ReconnectingAsrSession::new(
            adapter,
            SessionConfig::new("en", "ja"),
            Box::new(pipeline_ids::SequentialIdGen::new("seg")),
        );
        session.connect().await.unwrap();

        let interim = session.next_event().await.unwrap().unwrap();
        match interim {
            AsrEvent::Segment(s) => assert!(!s.is_final),
            _ => panic!("expected interim segment"),
        }

        // First channel closes after the interim; `next_event` reconnects
        // internally (§8 scenario 4) and yields the continuation without the
        // caller observing the drop.
        let continued = session.next_event().await.unwrap().unwrap();
        match continued {
            AsrEvent::Segment(s) => {
                assert!(s.is_final);
                assert_eq!(s.id, SegmentId::from("s5"), "reconnect preserves id continuity");
            }
            _ => panic!("expected final segment"),
        }
        assert_eq!(session.status(), ConnectionStatus::Connected);
    }

    fn segment(id: &str, text: &str, is_final: bool) -> TranscriptSegment {
        TranscriptSegment {
            id: SegmentId::from(id),
            text: text.to_string(),
            is_final,
            confidence: 1.0,
            start_ts: 0,
            end_ts: 0,
            language: "en".to_string(),
        }
    }

    #[tokio::test]
    async fn assigns_ids_when_vendor_omits_them() {
        let adapter = ScriptedAdapter::new(vec![
            AsrEvent::Segment(segment("", "hello there friend", false)),
            AsrEvent::Segment(segment("", "hello there friend again", false)),
            AsrEvent::Segment(segment("", "a different utterance", false)),
        ]);
        let mut session = ReconnectingAsrSession::new(
            adapter,
            SessionConfig::new("en", "ja"),
            Box::new(pipeline_ids::SequentialIdGen::new("seg")),
        );
        session.connect().await.unwrap();

        let first = session.next_event().await.unwrap().unwrap();
        let second = session.next_event().await.unwrap().unwrap();
        let third = session.next_event().await.unwrap().unwrap();

        let id_of = |event: AsrEvent| match event {
            AsrEvent::Segment(s) => s.id,
            _ => panic!("expected segment"),
        };
        let (id1, id2, id3) = (id_of(first), id_of(second), id_of(third));
        assert_eq!(id1, id2, "shared leading-3-word prefix reuses the id");
        assert_ne!(id2, id3, "distinct prefix mints a new id");
    }

    #[tokio::test]
    async fn finalize_flushes_pending_interim() {
        let adapter = ScriptedAdapter::new(vec![AsrEvent::Segment(segment("", "still speaking", false))]);
        let mut session = ReconnectingAsrSession::new(
            adapter,
            SessionConfig::new("en", "ja"),
            Box::new(pipeline_ids::SequentialIdGen::new("seg")),
        );
        session.connect().await.unwrap();
        session.next_event().await.unwrap();

        let flushed = session.finalize().await.unwrap().expect("pending interim flushed");
        match flushed {
            AsrEvent::Segment(s) => assert!(s.is_final),
            _ => panic!("expected segment"),
        }
    }
}
