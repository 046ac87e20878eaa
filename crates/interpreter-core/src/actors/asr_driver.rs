use asr_client::{AsrError, AsrEvent, AudioFrame, RealtimeAsrAdapter, ReconnectingAsrSession};
use ractor::ActorRef;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::pipeline::InterpreterMsg;

/// Sole consumer of the session's ASR connection (§5 "the ASR connection is
/// owned by C2 exclusively; a single writer sends audio, a single reader
/// drains results"). Owning the session in a dedicated task rather than
/// sharing it behind a lock means `send_audio` and draining results never
/// contend for the same borrow.
pub(super) enum AsrDriverCmd {
    Audio(AudioFrame),
    /// Replies with whatever final the flush synthesized, if any — the
    /// caller (`stop_session`) applies it directly rather than racing the
    /// normal `AsrEvent` cast, so a flushed-on-stop final is never double
    /// processed.
    Finalize(oneshot::Sender<Option<AsrEvent>>),
}

/// Spawns the task that owns `session` for the rest of the pipeline's life,
/// returning the handle used to forward commands into it. The caller must
/// have already called `session.connect()` — this loop only drains and
/// forwards, it never opens the initial connection.
pub(super) fn spawn(
    mut session: ReconnectingAsrSession<Box<dyn RealtimeAsrAdapter>>,
    actor: ActorRef<InterpreterMsg>,
    cancellation: CancellationToken,
) -> (mpsc::Sender<AsrDriverCmd>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<AsrDriverCmd>(256);

    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    let _ = session.close().await;
                    return;
                }
                cmd = rx.recv() => {
                    match cmd {
                        Some(AsrDriverCmd::Audio(frame)) => {
                            if let Err(err) = session.send_audio(frame) {
                                tracing::warn!(%err, "asr_send_audio_dropped");
                            }
                        }
                        Some(AsrDriverCmd::Finalize(reply)) => {
                            let flushed = match session.finalize().await {
                                Ok(event) => event,
                                Err(err) => {
                                    tracing::warn!(%err, "asr_finalize_failed");
                                    None
                                }
                            };
                            let _ = session.close().await;
                            let _ = reply.send(flushed);
                            return;
                        }
                        None => {
                            let _ = session.close().await;
                            return;
                        }
                    }
                }
                event = session.next_event() => {
                    match event {
                        Ok(Some(event)) => {
                            let _ = actor.cast(InterpreterMsg::AsrEvent(event));
                        }
                        Ok(None) => {}
                        Err(err) => {
                            let _ = actor.cast(InterpreterMsg::AsrFatal(fatal_message(&err)));
                            return;
                        }
                    }
                }
            }
        }
    });

    (tx, handle)
}

fn fatal_message(err: &AsrError) -> String {
    err.to_string()
}
