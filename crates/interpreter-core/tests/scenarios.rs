//! End-to-end orchestrator scenarios (§8's "concrete end-to-end scenarios"),
//! exercised through the actual `InterpreterActor` rather than its
//! sub-components in isolation — those have their own focused unit tests in
//! each crate. Mirrors the e2e-style integration tests elsewhere in the
//! workspace (`crates/transcribe-proxy/tests`): spin up the real actor
//! against scripted adapters, drive it through its public command surface,
//! and assert on the events it actually publishes.

use std::sync::Arc;
use std::time::Duration;

use asr_client::test_util::ScriptedAdapter;
use asr_interface::{AsrEvent, TranscriptSegment};
use interpreter_core::{
    actors::{InterpreterActor, InterpreterArgs, InterpreterMsg},
    Ack, NoopPersistenceSink, PipelineConfig,
};
use llm_proxy::test_util::ScriptedLlmAdapter;
use llm_proxy::{LlmError, TranslateDelta};
use pipeline_ids::{SequentialIdGenFactory, SystemClock};
use pipeline_types::{ErrorKind, EventPayload, PipelineState};
use ractor::{Actor, CallResult};

fn segment(id: &str, text: &str, is_final: bool, start_ts: i64, end_ts: i64) -> TranscriptSegment {
    TranscriptSegment {
        id: pipeline_types::SegmentId::from(id),
        text: text.to_string(),
        is_final,
        confidence: 1.0,
        start_ts,
        end_ts,
        language: "en".to_string(),
    }
}

async fn spawn_interpreter(
    adapter_events: Vec<AsrEvent>,
    llm: ScriptedLlmAdapter,
) -> ractor::ActorRef<InterpreterMsg> {
    let args = InterpreterArgs {
        config_template: PipelineConfig::new("en", "ja"),
        adapter_factory: Arc::new(move || {
            Box::new(ScriptedAdapter::new(adapter_events.clone())) as Box<dyn asr_client::RealtimeAsrAdapter>
        }),
        llm_adapter: Arc::new(llm),
        clock: Arc::new(SystemClock),
        id_factory: Arc::new(SequentialIdGenFactory),
        persistence: Arc::new(NoopPersistenceSink),
    };

    // Unnamed: tests run concurrently and `ractor`'s actor registry rejects
    // re-registering the same name while a prior instance is still alive.
    let (actor_ref, _handle) = Actor::spawn(None, InterpreterActor, args).await.expect("actor spawns");
    actor_ref
}

async fn start_listening(actor_ref: &ractor::ActorRef<InterpreterMsg>) -> Ack {
    let result = actor_ref
        .call(
            |reply| InterpreterMsg::StartListening {
                source_lang: "en".into(),
                target_lang: "ja".into(),
                correlation_id: None,
                reply,
            },
            Some(Duration::from_secs(2)),
        )
        .await
        .expect("start_listening message delivered");

    match result {
        CallResult::Success(ack) => ack.expect("start_listening succeeds"),
        other => panic!("unexpected call result: {other:?}"),
    }
}

/// Scenario 1 (§8): three finals, each translated on the realtime track, and
/// combined into sentences translated on the history track.
#[tokio::test]
async fn happy_path_three_finals_produce_realtime_and_history_translations() {
    let events = vec![
        AsrEvent::Segment(segment("s1", "Hello.", true, 0, 500)),
        AsrEvent::Segment(segment("s2", "How are you?", true, 500, 1200)),
        AsrEvent::Segment(segment("s3", "I am fine.", true, 1200, 2000)),
    ];
    let actor = spawn_interpreter(events.clone(), ScriptedLlmAdapter::echoing("konnichiwa")).await;
    let subscriber = match actor_ref_subscribe(&actor).await {
        Some(sub) => sub,
        None => panic!("no active session to subscribe to"),
    };

    let ack = start_listening(&actor).await;
    assert!(matches!(ack, Ack::Started { .. }));

    let mut asr_finals = 0u32;
    let mut translation_finals = 0u32;
    let mut combined_sentences = 0u32;
    let mut last_seq = None;

    let collected = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = subscriber.recv().await;
            if let Some(prev) = last_seq {
                assert!(event.seq > prev, "seq must be strictly increasing per subscriber");
            }
            last_seq = Some(event.seq);

            match &event.payload {
                EventPayload::AsrFinal { .. } => asr_finals += 1,
                EventPayload::TranslationFinal { .. } => translation_finals += 1,
                EventPayload::CombinedSentence { .. } => combined_sentences += 1,
                _ => {}
            }

            // Three finals, each a realtime translation. History-track
            // translation of the combined sentence(s) is deferred behind the
            // paragraph builder here (paragraphs are enabled by default) and
            // isn't expected to land within this window.
            if asr_finals == 3 && translation_finals >= 3 {
                return;
            }
        }
    })
    .await;

    assert!(collected.is_ok(), "expected all events within timeout");
    assert_eq!(asr_finals, 3);
    assert!(combined_sentences >= 1, "at least one sentence should have been combined");
}

/// Scenario 1 (§8) with paragraphs disabled: each `combined_sentence` goes
/// straight to the history track instead of waiting on a paragraph to close
/// (`PipelineConfig::paragraphs_enabled: false`), so a `translation_final`
/// keyed by `sentence_id` is expected per sentence within the test window.
#[tokio::test]
async fn paragraphs_disabled_routes_each_sentence_to_history_translation() {
    let events = vec![
        AsrEvent::Segment(segment("s1", "Hello.", true, 0, 500)),
        AsrEvent::Segment(segment("s2", "How are you?", true, 500, 1200)),
        AsrEvent::Segment(segment("s3", "I am fine.", true, 1200, 2000)),
    ];

    let args = InterpreterArgs {
        config_template: {
            let mut config = PipelineConfig::new("en", "ja");
            config.paragraphs_enabled = false;
            config
        },
        adapter_factory: Arc::new({
            let events = events.clone();
            move || Box::new(ScriptedAdapter::new(events.clone())) as Box<dyn asr_client::RealtimeAsrAdapter>
        }),
        llm_adapter: Arc::new(ScriptedLlmAdapter::echoing("konnichiwa")),
        clock: Arc::new(SystemClock),
        id_factory: Arc::new(SequentialIdGenFactory),
        persistence: Arc::new(NoopPersistenceSink),
    };
    let (actor, _handle) = Actor::spawn(None, InterpreterActor, args).await.expect("actor spawns");
    let subscriber = actor_ref_subscribe(&actor).await.expect("session exists after start");

    start_listening(&actor).await;

    let mut combined_sentences = 0u32;
    let mut history_translation_finals = 0u32;

    let collected = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = subscriber.recv().await;
            match &event.payload {
                EventPayload::CombinedSentence { .. } => combined_sentences += 1,
                EventPayload::TranslationFinal { sentence_id: Some(_), .. } => history_translation_finals += 1,
                _ => {}
            }

            if combined_sentences >= 1 && history_translation_finals >= combined_sentences {
                return;
            }
        }
    })
    .await;

    assert!(collected.is_ok(), "expected history-track translations within timeout");
    assert!(combined_sentences >= 1, "at least one sentence should have been combined");
    assert_eq!(
        history_translation_finals, combined_sentences,
        "every combined sentence should produce a history translation_final when paragraphs are disabled"
    );
}

/// An adapter whose stream never produces a terminal item: the sender is
/// parked in a task that outlives the per-job deadline, so the only way the
/// queue's `run_job` can complete is via its own `request_timeout_ms` bound.
struct HangingLlmAdapter;

impl llm_proxy::LlmAdapter for HangingLlmAdapter {
    fn name(&self) -> &str {
        "hanging"
    }

    fn translate_stream(
        &self,
        _request: llm_proxy::TranslateRequest,
    ) -> llm_proxy::LlmFuture<'_, tokio::sync::mpsc::Receiver<Result<TranslateDelta, LlmError>>> {
        Box::pin(async move {
            let (tx, rx) = tokio::sync::mpsc::channel(1);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(tx);
            });
            Ok(rx)
        })
    }
}

/// Scenario 2 (§8): a job whose adapter never completes times out at the
/// queue's per-job wall-clock bound rather than hanging the session.
#[tokio::test]
async fn stalled_job_surfaces_as_translation_timeout() {
    let events = vec![AsrEvent::Segment(segment("s1", "Slow one.", true, 0, 100))];

    let args = InterpreterArgs {
        config_template: {
            let mut config = PipelineConfig::new("en", "ja");
            config.queue.request_timeout_ms = 100;
            config
        },
        adapter_factory: Arc::new(move || {
            Box::new(ScriptedAdapter::new(events.clone())) as Box<dyn asr_client::RealtimeAsrAdapter>
        }),
        llm_adapter: Arc::new(HangingLlmAdapter),
        clock: Arc::new(SystemClock),
        id_factory: Arc::new(SequentialIdGenFactory),
        persistence: Arc::new(NoopPersistenceSink),
    };
    let (actor, _handle) = Actor::spawn(None, InterpreterActor, args).await.expect("actor spawns");
    let subscriber = actor_ref_subscribe(&actor).await.expect("session exists after start");

    start_listening(&actor).await;

    let found_timeout = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = subscriber.recv().await;
            if let EventPayload::TranslationFinal { result, .. } = event.payload {
                if result.error == Some(ErrorKind::Timeout) {
                    return true;
                }
            }
        }
    })
    .await;

    assert!(matches!(found_timeout, Ok(true)), "expected a timed-out translation_final");
}

/// Scenario 6 (§8): a clean shutdown while a realtime translation is active
/// settles to `idle` within the configured grace period.
#[tokio::test]
async fn clean_shutdown_settles_to_idle() {
    let events = vec![AsrEvent::Segment(segment("s1", "Wrapping up.", true, 0, 100))];
    let actor = spawn_interpreter(events, ScriptedLlmAdapter::echoing("owari")).await;

    start_listening(&actor).await;

    let stop_result = ractor::call!(actor, InterpreterMsg::StopListening).expect("stop_listening delivered");
    let ack = stop_result.expect("stop_listening succeeds");
    assert_eq!(ack, Ack::Stopped);

    let state = ractor::call!(actor, InterpreterMsg::GetState).expect("get_state delivered");
    assert_eq!(state, PipelineState::Idle);
}

/// §8 idempotence: re-issuing `start_listening` while already listening is
/// rejected and does not alter state.
#[tokio::test]
async fn restart_while_listening_is_rejected() {
    let events = vec![AsrEvent::Segment(segment("s1", "Still going.", true, 0, 100))];
    let actor = spawn_interpreter(events, ScriptedLlmAdapter::echoing("mada")).await;

    start_listening(&actor).await;

    let second = actor
        .call(
            |reply| InterpreterMsg::StartListening {
                source_lang: "en".into(),
                target_lang: "ja".into(),
                correlation_id: None,
                reply,
            },
            Some(Duration::from_secs(2)),
        )
        .await
        .expect("message delivered");

    match second {
        CallResult::Success(Err(err)) => assert_eq!(err.code(), "already_running"),
        other => panic!("expected a rejected start, got {other:?}"),
    }
}

async fn actor_ref_subscribe(actor: &ractor::ActorRef<InterpreterMsg>) -> Option<event_bus::Subscriber> {
    ractor::call!(actor, InterpreterMsg::Subscribe).expect("subscribe delivered")
}

async fn get_history(actor: &ractor::ActorRef<InterpreterMsg>) -> Vec<pipeline_types::TranscriptSegment> {
    let result = actor
        .call(|reply| InterpreterMsg::GetHistory { since_ts: None, reply }, Some(Duration::from_secs(2)))
        .await
        .expect("get_history message delivered");
    match result {
        CallResult::Success(history) => history.expect("get_history succeeds while listening"),
        other => panic!("unexpected call result: {other:?}"),
    }
}

/// §8: `clear_history` followed by `get_history` returns an empty list.
#[tokio::test]
async fn clear_history_then_get_history_is_empty() {
    let events = vec![
        AsrEvent::Segment(segment("s1", "Hello.", true, 0, 500)),
        AsrEvent::Segment(segment("s2", "How are you?", true, 500, 1200)),
    ];
    let actor = spawn_interpreter(events, ScriptedLlmAdapter::echoing("konnichiwa")).await;
    let subscriber = actor_ref_subscribe(&actor).await.expect("session exists after start");

    start_listening(&actor).await;

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let EventPayload::AsrFinal { .. } = subscriber.recv().await.payload {
                return;
            }
        }
    })
    .await
    .expect("at least one final lands before clearing history");

    let history_before = get_history(&actor).await;
    assert!(!history_before.is_empty(), "history should hold the finals seen so far");

    let clear_result =
        ractor::call!(actor, InterpreterMsg::ClearHistory).expect("clear_history delivered");
    assert_eq!(clear_result.expect("clear_history succeeds"), Ack::Cleared);

    let history_after = get_history(&actor).await;
    assert!(history_after.is_empty(), "get_history must be empty right after clear_history");
}
