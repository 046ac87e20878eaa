use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use asr_client::{AsrEvent, AudioFrame, RealtimeAsrAdapter, ReconnectingAsrSession};
use event_bus::{EventBus, Subscriber};
use llm_proxy::{LlmAdapter, TranslateProfile};
use pipeline_ids::{Clock, IdGeneratorFactory};
use pipeline_types::{
    CombinedSentence, CorrelationId, ErrorKind, Event, EventPayload, JobId, JobKind, Paragraph, ParagraphId,
    ParagraphStatus, PipelineState, Priority, SegmentId, SentenceId, StatusLevel, Summary, TranscriptSegment,
};
use progressive_summarizer::{ProgressiveSummarizer, SummaryTrigger};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use stream_coalescer::{CoalesceOutcome, StreamCoalescer};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use transcript::{ParagraphBuilder, SegmentStore, SentenceCombiner};
use translate_queue::{EnqueueRequest, LinkedId, TranslateQueue};

use super::asr_driver::{self, AsrDriverCmd};
use crate::command::Ack;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::persistence::{HistoryBlock, PersistenceSink, SessionMeta};
use crate::state::{PipelineStateMachine, Transition};

/// Construction arguments for [`InterpreterActor`] (§4.10). `adapter_factory`
/// mints a fresh ASR adapter per session rather than per-process, since a
/// `Box<dyn RealtimeAsrAdapter>` is consumed by the session it's connected
/// to and can't outlive a `stop_listening`/`start_listening` cycle.
pub struct InterpreterArgs {
    pub config_template: PipelineConfig,
    pub adapter_factory: Arc<dyn Fn() -> Box<dyn RealtimeAsrAdapter> + Send + Sync>,
    pub llm_adapter: Arc<dyn LlmAdapter>,
    pub clock: Arc<dyn Clock>,
    pub id_factory: Arc<dyn IdGeneratorFactory>,
    pub persistence: Arc<dyn PersistenceSink>,
}

/// The command/event surface of the running orchestrator actor (§6.1).
/// `AsrEvent`/`AsrFatal`/`BusEvent`/`Tick` are internal, cast by the
/// background tasks this actor owns — never sent by a host application.
pub enum InterpreterMsg {
    StartListening {
        source_lang: String,
        target_lang: String,
        correlation_id: Option<CorrelationId>,
        reply: RpcReplyPort<Result<Ack, PipelineError>>,
    },
    StopListening(RpcReplyPort<Result<Ack, PipelineError>>),
    PauseListening(RpcReplyPort<Result<Ack, PipelineError>>),
    ResumeListening(RpcReplyPort<Result<Ack, PipelineError>>),
    SendAudioChunk(AudioFrame),
    ClearHistory(RpcReplyPort<Result<Ack, PipelineError>>),
    GetHistory { since_ts: Option<i64>, reply: RpcReplyPort<Result<Vec<TranscriptSegment>, PipelineError>> },
    GenerateVocabulary(RpcReplyPort<Result<Ack, PipelineError>>),
    GenerateFinalReport(RpcReplyPort<Result<Ack, PipelineError>>),
    GetState(RpcReplyPort<PipelineState>),
    Subscribe(RpcReplyPort<Option<Subscriber>>),
    AsrEvent(AsrEvent),
    AsrFatal(String),
    BusEvent(Event),
    Tick,
    ParagraphCleaned { paragraph_id: ParagraphId, clean_text: String },
}

enum AdhocKind {
    Vocabulary,
    FinalReport,
}

/// Everything that exists only while a session is running. Torn down and
/// dropped wholesale by `stop_session`; a fresh one is built by every
/// `start_listening`, per §4.10's "constructs the graph on start_listening".
struct ActiveSession {
    config: PipelineConfig,
    correlation_id: CorrelationId,
    clock: Arc<dyn Clock>,
    persistence: Arc<dyn PersistenceSink>,
    actor: ActorRef<InterpreterMsg>,
    bus: EventBus,
    store: SegmentStore,
    combiner: SentenceCombiner,
    paragraph: Option<ParagraphBuilder>,
    summarizer: ProgressiveSummarizer,
    interim_coalescer: StreamCoalescer<SegmentId, TranscriptSegment>,
    queue: TranslateQueue,
    queue_cancellation: CancellationToken,
    queue_driver: JoinHandle<()>,
    asr_tx: mpsc::Sender<AsrDriverCmd>,
    asr_cancellation: CancellationToken,
    asr_driver: JoinHandle<()>,
    observer: JoinHandle<()>,
    ticker: JoinHandle<()>,
    /// Clone of the bus-observer task's own subscriber, kept here purely to
    /// poll `take_dropped_count()` without competing with that task's
    /// `recv()` loop for events (§4.8's `dropped_since_last` on `Status`).
    status_dropped: Subscriber,
    internal_error_times: VecDeque<i64>,
    /// Sentences awaiting their history-track translation, keyed by
    /// `SentenceId`. Always populated on `combined_sentence`, even when
    /// paragraphs are enabled — paragraph-level history blocks pull their
    /// member sentences back out of here (§6.5).
    history_pending: HashMap<SentenceId, CombinedSentence>,
    paragraph_pending: HashMap<ParagraphId, Paragraph>,
    summary_pending: HashMap<JobId, (SummaryTrigger, i64)>,
    adhoc_pending: HashMap<JobId, AdhocKind>,
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.queue_cancellation.cancel();
        self.asr_cancellation.cancel();
        self.queue_driver.abort();
        self.asr_driver.abort();
        self.observer.abort();
        self.ticker.abort();
    }
}

pub struct InterpreterState {
    args: InterpreterArgs,
    fsm: PipelineStateMachine,
    session: Option<ActiveSession>,
    /// Long-lived for the actor's whole life, not just one session's — lets
    /// a host application subscribe before the first `start_listening` and
    /// keep the same `Subscriber` across `stop_listening`/`start_listening`
    /// cycles. Each session's own bus is `bus.rebind(correlation_id)`, which
    /// carries this subscriber list forward with a fresh per-session `seq`.
    bus: EventBus,
}

pub struct InterpreterActor;

impl InterpreterActor {
    pub fn name() -> ractor::ActorName {
        "interpreter_core_actor".into()
    }
}

#[ractor::async_trait]
impl Actor for InterpreterActor {
    type Msg = InterpreterMsg;
    type State = InterpreterState;
    type Arguments = InterpreterArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let bus = EventBus::new(CorrelationId::from(""), args.clock.clone());
        Ok(InterpreterState { args, fsm: PipelineStateMachine::new(), session: None, bus })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            InterpreterMsg::StartListening { source_lang, target_lang, correlation_id, reply } => {
                let result = start_session(&myself, state, source_lang, target_lang, correlation_id).await;
                let _ = reply.send(result);
            }
            InterpreterMsg::StopListening(reply) => {
                let result = stop_session(state).await;
                let _ = reply.send(result);
            }
            InterpreterMsg::PauseListening(reply) => {
                let _ = reply.send(state.fsm.apply(Transition::PauseCommand).map(|_| Ack::Paused).map_err(Into::into));
            }
            InterpreterMsg::ResumeListening(reply) => {
                let _ = reply.send(state.fsm.apply(Transition::ResumeCommand).map(|_| Ack::Resumed).map_err(Into::into));
            }
            InterpreterMsg::SendAudioChunk(frame) => {
                send_audio(state, frame);
            }
            InterpreterMsg::ClearHistory(reply) => {
                let _ = reply.send(clear_history(state));
            }
            InterpreterMsg::GetHistory { since_ts, reply } => {
                let _ = reply.send(get_history(state, since_ts));
            }
            InterpreterMsg::GenerateVocabulary(reply) => {
                let _ = reply.send(generate_vocabulary(state));
            }
            InterpreterMsg::GenerateFinalReport(reply) => {
                let _ = reply.send(generate_final_report(state));
            }
            InterpreterMsg::GetState(reply) => {
                let _ = reply.send(state.fsm.state());
            }
            InterpreterMsg::Subscribe(reply) => {
                let _ = reply.send(Some(state.bus.subscribe()));
            }
            InterpreterMsg::AsrEvent(event) => {
                if let Some(session) = state.session.as_mut() {
                    apply_asr_event(session, event);
                }
            }
            InterpreterMsg::AsrFatal(message) => {
                handle_asr_fatal(state, message);
            }
            InterpreterMsg::BusEvent(event) => {
                on_bus_event(state, event);
            }
            InterpreterMsg::Tick => {
                on_tick(state);
            }
            InterpreterMsg::ParagraphCleaned { paragraph_id, clean_text } => {
                if let Some(session) = state.session.as_mut() {
                    on_paragraph_cleaned(session, paragraph_id, clean_text);
                }
            }
        }
        Ok(())
    }
}

async fn start_session(
    myself: &ActorRef<InterpreterMsg>,
    state: &mut InterpreterState,
    source_lang: String,
    target_lang: String,
    correlation_id: Option<CorrelationId>,
) -> Result<Ack, PipelineError> {
    if state.session.is_some() {
        return Err(PipelineError::AlreadyRunning);
    }
    state.fsm.apply(Transition::StartCommand)?;

    let mut config = state.args.config_template.clone();
    config.session.source_lang = source_lang;
    config.session.target_lang = target_lang;

    let correlation_id =
        correlation_id.unwrap_or_else(|| CorrelationId::from(state.args.id_factory.make("corr").next_id()));
    let bus = state.bus.rebind(correlation_id.clone());

    let adapter = (state.args.adapter_factory)();
    let mut asr_session =
        ReconnectingAsrSession::new(adapter, config.session.clone(), state.args.id_factory.make("seg"));

    if let Err(err) = asr_session.connect().await {
        let _ = state.fsm.apply(Transition::AsrFatal);
        return Err(PipelineError::Asr(err));
    }
    state.fsm.apply(Transition::AsrConnected)?;

    let asr_cancellation = CancellationToken::new();
    let (asr_tx, asr_driver) = asr_driver::spawn(asr_session, myself.clone(), asr_cancellation.clone());

    let queue = TranslateQueue::new(
        config.queue,
        state.args.llm_adapter.clone(),
        bus.clone(),
        state.args.clock.clone(),
        state.args.id_factory.make("job"),
    );
    let queue_cancellation = CancellationToken::new();
    let queue_driver = queue.spawn_driver(queue_cancellation.clone());

    let combiner = SentenceCombiner::new(config.combiner, state.args.id_factory.make("sent"));
    let paragraph =
        config.paragraphs_enabled.then(|| ParagraphBuilder::new(config.paragraph, state.args.id_factory.make("para")));
    let summarizer = ProgressiveSummarizer::new(config.summarizer.clone());
    let interim_coalescer = StreamCoalescer::new(config.coalescer);

    let started_at_ms = state.args.clock.now_ms();
    state.args.persistence.on_session_start(&SessionMeta {
        correlation_id: correlation_id.clone(),
        source_lang: config.session.source_lang.clone(),
        target_lang: config.session.target_lang.clone(),
        started_at_ms,
    });

    let observer_sub = bus.subscribe();
    let status_dropped = observer_sub.clone();
    let observer_actor = myself.clone();
    let observer = tokio::spawn(async move {
        loop {
            let event = observer_sub.recv().await;
            if observer_actor.cast(InterpreterMsg::BusEvent(event)).is_err() {
                return;
            }
        }
    });

    let ticker_actor = myself.clone();
    let ticker = tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(250)).await;
            if ticker_actor.cast(InterpreterMsg::Tick).is_err() {
                return;
            }
        }
    });

    state.session = Some(ActiveSession {
        config,
        correlation_id: correlation_id.clone(),
        clock: state.args.clock.clone(),
        persistence: state.args.persistence.clone(),
        actor: myself.clone(),
        bus,
        store: SegmentStore::new(),
        combiner,
        paragraph,
        summarizer,
        interim_coalescer,
        queue,
        queue_cancellation,
        queue_driver,
        asr_tx,
        asr_cancellation,
        asr_driver,
        observer,
        ticker,
        status_dropped,
        internal_error_times: VecDeque::new(),
        history_pending: HashMap::new(),
        paragraph_pending: HashMap::new(),
        summary_pending: HashMap::new(),
        adhoc_pending: HashMap::new(),
    });

    Ok(Ack::Started { correlation_id })
}

/// Teardown sequence from §4.10: finalize the ASR session, flush the
/// combiner, drain the queue with a grace period, then settle to `idle`.
async fn stop_session(state: &mut InterpreterState) -> Result<Ack, PipelineError> {
    let mut session = state.session.take().ok_or(PipelineError::NotRunning)?;
    state.fsm.apply(Transition::StopCommand)?;

    let (reply_tx, reply_rx) = oneshot::channel();
    let _ = session.asr_tx.send(AsrDriverCmd::Finalize(reply_tx)).await;
    if let Ok(Ok(Some(event))) = tokio::time::timeout(Duration::from_secs(2), reply_rx).await {
        apply_asr_event(&mut session, event);
    }

    if let Some(sentence) = session.combiner.force_emit() {
        on_combined_sentence(&mut session, sentence);
    }
    if let Some(builder) = session.paragraph.as_mut() {
        if let Some(paragraph) = builder.force_flush() {
            on_paragraph_complete(&mut session, paragraph);
        }
    }

    session.queue_cancellation.cancel();
    let grace = Duration::from_millis(session.config.stop_grace_ms as u64);
    let _ = tokio::time::timeout(grace, async {
        while session.queue.active_count() > 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;

    session.asr_cancellation.cancel();
    session.persistence.on_session_end();
    let dropped_since_last = session.status_dropped.take_dropped_count();
    session.bus.publish(EventPayload::Status {
        level: StatusLevel::Info,
        state: Some(PipelineState::Idle),
        message: "session stopped".into(),
        dropped_since_last,
    });

    state.fsm.apply(Transition::Drained)?;
    Ok(Ack::Stopped)
}

fn send_audio(state: &mut InterpreterState, frame: AudioFrame) {
    if !state.fsm.can_send_audio() {
        return;
    }
    let Some(session) = state.session.as_ref() else { return };
    if session.asr_tx.try_send(AsrDriverCmd::Audio(frame)).is_err() {
        let dropped_since_last = session.status_dropped.take_dropped_count();
        session.bus.publish(EventPayload::Status {
            level: StatusLevel::Warn,
            state: None,
            message: "audio frame dropped: send buffer full".into(),
            dropped_since_last,
        });
    }
}

fn clear_history(state: &mut InterpreterState) -> Result<Ack, PipelineError> {
    let session = state.session.as_ref().ok_or(PipelineError::NotRunning)?;
    let fresh_combiner = SentenceCombiner::new(session.config.combiner, state.args.id_factory.make("sent"));
    let fresh_paragraph = session
        .config
        .paragraphs_enabled
        .then(|| ParagraphBuilder::new(session.config.paragraph, state.args.id_factory.make("para")));
    let fresh_summarizer = ProgressiveSummarizer::new(session.config.summarizer.clone());

    let session = state.session.as_mut().expect("checked above");
    session.store.clear();
    session.combiner = fresh_combiner;
    session.paragraph = fresh_paragraph;
    session.summarizer = fresh_summarizer;
    session.history_pending.clear();
    session.paragraph_pending.clear();
    session.summary_pending.clear();

    Ok(Ack::Cleared)
}

/// Reads back the finals the running session's `SegmentStore` holds (§6.1).
/// No persistence collaborator involved — `clear_history` resets the same
/// store this reads from, so the two compose into the round-trip §8
/// requires.
fn get_history(state: &InterpreterState, since_ts: Option<i64>) -> Result<Vec<TranscriptSegment>, PipelineError> {
    let session = state.session.as_ref().ok_or(PipelineError::NotRunning)?;
    Ok(match since_ts {
        Some(ts) => session.store.get_since(ts),
        None => session.store.snapshot(),
    })
}

fn generate_vocabulary(state: &mut InterpreterState) -> Result<Ack, PipelineError> {
    if !state.fsm.can_enqueue() {
        return Err(PipelineError::BadRequest("pipeline is not listening".into()));
    }
    let session = state.session.as_mut().ok_or(PipelineError::NotRunning)?;
    let source_text = session.store.snapshot().into_iter().map(|segment| segment.text).collect::<Vec<_>>().join(" ");

    let job_id = session.queue.enqueue(EnqueueRequest {
        kind: JobKind::User,
        priority: Priority::Low,
        linked_id: LinkedId::Adhoc("vocabulary".into()),
        source_text,
        source_lang: session.config.session.source_lang.clone(),
        target_lang: session.config.session.target_lang.clone(),
        profile: TranslateProfile::Quality,
        correlation_id: session.correlation_id.clone(),
    })?;
    session.adhoc_pending.insert(job_id.clone(), AdhocKind::Vocabulary);
    Ok(Ack::VocabularyQueued { job_id })
}

fn generate_final_report(state: &mut InterpreterState) -> Result<Ack, PipelineError> {
    if !state.fsm.can_enqueue() {
        return Err(PipelineError::BadRequest("pipeline is not listening".into()));
    }
    let session = state.session.as_mut().ok_or(PipelineError::NotRunning)?;
    let source_text = session.store.snapshot().into_iter().map(|segment| segment.text).collect::<Vec<_>>().join(" ");

    let job_id = session.queue.enqueue(EnqueueRequest {
        kind: JobKind::User,
        priority: Priority::Low,
        linked_id: LinkedId::Adhoc("final_report".into()),
        source_text,
        source_lang: session.config.session.source_lang.clone(),
        target_lang: session.config.session.target_lang.clone(),
        profile: TranslateProfile::Report,
        correlation_id: session.correlation_id.clone(),
    })?;
    session.adhoc_pending.insert(job_id.clone(), AdhocKind::FinalReport);
    Ok(Ack::FinalReportQueued { job_id })
}

fn handle_asr_fatal(state: &mut InterpreterState, message: String) {
    if let Some(session) = state.session.as_ref() {
        session.bus.publish(EventPayload::Error { kind: ErrorKind::Internal, message: message.clone(), recoverable: false });
    }
    let transition = if state.fsm.state() == PipelineState::Starting { Transition::AsrFatal } else { Transition::Fatal };
    let _ = state.fsm.apply(transition);
    tracing::error!(%message, "asr_fatal");
}

fn apply_asr_event(session: &mut ActiveSession, event: AsrEvent) {
    match event {
        AsrEvent::Segment(segment) if segment.is_final => on_final_segment(session, segment),
        AsrEvent::Segment(segment) => on_interim_segment(session, segment),
        AsrEvent::Status(_) => {}
    }
}

fn on_interim_segment(session: &mut ActiveSession, segment: TranscriptSegment) {
    let now = session.clock.now_ms();
    let outcome = session.interim_coalescer.update(segment.id.clone(), segment, now);
    if let CoalesceOutcome::Emit(segment) = outcome {
        session.bus.publish(EventPayload::AsrPartial { segment });
    }
}

fn on_final_segment(session: &mut ActiveSession, segment: TranscriptSegment) {
    session.interim_coalescer.finalize(segment.id.clone(), segment.clone());
    session.bus.publish(EventPayload::AsrFinal { segment: segment.clone() });

    let outcome = session.store.append_final(segment.clone());
    if outcome.resync {
        let dropped_since_last = session.status_dropped.take_dropped_count();
        session.bus.publish(EventPayload::Status {
            level: StatusLevel::Warn,
            state: None,
            message: "out-of-order final segment, resynced".into(),
            dropped_since_last,
        });
    }

    enqueue_translation(
        session,
        JobKind::Realtime,
        Priority::High,
        LinkedId::Segment(segment.id.clone()),
        segment.text.clone(),
        TranslateProfile::Realtime,
    );

    let now = session.clock.now_ms();
    if let Some(sentence) = session.combiner.append(&segment, now) {
        on_combined_sentence(session, sentence);
    }

    for trigger in session.summarizer.on_final_text(&segment.text) {
        enqueue_summary(session, trigger);
    }
}

fn on_combined_sentence(session: &mut ActiveSession, sentence: CombinedSentence) {
    session.bus.publish(EventPayload::CombinedSentence { sentence: sentence.clone() });
    session.history_pending.insert(sentence.id.clone(), sentence.clone());

    match session.paragraph.as_mut() {
        Some(builder) => {
            if let Some(paragraph) = builder.append(&sentence) {
                on_paragraph_complete(session, paragraph);
            }
        }
        None => enqueue_translation(
            session,
            JobKind::History,
            Priority::Low,
            LinkedId::Sentence(sentence.id.clone()),
            sentence.source_text.clone(),
            TranslateProfile::Quality,
        ),
    }
}

/// Publishes the paragraph with its raw text, then hands cleanup off to a
/// background task rather than enqueueing the history translation job
/// inline — §4.4's "optional cleanup (filler removal) runs asynchronously
/// and back-patches `clean_text` before enqueueing a history translation
/// job".
fn on_paragraph_complete(session: &mut ActiveSession, paragraph: Paragraph) {
    session.bus.publish(EventPayload::ParagraphComplete { paragraph: paragraph.clone() });
    let paragraph_id = paragraph.id.clone();
    let raw_text = paragraph.raw_text.clone();
    session.paragraph_pending.insert(paragraph_id.clone(), paragraph);

    let actor = session.actor.clone();
    tokio::spawn(async move {
        let clean_text = transcript::clean_paragraph_text(&raw_text);
        let _ = actor.cast(InterpreterMsg::ParagraphCleaned { paragraph_id, clean_text });
    });
}

/// Back-patches `clean_text` once the async cleanup pass finishes and
/// enqueues the history translation job that was waiting on it. A
/// paragraph can be gone from `paragraph_pending` by the time this runs
/// (e.g. `clear_history` during cleanup); silently drop it then.
fn on_paragraph_cleaned(session: &mut ActiveSession, paragraph_id: ParagraphId, clean_text: String) {
    let Some(paragraph) = session.paragraph_pending.get_mut(&paragraph_id) else { return };
    paragraph.clean_text = Some(clean_text.clone());
    paragraph.status = ParagraphStatus::Completed;

    enqueue_translation(
        session,
        JobKind::History,
        Priority::Low,
        LinkedId::Paragraph(paragraph_id),
        clean_text,
        TranslateProfile::Quality,
    );
}

fn enqueue_translation(
    session: &mut ActiveSession,
    kind: JobKind,
    priority: Priority,
    linked_id: LinkedId,
    source_text: String,
    profile: TranslateProfile,
) {
    let request = EnqueueRequest {
        kind,
        priority,
        linked_id,
        source_text,
        source_lang: session.config.session.source_lang.clone(),
        target_lang: session.config.session.target_lang.clone(),
        profile,
        correlation_id: session.correlation_id.clone(),
    };
    if let Err(err) = session.queue.enqueue(request) {
        tracing::warn!(%err, "translation_enqueue_failed");
        let dropped_since_last = session.status_dropped.take_dropped_count();
        session.bus.publish(EventPayload::Status {
            level: StatusLevel::Warn,
            state: None,
            message: format!("translation enqueue failed: {err}"),
            dropped_since_last,
        });
    }
}

fn enqueue_summary(session: &mut ActiveSession, trigger: SummaryTrigger) {
    let start_ts = session.clock.now_ms();
    let request = EnqueueRequest {
        kind: JobKind::Summary,
        priority: Priority::Low,
        linked_id: LinkedId::Adhoc(format!("summary-{}", trigger.threshold_words)),
        source_text: trigger.source_text.clone(),
        source_lang: session.config.session.source_lang.clone(),
        target_lang: session.config.session.target_lang.clone(),
        profile: TranslateProfile::Quality,
        correlation_id: session.correlation_id.clone(),
    };
    match session.queue.enqueue(request) {
        Ok(job_id) => {
            session.summary_pending.insert(job_id, (trigger, start_ts));
        }
        Err(err) => tracing::warn!(%err, "summary_enqueue_failed"),
    }
}

fn on_tick(state: &mut InterpreterState) {
    let Some(now) = state.session.as_ref().map(|session| session.clock.now_ms()) else { return };

    let sentence = state.session.as_mut().and_then(|session| session.combiner.check_timeout(now));
    if let Some(sentence) = sentence {
        if let Some(session) = state.session.as_mut() {
            on_combined_sentence(session, sentence);
        }
    }

    if let Some(session) = state.session.as_mut() {
        let window = session.config.internal_error_window_ms;
        while session.internal_error_times.front().is_some_and(|ts| now - *ts > window) {
            session.internal_error_times.pop_front();
        }
    }
}

/// Reacts to what `translate-queue` already published to the same bus
/// (§9's "queue drives futures to completion and publishes results on the
/// bus" — this actor never calls into the queue's dispatch path directly,
/// it observes the same events a UI subscriber would).
fn on_bus_event(state: &mut InterpreterState, event: Event) {
    let EventPayload::TranslationFinal { job_id, sentence_id, paragraph_id, result, .. } = event.payload else {
        return;
    };
    let is_internal_error = result.error == Some(ErrorKind::Internal);

    let Some(session) = state.session.as_mut() else { return };
    dispatch_translation_final(session, job_id, sentence_id, paragraph_id, result);

    if is_internal_error {
        let now = session.clock.now_ms();
        session.internal_error_times.push_back(now);
        let window = session.config.internal_error_window_ms;
        while session.internal_error_times.front().is_some_and(|ts| now - *ts > window) {
            session.internal_error_times.pop_front();
        }
        if session.internal_error_times.len() as u32 > session.config.internal_error_threshold {
            session.bus.publish(EventPayload::Error {
                kind: ErrorKind::Internal,
                message: "repeated internal errors exceeded threshold in window".into(),
                recoverable: false,
            });
            let _ = state.fsm.apply(Transition::Fatal);
        }
    }
}

fn dispatch_translation_final(
    session: &mut ActiveSession,
    job_id: JobId,
    sentence_id: Option<SentenceId>,
    paragraph_id: Option<ParagraphId>,
    result: pipeline_types::TranslationResult,
) {
    if let Some((trigger, start_ts)) = session.summary_pending.remove(&job_id) {
        let summary = Summary {
            id: job_id,
            threshold_words: trigger.threshold_words,
            source_text: trigger.source_text,
            target_text: result.target_text.unwrap_or_default(),
            word_count: trigger.word_count,
            start_ts,
            end_ts: result.complete_ts,
        };
        session.persistence.on_summary(&summary);
        session.bus.publish(EventPayload::ProgressiveSummary { summary });
        return;
    }

    if let Some(kind) = session.adhoc_pending.remove(&job_id) {
        match kind {
            AdhocKind::Vocabulary => {
                let terms = result
                    .target_text
                    .unwrap_or_default()
                    .split(|c: char| c == ',' || c == '\n')
                    .map(|term| term.trim().to_string())
                    .filter(|term| !term.is_empty())
                    .collect();
                session.bus.publish(EventPayload::Vocabulary { job_id, terms });
            }
            AdhocKind::FinalReport => {
                let markdown = result.target_text.unwrap_or_default();
                session.persistence.on_final_report(&markdown);
                session.bus.publish(EventPayload::FinalReport { job_id, markdown });
            }
        }
        return;
    }

    if let Some(paragraph_id) = paragraph_id {
        if let Some(paragraph) = session.paragraph_pending.remove(&paragraph_id) {
            let sentences =
                paragraph.sentence_ids.iter().filter_map(|id| session.history_pending.remove(id)).collect();
            session.persistence.on_history_block(&HistoryBlock { sentences, translations: vec![result] });
        }
        return;
    }

    if let Some(sentence_id) = sentence_id {
        if let Some(sentence) = session.history_pending.remove(&sentence_id) {
            session.persistence.on_history_block(&HistoryBlock { sentences: vec![sentence], translations: vec![result] });
        }
    }
}
