mod runtime;
mod translator;

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use asr_client::test_util::ScriptedAdapter;
use asr_interface::AsrEvent;
use clap::Parser;
use interpreter_core::{
    actors::{InterpreterActor, InterpreterArgs, InterpreterMsg},
    PipelineConfig,
};
use pipeline_ids::{SequentialIdGenFactory, SystemClock};
use pipeline_types::SegmentId;
use ractor::{Actor, CallResult};
use runtime::StderrPersistenceSink;
use translator::EchoTranslator;

/// Drives `interpreter-core` against a scripted ASR feed and a pass-through
/// translator, printing the resulting event stream as one JSON object per
/// line on stdout. The "thin presentation layer" demo from §6 — there's no
/// real audio capture or model call anywhere in this binary.
#[derive(Parser)]
#[command(name = "interpret-demo", about = "Replay a transcript through interpreter-core and print its events")]
struct Cli {
    /// Path to a file of one utterance per line. Reads stdin when omitted.
    #[arg(long)]
    input: Option<std::path::PathBuf>,

    #[arg(long, default_value = "en")]
    source_lang: String,

    #[arg(long, default_value = "ja")]
    target_lang: String,

    /// Disable the paragraph builder (C5) so combined sentences translate
    /// individually instead of waiting for a paragraph to close.
    #[arg(long)]
    no_paragraphs: bool,
}

fn read_lines(cli: &Cli) -> Vec<String> {
    let text = match &cli.input {
        Some(path) => std::fs::read_to_string(path).unwrap_or_else(|err| {
            eprintln!("error: reading {}: {err}", path.display());
            std::process::exit(1);
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
            buf
        }
    };
    text.lines().map(str::trim).filter(|line| !line.is_empty()).map(str::to_string).collect()
}

fn scripted_events(lines: &[String]) -> Vec<AsrEvent> {
    let mut events = Vec::with_capacity(lines.len());
    let mut ts = 0i64;
    for (index, line) in lines.iter().enumerate() {
        let start_ts = ts;
        let end_ts = start_ts + 800;
        ts = end_ts;
        events.push(AsrEvent::Segment(pipeline_types::TranscriptSegment {
            id: SegmentId::from(format!("demo-{index}")),
            text: line.clone(),
            is_final: true,
            confidence: 1.0,
            start_ts,
            end_ts,
            language: "en".into(),
        }));
    }
    events
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let lines = read_lines(&cli);
    if lines.is_empty() {
        eprintln!("no input lines; nothing to replay");
        return;
    }
    let expected_finals = lines.len();
    let events = scripted_events(&lines);

    let mut config = PipelineConfig::new(cli.source_lang.clone(), cli.target_lang.clone());
    config.paragraphs_enabled = !cli.no_paragraphs;

    let args = InterpreterArgs {
        config_template: config,
        adapter_factory: Arc::new(move || {
            Box::new(ScriptedAdapter::new(events.clone())) as Box<dyn asr_client::RealtimeAsrAdapter>
        }),
        llm_adapter: Arc::new(EchoTranslator),
        clock: Arc::new(SystemClock),
        id_factory: Arc::new(SequentialIdGenFactory),
        persistence: Arc::new(StderrPersistenceSink),
    };

    let (actor, _handle) =
        Actor::spawn(Some(InterpreterActor::name()), InterpreterActor, args).await.expect("actor spawns");

    let subscriber = match ractor::call!(actor, InterpreterMsg::Subscribe).expect("subscribe delivered") {
        Some(sub) => sub,
        None => {
            eprintln!("error: no active session to subscribe to");
            std::process::exit(1);
        }
    };

    let start = actor
        .call(
            |reply| InterpreterMsg::StartListening {
                source_lang: cli.source_lang.clone(),
                target_lang: cli.target_lang.clone(),
                correlation_id: None,
                reply,
            },
            Some(Duration::from_secs(2)),
        )
        .await
        .expect("start_listening delivered");
    if let CallResult::Success(Err(err)) = start {
        eprintln!("error: start_listening failed: {} ({})", err, err.code());
        std::process::exit(1);
    }

    let mut asr_finals = 0usize;
    let drain_deadline = Duration::from_secs(10);
    let _ = tokio::time::timeout(drain_deadline, async {
        loop {
            let event = subscriber.recv().await;
            println!("{}", serde_json::to_string(&event).unwrap_or_default());
            if let pipeline_types::EventPayload::AsrFinal { .. } = &event.payload {
                asr_finals += 1;
                if asr_finals >= expected_finals {
                    // Give the queue a moment to publish the realtime
                    // translation for the last final before stopping.
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    return;
                }
            }
        }
    })
    .await;

    let _ = ractor::call!(actor, InterpreterMsg::StopListening);

    // stop_session's own grace period already drains the queue; this just
    // gives the final flushed events a chance to reach stdout before exit.
    let drain_tail = tokio::time::timeout(Duration::from_secs(6), async {
        loop {
            let event = subscriber.recv().await;
            let is_stop_status = matches!(
                &event.payload,
                pipeline_types::EventPayload::Status { message, .. } if message == "session stopped"
            );
            println!("{}", serde_json::to_string(&event).unwrap_or_default());
            if is_stop_status {
                return;
            }
        }
    });
    let _ = drain_tail.await;
}
