use anyhow::{Context, Result};
use clap::Parser;
use meeting_realtime::{
    Config, FrameSource, RealtimeClient, TracingNotifier, TranscriptStore, WavFrameSource,
    WsConnector,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Time to wait for trailing transcripts after a file finishes streaming
const DRAIN_GRACE: Duration = Duration::from_secs(3);

#[derive(Debug, Parser)]
#[command(name = "meeting-realtime", version, about = "Realtime meeting transcription client")]
struct Args {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/meeting-realtime")]
    config: String,

    /// Origin of the meeting web app, e.g. https://meetings.example.com
    #[arg(long)]
    origin: Option<String>,

    /// Meeting to join (generated if omitted)
    #[arg(long)]
    meeting: Option<String>,

    /// 16-bit PCM WAV file to stream as the meeting audio
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Ask the server to record the meeting while connected
    #[arg(long)]
    record: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut cfg = Config::load(&args.config)?;
    if let Some(origin) = args.origin {
        cfg.realtime.origin = origin;
    }

    let meeting_id = args
        .meeting
        .unwrap_or_else(|| format!("meeting-{}", uuid::Uuid::new_v4()));

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Origin: {}", cfg.realtime.origin);
    info!("Meeting: {}", meeting_id);

    let (transcript_tx, mut transcript_rx) = mpsc::unbounded_channel();
    let client = RealtimeClient::init(&cfg.realtime, WsConnector, transcript_tx, TracingNotifier)
        .context("Failed to start realtime client")?;

    client.connect()?;
    client.join_meeting(meeting_id.as_str())?;
    if args.record {
        client.start_recording(meeting_id.as_str())?;
    }

    // Print transcripts as they arrive
    let store = TranscriptStore::new();
    let printer_store = store.clone();
    let printer = tokio::spawn(async move {
        while let Some(event) = transcript_rx.recv().await {
            match event.segment() {
                Some(segment) => {
                    let speaker = segment.speaker.as_deref().unwrap_or("unknown");
                    println!("[{:>7.1}s] {}: {}", segment.timestamp, speaker, segment.text);
                    printer_store.add(segment);
                }
                None => println!("{}", event.data),
            }
        }
    });

    match args.wav {
        Some(path) => {
            let frame_duration = Duration::from_millis(cfg.audio.frame_duration_ms);
            tokio::select! {
                result = stream_file(&client, &meeting_id, &path, frame_duration) => result?,
                _ = tokio::signal::ctrl_c() => info!("Interrupted"),
            }
        }
        None => {
            info!("Listening for transcripts, press Ctrl-C to stop");
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
        }
    }

    if args.record {
        client.stop_recording(meeting_id.as_str())?;
    }
    client.leave_meeting()?;

    let snapshot = client.snapshot().await?;
    if snapshot.is_connected() {
        info!("Still connected, {} messages queued", snapshot.queued_messages);
    } else {
        warn!(
            "Connection ended {} with {} messages never delivered",
            snapshot.state, snapshot.queued_messages
        );
    }

    client.shutdown().await?;
    printer.await.context("Transcript printer panicked")?;

    info!("Collected {} transcript segments", store.len());

    Ok(())
}

/// Stream a WAV file in real time, then wait briefly for late transcripts
async fn stream_file(
    client: &RealtimeClient,
    meeting_id: &str,
    path: &Path,
    frame_duration: Duration,
) -> Result<()> {
    let mut source = WavFrameSource::open(path, frame_duration)?;
    info!("Streaming {} ({:.1}s)", source.name(), source.duration_seconds);

    let mut frames = 0usize;
    while let Some(chunk) = source.next_frame().await? {
        client.send_audio_frame(meeting_id, chunk.pcm)?;
        frames += 1;
        tokio::time::sleep(chunk.duration).await;
    }

    info!("Sent {} audio frames", frames);
    tokio::time::sleep(DRAIN_GRACE).await;

    Ok(())
}
