use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{error, info};

use super::dispatcher::Dispatcher;
use super::manager::ConnectionManager;
use crate::config::RealtimeConfig;
use crate::error::{RealtimeError, Result};
use crate::notify::Notifier;
use crate::protocol::OutboundMessage;
use crate::session::SessionSnapshot;
use crate::transcript::TranscriptSink;
use crate::transport::{Connector, EventReceiver};

enum Command {
    Connect,
    Disconnect,
    Send(OutboundMessage),
    JoinMeeting(String),
    LeaveMeeting,
    StartRecording(String),
    StopRecording(String),
    AudioFrame { meeting_id: String, pcm: Vec<u8> },
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// Handle to a running connection manager
///
/// Cheap to clone. Every command returns as soon as it is handed to the
/// driver task; outcomes show up in later snapshots, notifications and
/// transcripts.
#[derive(Clone)]
pub struct RealtimeClient {
    commands: mpsc::UnboundedSender<Command>,
    driver: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl RealtimeClient {
    /// Build the connection manager and spawn its driver task
    ///
    /// Must be called from within a tokio runtime. Nothing is connected until
    /// [`RealtimeClient::connect`] (or a send) is issued.
    pub fn init(
        config: &RealtimeConfig,
        connector: impl Connector + 'static,
        transcripts: impl TranscriptSink + 'static,
        notifier: impl Notifier + 'static,
    ) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(Box::new(transcripts), Box::new(notifier));
        let manager = ConnectionManager::new(config, Box::new(connector), dispatcher, event_tx)?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let driver = tokio::spawn(run_driver(manager, command_rx, event_rx));

        info!("Realtime client started for {}", config.origin);

        Ok(Self {
            commands: command_tx,
            driver: Arc::new(Mutex::new(Some(driver))),
        })
    }

    fn submit(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| RealtimeError::ClientStopped)
    }

    pub fn connect(&self) -> Result<()> {
        self.submit(Command::Connect)
    }

    pub fn disconnect(&self) -> Result<()> {
        self.submit(Command::Disconnect)
    }

    pub fn send_message(&self, message: OutboundMessage) -> Result<()> {
        self.submit(Command::Send(message))
    }

    pub fn join_meeting(&self, meeting_id: impl Into<String>) -> Result<()> {
        self.submit(Command::JoinMeeting(meeting_id.into()))
    }

    pub fn leave_meeting(&self) -> Result<()> {
        self.submit(Command::LeaveMeeting)
    }

    pub fn start_recording(&self, meeting_id: impl Into<String>) -> Result<()> {
        self.submit(Command::StartRecording(meeting_id.into()))
    }

    pub fn stop_recording(&self, meeting_id: impl Into<String>) -> Result<()> {
        self.submit(Command::StopRecording(meeting_id.into()))
    }

    /// Send raw PCM bytes; pacing is up to the caller
    pub fn send_audio_frame(&self, meeting_id: impl Into<String>, pcm: Vec<u8>) -> Result<()> {
        self.submit(Command::AudioFrame {
            meeting_id: meeting_id.into(),
            pcm,
        })
    }

    /// Current session state, as seen after every earlier command
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.submit(Command::Snapshot(tx))?;
        rx.await.map_err(|_| RealtimeError::ClientStopped)
    }

    /// Disconnect and stop the driver, waiting for it to finish
    pub async fn shutdown(&self) -> Result<()> {
        // Already stopped is fine
        let _ = self.submit(Command::Shutdown);

        let mut handle = self.driver.lock().await;
        if let Some(task) = handle.take() {
            if let Err(e) = task.await {
                error!("Realtime driver panicked: {}", e);
            }
        }

        info!("Realtime client stopped");
        Ok(())
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Transport events handled back to back before timers and commands get a turn
const EVENT_BATCH: usize = 32;

/// Feed commands, transport events and timers to the manager, one at a time
async fn run_driver(
    mut manager: ConnectionManager,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut events: EventReceiver,
) {
    let mut event_budget = EVENT_BATCH;

    loop {
        let deadline = manager.next_deadline();

        tokio::select! {
            // Transport reality first, then timers, then new commands
            biased;

            Some(event) = events.recv(), if event_budget > 0 => {
                event_budget -= 1;
                manager.handle_event(event, Instant::now());
            }

            _ = wait_for(deadline) => {
                event_budget = EVENT_BATCH;
                manager.on_timers(Instant::now());
            }

            command = commands.recv() => {
                event_budget = EVENT_BATCH;
                match command {
                    Some(Command::Shutdown) | None => {
                        manager.disconnect();
                        break;
                    }
                    Some(command) => apply(&mut manager, command),
                }
            }

            // Nothing else was waiting
            _ = std::future::ready(()), if event_budget == 0 => event_budget = EVENT_BATCH,
        }
    }
}

fn apply(manager: &mut ConnectionManager, command: Command) {
    let now = Instant::now();

    match command {
        Command::Connect => manager.connect(now),
        Command::Disconnect => manager.disconnect(),
        Command::Send(message) => manager.send_message(message, now),
        Command::JoinMeeting(meeting_id) => manager.join_meeting(meeting_id, now),
        Command::LeaveMeeting => manager.leave_meeting(now),
        Command::StartRecording(meeting_id) => manager.start_recording(meeting_id, now),
        Command::StopRecording(meeting_id) => manager.stop_recording(meeting_id, now),
        Command::AudioFrame { meeting_id, pcm } => manager.send_audio_frame(meeting_id, &pcm, now),
        Command::Snapshot(reply) => {
            let _ = reply.send(manager.snapshot());
        }
        Command::Shutdown => manager.disconnect(),
    }
}
