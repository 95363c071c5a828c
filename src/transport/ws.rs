use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use super::{Connector, EventSender, Link, TransportEvent, TransportEventKind};
use crate::error::{RealtimeError, Result};
use crate::protocol::ABNORMAL_CLOSURE;

/// Close frame without a status code
const NO_STATUS_RECEIVED: u16 = 1005;

/// WebSocket connector over `tokio-tungstenite`
///
/// Each opened link runs its socket on a dedicated task. The task reports
/// open/message/error/close through the event channel and writes whatever the
/// link queues. Frames still queued when the socket goes away are reported
/// back as `Unsent` ahead of the `Closed`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&mut self, url: &Url, generation: u64, events: EventSender) -> Result<Box<dyn Link>> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RealtimeError::Transport(format!("no tokio runtime: {}", e)))?;

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let emitter = Emitter { generation, events };
        runtime.spawn(run_socket(url.to_string(), outgoing_rx, emitter));

        Ok(Box::new(WsLink { outgoing: outgoing_tx }))
    }
}

enum Outgoing {
    Text(String),
    Close { code: u16, reason: String },
}

struct WsLink {
    outgoing: mpsc::UnboundedSender<Outgoing>,
}

impl Link for WsLink {
    fn send(&mut self, frame: String) -> Result<()> {
        self.outgoing
            .send(Outgoing::Text(frame))
            .map_err(|_| RealtimeError::Transport("socket is not open".into()))
    }

    fn close(&mut self, code: u16, reason: &str) {
        let _ = self.outgoing.send(Outgoing::Close {
            code,
            reason: reason.to_string(),
        });
    }
}

struct Emitter {
    generation: u64,
    events: EventSender,
}

impl Emitter {
    fn emit(&self, kind: TransportEventKind) {
        let event = TransportEvent {
            generation: self.generation,
            kind,
        };
        if self.events.send(event).is_err() {
            debug!("Connection driver gone, dropping transport event");
        }
    }
}

/// How the socket task ended
enum Exit {
    /// Either side closed the socket
    Closed { code: u16, reason: String },
    /// The socket failed, possibly while writing `unwritten`
    Failed {
        error: String,
        unwritten: Option<String>,
    },
    /// The link was dropped without a close
    Dropped,
}

async fn run_socket(
    url: String,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    emitter: Emitter,
) {
    let exit = drive_socket(&url, &mut outgoing, &emitter).await;

    // Later sends fail at the link; anything already accepted goes back
    outgoing.close();
    let mut unsent = Vec::new();
    let (closed, error) = match exit {
        Exit::Closed { code, reason } => ((code, reason), None),
        Exit::Failed { error, unwritten } => {
            unsent.extend(unwritten);
            ((ABNORMAL_CLOSURE, String::new()), Some(error))
        }
        Exit::Dropped => return,
    };
    while let Ok(out) = outgoing.try_recv() {
        if let Outgoing::Text(frame) = out {
            unsent.push(frame);
        }
    }

    if !unsent.is_empty() {
        warn!("{} frames never reached {}", unsent.len(), url);
        emitter.emit(TransportEventKind::Unsent(unsent));
    }
    if let Some(error) = error {
        emitter.emit(TransportEventKind::Error(error));
    }
    let (code, reason) = closed;
    emitter.emit(TransportEventKind::Closed { code, reason });
}

async fn drive_socket(
    url: &str,
    outgoing: &mut mpsc::UnboundedReceiver<Outgoing>,
    emitter: &Emitter,
) -> Exit {
    let socket = match connect_async(url).await {
        Ok((socket, _response)) => socket,
        Err(e) => {
            warn!("WebSocket connect to {} failed: {}", url, e);
            return Exit::Failed {
                error: e.to_string(),
                unwritten: None,
            };
        }
    };

    info!("WebSocket open: {}", url);
    emitter.emit(TransportEventKind::Opened);

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            out = outgoing.recv() => match out {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text.clone().into())).await {
                        return Exit::Failed {
                            error: e.to_string(),
                            unwritten: Some(text),
                        };
                    }
                }
                Some(Outgoing::Close { code, reason }) => {
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.clone().into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        debug!("Close frame not delivered: {}", e);
                    }
                    return Exit::Closed { code, reason };
                }
                None => {
                    let _ = sink.close().await;
                    return Exit::Dropped;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    emitter.emit(TransportEventKind::Message(text.as_str().to_string()));
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.as_str().to_string()))
                        .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                    // Flushes the close reply tungstenite queued on read
                    if let Err(e) = sink.close().await {
                        debug!("Close reply not delivered: {}", e);
                    }
                    return Exit::Closed { code, reason };
                }
                Some(Ok(Message::Binary(bytes))) => {
                    debug!("Ignoring {} byte binary frame", bytes.len());
                }
                // Ping/pong frames are answered by tungstenite
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return Exit::Failed {
                        error: e.to_string(),
                        unwritten: None,
                    };
                }
                None => {
                    return Exit::Closed {
                        code: ABNORMAL_CLOSURE,
                        reason: String::new(),
                    };
                }
            },
        }
    }
}
