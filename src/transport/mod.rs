//! Transport seam between the connection manager and the socket
//!
//! The manager never touches a socket directly. It asks a [`Connector`] to
//! open one and receives everything that happens to it as [`TransportEvent`]s
//! on a single channel, tagged with the generation of the connection that
//! produced them.

pub mod ws;

use tokio::sync::mpsc;
use url::Url;

use crate::error::{RealtimeError, Result};
use crate::session::ClientId;

pub use ws::WsConnector;

/// Something that happened to an open (or opening) transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    /// Handshake completed
    Opened,
    /// A text frame arrived
    Message(String),
    /// The transport reported a failure; a `Closed` follows
    Error(String),
    /// Frames the link accepted but never wrote; a `Closed` follows
    Unsent(Vec<String>),
    /// The transport is gone
    Closed { code: u16, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    /// Generation passed to [`Connector::open`]
    pub generation: u64,
    pub kind: TransportEventKind,
}

pub type EventSender = mpsc::UnboundedSender<TransportEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<TransportEvent>;

/// Opens transports
pub trait Connector: Send {
    /// Start opening a transport to `url`
    ///
    /// Must return without waiting for the handshake. The outcome is reported
    /// through `events`.
    fn open(&mut self, url: &Url, generation: u64, events: EventSender) -> Result<Box<dyn Link>>;
}

/// Write half of an open transport
pub trait Link: Send {
    /// Queue a text frame for transmission
    fn send(&mut self, frame: String) -> Result<()>;

    /// Close with the given code and reason
    fn close(&mut self, code: u16, reason: &str);
}

/// Socket scheme matching a page origin
pub fn socket_scheme(origin: &Url) -> Result<&'static str> {
    match origin.scheme() {
        "https" | "wss" => Ok("wss"),
        "http" | "ws" => Ok("ws"),
        other => Err(RealtimeError::InvalidOrigin(format!(
            "unsupported scheme '{}' in {}",
            other, origin
        ))),
    }
}

/// Realtime endpoint for a client: `{ws|wss}://{host}/ws/{client_id}`
pub fn endpoint_url(origin: &Url, client_id: &ClientId) -> Result<Url> {
    let scheme = socket_scheme(origin)?;
    let host = origin
        .host_str()
        .ok_or_else(|| RealtimeError::InvalidOrigin(format!("no host in {}", origin)))?;

    let authority = match origin.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    Url::parse(&format!("{}://{}/ws/{}", scheme, authority, client_id))
        .map_err(|e| RealtimeError::InvalidOrigin(e.to_string()))
}
