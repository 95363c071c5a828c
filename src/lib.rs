pub mod audio;
pub mod config;
pub mod connection;
pub mod error;
pub mod notify;
pub mod protocol;
pub mod session;
pub mod transcript;
pub mod transport;

pub use audio::{AudioChunk, FrameSource, WavFrameSource};
pub use config::{Config, RealtimeConfig};
pub use connection::{ConnectionManager, RealtimeClient};
pub use error::{RealtimeError, Result};
pub use notify::{NotificationKind, Notifier, TracingNotifier};
pub use protocol::{InboundEvent, OutboundMessage, TranscriptEvent};
pub use session::{ClientId, ConnectionState, SessionSnapshot};
pub use transcript::{TranscriptSegment, TranscriptSink, TranscriptStore};
pub use transport::{Connector, Link, TransportEvent, TransportEventKind, WsConnector};
