//! Wire protocol spoken over the realtime socket
//!
//! Every frame is a single JSON object with a `type` discriminator.

pub mod inbound;
pub mod outbound;

pub use inbound::{InboundEvent, InboundFrame, StatusEvent, StatusKind, TranscriptEvent};
pub use outbound::{OutboundFrame, OutboundMessage};

/// Close code used for deliberate, client-initiated closes
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code reported when the socket went away without a close frame
pub const ABNORMAL_CLOSURE: u16 = 1006;
