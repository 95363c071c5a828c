//! Connection session
//!
//! This module tracks:
//! - The client identity used in the socket endpoint
//! - The connection lifecycle state machine
//! - The joined meeting and reconnect bookkeeping

mod session;
mod snapshot;
mod state;

pub use session::{ClientId, Session};
pub use snapshot::SessionSnapshot;
pub use state::ConnectionState;
