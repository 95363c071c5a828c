//! Realtime connection manager
//!
//! This module provides:
//! - `ConnectionManager`: the connection state machine (session lifecycle,
//!   outbound queue, reconnect backoff, heartbeat, inbound dispatch)
//! - `RealtimeClient`: the handle that owns a manager on its own task and
//!   feeds it commands, transport events and timer ticks in order

mod client;
mod dispatcher;
mod heartbeat;
mod manager;
mod queue;
mod reconnect;

pub use client::RealtimeClient;
pub use dispatcher::Dispatcher;
pub use heartbeat::Heartbeat;
pub use manager::ConnectionManager;
pub use queue::OutboundQueue;
pub use reconnect::ReconnectPolicy;
