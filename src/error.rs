use thiserror::Error;

/// Shared result type for the realtime client
pub type Result<T> = std::result::Result<T, RealtimeError>;

/// Errors surfaced by the realtime connection layer
///
/// None of these are fatal to the host process. Inside the connection manager
/// they degrade to a state transition plus a notification.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// The configured page origin cannot be turned into a socket endpoint
    #[error("invalid origin: {0}")]
    InvalidOrigin(String),

    /// The transport refused an operation (not open, closed underneath us)
    #[error("transport: {0}")]
    Transport(String),

    /// An outbound message could not be encoded as a wire frame
    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),

    /// A wire frame could not be turned back into an outbound message
    #[error("decode: {0}")]
    Decode(String),

    /// The client driver has shut down
    #[error("realtime client stopped")]
    ClientStopped,
}
