// Feed domain models - connection lifecycle and the signals a feed emits
use serde::Serialize;
use serde_json::Value;

/// Lifecycle of a feed's transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Signals delivered to the owner of a connection, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    StateChanged(ConnectionState),
    /// Inbound JSON, passed on without validation
    Message(Value),
}
