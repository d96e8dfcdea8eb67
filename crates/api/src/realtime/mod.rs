//! Live connections: the registry/broadcaster and the WebSocket endpoint.

pub mod registry;
pub mod socket;

pub use registry::{BroadcastReport, ConnectionHandle, ConnectionRegistry, FailedDelivery};
pub use socket::ws_handler;
