//! The shared socket: connection handle, background loop, and transports.
//!
//! A [`Connection`] owns one background task that writes every frame and
//! routes every inbound message, so channel state is only ever advanced from
//! one place. Heartbeats, reconnect with exponential backoff, and rejoining
//! channels after a reconnect all happen inside that task.

mod handle;
mod handler;
mod manager;
#[cfg(test)]
mod memory;
mod router;
mod socket;
mod transport;
mod types;

pub use handle::Connection;
pub(crate) use handle::SocketCommand;
pub use manager::ConnectionManager;
#[cfg(test)]
pub(crate) use memory::{MemoryConnector, MemoryPeer};
pub use transport::{Connector, FrameSink, FrameStream, Transport, WebSocketConnector};
pub use types::{ConnectionState, ConnectionStats, RealtimeConfig};
