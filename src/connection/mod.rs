// Persistent stream connection with fixed-delay reconnect

mod manager;
mod transport;

pub use manager::{ConnectionEvent, ConnectionManager, StreamConfig};
pub use transport::{FrameStream, StreamConnector, WsConnector};

#[cfg(test)]
pub(crate) mod testing;
