//! Pusher-protocol channel client built on `tokio-tungstenite`.
//!
//! Handles the socket-id / channel-auth / subscribe handshake, the
//! keep-alive ping, teardown, and an optional reconnect with backoff.

mod backoff;
mod client;
mod connection;
mod handler;
mod types;


pub use client::{ConnectionHandle, RealtimeClient};
pub use types::{events, ChannelClientConfig, ConnectionStatus, PusherMessage, ReconnectPolicy};
