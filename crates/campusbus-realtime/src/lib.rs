//! Realtime channel client for the campus bus tracker.
//!
//! Speaks the Pusher protocol (as served by Laravel WebSockets / Reverb):
//! opens one socket, exchanges the connection's socket id for a private
//! channel signature through the backend's broadcast-auth endpoint,
//! subscribes, and hands matching event payloads to a caller-supplied
//! handler. Connection progress is published on a status channel.

pub mod authorizer;
pub mod location;
pub mod realtime;

pub use authorizer::{ChannelAuthorizer, HttpAuthorizer};
pub use location::{BusInfo, BusUser, Coordinates, EntityId, LocationPayload};
pub use realtime::{
    ChannelClientConfig, ConnectionHandle, ConnectionStatus, PusherMessage, RealtimeClient,
    ReconnectPolicy,
};
