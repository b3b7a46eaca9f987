// safewatch-wire: transport layer for the SafeWatch monitoring backend.
//
// Owns the duplex event channel (WebSocket with auto-reconnect) and the
// small REST surface used to fetch the baseline snapshot on connect.
// Everything above this crate works with parsed envelopes, never raw
// frames.

pub mod channel;
pub mod commands;
pub mod error;
pub mod events;
pub mod rest;

pub use channel::{ChannelHandle, ChannelState, ReconnectConfig};
pub use commands::CommandFrame;
pub use error::Error;
pub use events::WireEvent;
pub use rest::RestClient;
