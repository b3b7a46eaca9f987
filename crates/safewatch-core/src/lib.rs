// safewatch-core: incident alert lifecycle and real-time
// synchronization engine.
//
// Layering:
//   wire events → normalize → store → streams → adapters
//                              ↑
//   commands → engine (role gate, frame emit, optimistic transition)
//
// Adapters (TUI screens) only ever read snapshots/streams and emit
// `Command`s; nothing outside this crate mutates an alert field.

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod normalize;
pub mod store;
pub mod stream;

pub use command::{Command, RaiseAlertRequest};
pub use config::EngineConfig;
pub use engine::{ConnectionState, SyncEngine};
pub use error::CoreError;
pub use lifecycle::{Outcome, Transition, TransitionError};
pub use model::{
    Alert, AlertId, AlertKind, AlertStatus, Evidence, Location, Role, Severity, SystemHealth,
    SystemStatus, TouristPing,
};
pub use normalize::{normalize, Normalized};
pub use store::AlertStore;
pub use stream::{AlertFilter, AlertStream};
