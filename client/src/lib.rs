//! Battle sessions over a Pokemon Showdown connection.
//!
//! The pieces, from the socket up:
//!
//! - [`Transport`]: one shared connection ([`WsTransport`] for the real
//!   server, [`LocalTransport`] for in-process use).
//! - [`MessageRouter`]: the single reader of that connection, fanning
//!   messages out to per-room [`Inbox`]es and a lobby inbox.
//! - [`BattleStream`]: parses a room's messages and yields events in batches
//!   that end at decision points.
//! - [`BattleSession`]: folds each batch into a [`BattleState`] and sends
//!   actions back.
//! - [`Coordinator`]: runs many sessions at once with per-counterparty caps,
//!   a bounded decision pool and per-session budgets.
//!
//! The library logs through `tracing` and never installs a subscriber.

mod connection;
mod coordinator;
mod logger;
mod router;
mod session;
mod stream;
mod tracker;
mod transport;

pub mod config;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use config::{CoordinatorConfig, SessionLimits};
pub use connection::{SHOWDOWN_URL, WsTransport};
pub use coordinator::{Coordinator, CoordinatorError, SharedTracker};
pub use logger::{EventLogger, JsonLinesLogger};
pub use router::MessageRouter;
pub use session::{BattleSession, SessionError};
pub use stream::{BattleStream, StreamMode};
pub use tracker::{BattleResult, BattleStatus, DecisionMaker, SessionTracker};
pub use transport::{Inbox, LocalTransport, MessageSource, RemoteEnd, Transport};

pub use volley_battle::{BattleState, Reducer};
pub use volley_protocol::{BattleAction, BattleEvent, ClientCommand, ClientMessage, EventKind};

/// Lock a std mutex, carrying on with the data if a holder panicked
pub(crate) fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
