//! Battle state and the pure reducer that advances it.
//!
//! # Overview
//!
//! `volley-battle` sits between `volley-protocol` (wire format) and the
//! client:
//!
//! ```text
//! volley-protocol (events)
//!        │
//!        ▼
//! volley-battle (state + reducer) ← THIS CRATE
//!        │
//!        ▼
//! volley-client (sessions, routing, coordination)
//! ```
//!
//! # Main Types
//!
//! - [`BattleState`] - immutable snapshot of both teams, the field and the
//!   actions currently open to us
//! - [`TeamState`], [`PokemonState`], [`FieldState`] - its components
//! - [`Reducer`] - `apply(state, event) -> state`
//! - [`Dex`] / [`MoveTable`] - read-only move data injected into the reducer
//!
//! # Example Usage
//!
//! ```
//! use volley_battle::{BattleState, Reducer};
//! use volley_protocol::parse_event;
//!
//! let reducer = Reducer::default();
//! let state = BattleState::new();
//! let next = reducer
//!     .apply(&state, &parse_event("|switch|p1a: Pikachu|Pikachu, L50|100/100"))
//!     .unwrap();
//!
//! assert_eq!(next.p1.active().unwrap().name(), "Pikachu");
//! assert!(state.p1.active().is_none());
//! ```

pub mod dex;
pub mod reducer;
pub mod types;

use thiserror::Error;

pub use dex::{Dex, MoveEntry, MoveTable};
pub use reducer::{Reducer, infer_moves, infer_switches};
pub use types::{
    BattleFormat, BattleState, FieldEffect, FieldState, LegalActions, MoveOption, MoveState,
    PokemonIdentity, PokemonState, SideCondition, StatStages, Status, SwitchOption, TeamState,
    Terrain, Volatile, Weather,
};

// Re-export commonly used protocol types
pub use volley_protocol::{GameType, Player, Stat};

/// An event that cannot be applied to the current state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReduceError {
    #[error("side not found: {0}")]
    SideNotFound(String),
    #[error("pokemon not found: {side}: {name}")]
    PokemonNotFound { side: String, name: String },
}
