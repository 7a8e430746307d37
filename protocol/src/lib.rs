//! Event model and line parser for the Pokemon Showdown battle protocol.
//!
//! Inbound traffic is parsed one line at a time with [`parse_event`], which
//! never fails: anything it cannot make sense of comes back as
//! [`EventKind::Unknown`]. Outbound decisions are expressed as a
//! [`BattleAction`] and serialized through [`ClientMessage`].

use thiserror::Error;

pub mod client;
pub mod server;

pub use client::{BattleAction, ClientCommand, ClientMessage};
pub use server::{
    ActivePokemon, BattleEvent, BattleRequest, EventKind, GameType, HpStatus, MoveSlot, Player,
    PokemonDetails, PokemonIdent, ServerFrame, SideInfo, SidePokemon, Stat,
    parse_event, parse_server_frame, to_id,
};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}
