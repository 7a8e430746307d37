//! Read-only move data.
//!
//! The reducer needs base PP to track how many uses a newly revealed move
//! has left. The data is injected as a [`Dex`] rather than looked up from a
//! global table.

use std::collections::HashMap;

use serde::Deserialize;
use volley_protocol::to_id;

/// Source of static move data
pub trait Dex: Send + Sync {
    /// Base PP of a move, by name or id
    fn base_pp(&self, move_name: &str) -> Option<u32>;

    /// PP with all PP Ups applied (base * 8 / 5)
    fn max_pp(&self, move_name: &str) -> Option<u32> {
        self.base_pp(move_name).map(|pp| pp * 8 / 5)
    }
}

/// One move entry as it appears in a Showdown-style `moves.json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MoveEntry {
    #[serde(default)]
    pub name: String,
    pub pp: u32,
}

/// A move table keyed by move id
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct MoveTable {
    moves: HashMap<String, MoveEntry>,
}

impl MoveTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from JSON of the form `{"thunderbolt": {"name": "Thunderbolt", "pp": 15}, ...}`
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let table: MoveTable = serde_json::from_str(json)?;
        Ok(Self {
            moves: table
                .moves
                .into_iter()
                .map(|(key, entry)| (to_id(&key), entry))
                .collect(),
        })
    }

    /// Add or replace a move
    pub fn insert(&mut self, name: &str, pp: u32) {
        self.moves.insert(
            to_id(name),
            MoveEntry {
                name: name.to_string(),
                pp,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl Dex for MoveTable {
    fn base_pp(&self, move_name: &str) -> Option<u32> {
        self.moves.get(&to_id(move_name)).map(|entry| entry.pp)
    }
}
