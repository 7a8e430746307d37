//! Domain types for battle state tracking

mod conditions;
mod field;
mod pokemon;
mod state;
mod stats;
mod status;
mod team;

pub use conditions::{FieldEffect, SideCondition, Terrain, Weather};
pub use field::{FieldState, TERRAIN_TURNS, WEATHER_TURNS};
pub use pokemon::{MoveState, PokemonIdentity, PokemonState};
pub use state::{BattleFormat, BattleState, LegalActions, MoveOption, SwitchOption};
pub use stats::{MAX_STAGE, MIN_STAGE, StatStages};
pub use status::{Status, Volatile};
pub use team::TeamState;
