//! Whole-battle snapshot

use std::sync::Arc;

use volley_protocol::{GameType, Player};

use super::field::FieldState;
use super::team::TeamState;
use crate::ReduceError;

/// A move the active Pokemon may select
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOption {
    /// 1-based slot for `/choose move N`
    pub slot: usize,
    pub id: String,
    pub name: String,
}

/// A Pokemon that may be switched in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOption {
    /// 1-based slot for `/choose switch N`
    pub slot: usize,
    pub species: String,
}

/// Actions currently open to us, as last reported by the server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegalActions {
    pub moves: Vec<MoveOption>,
    pub switches: Vec<SwitchOption>,
    pub can_mega: bool,
    /// Tera type on offer, if terastallization is available
    pub can_tera: Option<String>,
    pub can_dynamax: bool,
    pub force_switch: bool,
    pub team_preview: bool,
    /// Last request told us to wait for the opponent
    pub waiting: bool,
    pub trapped: bool,
}

impl LegalActions {
    /// Whether there is anything to choose
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.switches.is_empty() && !self.team_preview
    }
}

/// Battle metadata from the init messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleFormat {
    /// Generation (1-9)
    pub generation: u8,
    /// Format/tier name
    pub tier: String,
    pub game_type: Option<GameType>,
}

impl Default for BattleFormat {
    fn default() -> Self {
        Self {
            generation: 9,
            tier: String::new(),
            game_type: None,
        }
    }
}

/// An immutable battle snapshot.
///
/// Every component sits behind an `Arc`; cloning a state is cheap and a
/// reduction only copies the parts it changes.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleState {
    pub p1: Arc<TeamState>,
    pub p2: Arc<TeamState>,
    pub field: Arc<FieldState>,
    pub legal: Arc<LegalActions>,
    pub format: Arc<BattleFormat>,

    /// Which side we play, learned from the first request
    pub our_side: Option<Player>,

    /// Request id to echo back with our choice
    pub rqid: Option<u64>,

    // === Outcome ===
    pub ended: bool,
    /// Winner's username (if ended)
    pub winner: Option<String>,
    pub tie: bool,
}

impl BattleState {
    pub fn new() -> Self {
        Self {
            p1: Arc::new(TeamState::new(Player::P1)),
            p2: Arc::new(TeamState::new(Player::P2)),
            field: Arc::new(FieldState::new()),
            legal: Arc::new(LegalActions::default()),
            format: Arc::new(BattleFormat::default()),
            our_side: None,
            rqid: None,
            ended: false,
            winner: None,
            tie: false,
        }
    }

    /// Get a side by player
    pub fn team(&self, player: Player) -> Option<&TeamState> {
        match player {
            Player::P1 => Some(&self.p1),
            Player::P2 => Some(&self.p2),
            _ => None,
        }
    }

    /// Get a side for modification, copying it first if it is shared
    pub fn team_mut(&mut self, player: Player) -> Result<&mut TeamState, ReduceError> {
        match player {
            Player::P1 => Ok(Arc::make_mut(&mut self.p1)),
            Player::P2 => Ok(Arc::make_mut(&mut self.p2)),
            other => Err(ReduceError::SideNotFound(other.to_string())),
        }
    }

    /// Both sides, for effects that touch every Pokemon
    pub fn teams_mut(&mut self) -> [&mut TeamState; 2] {
        [Arc::make_mut(&mut self.p1), Arc::make_mut(&mut self.p2)]
    }

    /// Our side (based on the side learned from requests)
    pub fn me(&self) -> Option<&TeamState> {
        self.our_side.and_then(|p| self.team(p))
    }

    /// Opponent's side
    pub fn opponent(&self) -> Option<&TeamState> {
        match self.our_side? {
            Player::P1 => Some(&self.p2),
            Player::P2 => Some(&self.p1),
            _ => None,
        }
    }

    pub fn field_mut(&mut self) -> &mut FieldState {
        Arc::make_mut(&mut self.field)
    }

    pub fn format_mut(&mut self) -> &mut BattleFormat {
        Arc::make_mut(&mut self.format)
    }

    /// Current turn number
    pub fn turn(&self) -> u32 {
        self.field.turn
    }

    /// The battle is over once the server says so or a side with a fully
    /// revealed roster has no Pokemon left standing
    pub fn is_over(&self) -> bool {
        self.ended || self.p1.all_fainted() || self.p2.all_fainted()
    }
}

impl Default for BattleState {
    fn default() -> Self {
        Self::new()
    }
}
