//! What is known about a single Pokemon.

use std::collections::HashSet;

use volley_protocol::{HpStatus, PokemonDetails, to_id};

use super::stats::StatStages;
use super::status::{Status, Volatile};

/// Who a Pokemon is. Only forme changes and detail reveals touch this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PokemonIdentity {
    /// Includes the forme, e.g. "Pikachu-Alola"
    pub species: String,
    /// Only set when it differs from the species
    pub nickname: Option<String>,
    pub level: u8,
    pub gender: Option<char>,
    pub shiny: bool,
}

impl PokemonIdentity {
    pub fn new(species: impl Into<String>, level: u8) -> Self {
        Self {
            species: species.into(),
            nickname: None,
            level,
            gender: None,
            shiny: false,
        }
    }

    /// `name` is the ident's name part
    pub fn from_protocol(details: &PokemonDetails, name: &str) -> Self {
        Self {
            species: details.species.clone(),
            nickname: (!name.is_empty() && name != details.species).then(|| name.to_string()),
            level: details.level_or_default(),
            gender: details.gender,
            shiny: details.shiny,
        }
    }

    pub fn name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.species)
    }

    /// Change species (mega evolution, forme change). The Pokemon keeps
    /// answering to the name it had before.
    pub fn set_species(&mut self, species: &str) {
        if self.species == species {
            return;
        }
        if self.nickname.is_none() {
            self.nickname = Some(std::mem::replace(&mut self.species, species.to_string()));
        } else {
            self.species = species.to_string();
        }
    }

    /// Overwrite species-level details, keeping the name
    pub fn reveal(&mut self, details: &PokemonDetails) {
        self.set_species(&details.species);
        self.level = details.level_or_default();
        self.gender = details.gender;
        self.shiny = details.shiny;
    }
}

/// A known move and its remaining uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveState {
    /// Normalized move id
    pub id: String,
    /// Display name as first seen
    pub name: String,
    pub current_pp: u32,
    /// Zero when the move's PP is unknown; such moves are always usable
    pub max_pp: u32,
}

impl MoveState {
    pub fn new(name: &str, max_pp: u32) -> Self {
        Self {
            id: to_id(name),
            name: name.to_string(),
            current_pp: max_pp,
            max_pp,
        }
    }

    /// Whether the move still has uses left (or its PP is untracked)
    pub fn is_usable(&self) -> bool {
        self.max_pp == 0 || self.current_pp > 0
    }

    /// Spend one use, floored at zero
    pub fn spend(&mut self) {
        self.current_pp = self.current_pp.saturating_sub(1);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PokemonState {
    pub identity: PokemonIdentity,

    /// Out of `hp_max`. Opponents are tracked as a percentage, so their
    /// `hp_max` stays 100.
    pub hp_current: u32,
    pub hp_max: u32,
    pub status: Option<Status>,
    pub active: bool,

    // Reset whenever the Pokemon leaves the field
    pub boosts: StatStages,
    pub volatiles: HashSet<Volatile>,
    /// Species copied with Transform
    pub transformed: Option<String>,
    pub last_move: Option<String>,

    /// In the order they were revealed
    pub moves: Vec<MoveState>,
    pub ability: Option<String>,
    pub item: Option<String>,

    pub tera_type: Option<String>,
    pub terastallized: bool,
    pub mega_evolved: bool,
}

impl PokemonState {
    pub fn new(species: impl Into<String>, level: u8) -> Self {
        Self::with_identity(PokemonIdentity::new(species, level))
    }

    fn with_identity(identity: PokemonIdentity) -> Self {
        Self {
            identity,
            hp_current: 100,
            hp_max: 100,
            status: None,
            active: false,
            boosts: StatStages::new(),
            volatiles: HashSet::new(),
            transformed: None,
            last_move: None,
            moves: Vec::new(),
            ability: None,
            item: None,
            tera_type: None,
            terastallized: false,
            mega_evolved: false,
        }
    }

    pub fn from_protocol(details: &PokemonDetails, name: &str) -> Self {
        let mut state = Self::with_identity(PokemonIdentity::from_protocol(details, name));
        state.tera_type = details.tera_type.clone();
        state
    }

    /// Nickname, falling back to species
    pub fn name(&self) -> &str {
        self.identity.name()
    }

    /// Whether `name` refers to this Pokemon, by nickname or species
    pub fn matches(&self, name: &str) -> bool {
        self.name() == name || self.identity.species == name
    }

    /// Species comparison on normalized ids. A team preview placeholder
    /// such as "Urshifu-*" matches any forme of its base species.
    pub fn species_matches(&self, species: &str) -> bool {
        let ours = &self.identity.species;
        if let Some(base) = ours.strip_suffix("-*") {
            return to_id(species).starts_with(&to_id(base));
        }
        if let Some(base) = species.strip_suffix("-*") {
            return to_id(ours).starts_with(&to_id(base));
        }
        to_id(ours) == to_id(species)
    }

    pub fn hp_percent(&self) -> u32 {
        (self.hp_current * 100).checked_div(self.hp_max).unwrap_or(0)
    }

    pub fn has_volatile(&self, v: &Volatile) -> bool {
        self.volatiles.contains(v)
    }

    pub fn find_move(&self, id: &str) -> Option<&MoveState> {
        self.moves.iter().find(|m| m.id == id)
    }

    /// Moves that still have uses left
    pub fn usable_moves(&self) -> impl Iterator<Item = &MoveState> {
        self.moves.iter().filter(|m| m.is_usable())
    }

    /// Record a move use. Unseen moves are added with `max_pp` uses before
    /// this one is spent; `spend` is false for moves the Pokemon was forced
    /// to repeat.
    pub fn record_move(&mut self, name: &str, max_pp: u32, spend: bool) {
        let id = to_id(name);
        let index = match self.moves.iter().position(|m| m.id == id) {
            Some(index) => index,
            None => {
                self.moves.push(MoveState::new(name, max_pp));
                self.moves.len() - 1
            }
        };
        if spend {
            self.moves[index].spend();
        }
        self.last_move = Some(id);
    }

    /// An absent status leaves the current one in place; "fnt" zeroes HP.
    pub fn apply_hp(&mut self, hp: &HpStatus) {
        if let Some(max) = hp.max.filter(|&m| m > 0) {
            self.hp_max = max;
        }
        self.hp_current = hp.current.min(self.hp_max);

        match hp.status.as_deref() {
            Some("fnt") => self.hp_current = 0,
            Some(other) => {
                if let Some(status) = Status::from_protocol(other) {
                    self.status = Some(status);
                }
            }
            None => {}
        }
    }

    pub fn switch_in(&mut self) {
        self.clear_transient();
        self.active = true;
    }

    pub fn switch_out(&mut self) {
        self.clear_transient();
        self.active = false;
    }

    pub fn faint(&mut self) {
        self.hp_current = 0;
        self.clear_transient();
        self.active = false;
    }

    fn clear_transient(&mut self) {
        self.boosts.clear();
        self.volatiles.clear();
        self.transformed = None;
        self.last_move = None;
    }

    pub fn is_alive(&self) -> bool {
        self.hp_current > 0
    }

    pub fn can_switch_to(&self) -> bool {
        self.is_alive() && !self.active
    }
}

impl Default for PokemonState {
    fn default() -> Self {
        Self::new("Unknown", 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volley_protocol::Stat;

    fn hp(s: &str) -> HpStatus {
        HpStatus::parse(s).unwrap()
    }

    #[test]
    fn test_identity_from_protocol() {
        let details = PokemonDetails::parse("Pikachu, L50, F");
        let ident = PokemonIdentity::from_protocol(&details, "Sparky");
        assert_eq!(ident.name(), "Sparky");
        assert_eq!(ident.level, 50);

        let plain = PokemonIdentity::from_protocol(&details, "Pikachu");
        assert!(plain.nickname.is_none());
    }

    #[test]
    fn test_species_change_keeps_name() {
        let mut ident = PokemonIdentity::new("Garchomp", 80);
        ident.set_species("Garchomp-Mega");
        assert_eq!(ident.species, "Garchomp-Mega");
        assert_eq!(ident.name(), "Garchomp");

        let mut named = PokemonIdentity::from_protocol(&PokemonDetails::parse("Pikachu"), "Sparky");
        named.reveal(&PokemonDetails::parse("Pikachu-Alola, L50"));
        assert_eq!(named.name(), "Sparky");
        assert_eq!(named.level, 50);
    }

    #[test]
    fn test_pokemon_state_new() {
        let state = PokemonState::new("Charizard", 100);
        assert_eq!(state.identity.species, "Charizard");
        assert_eq!(state.hp_current, 100);
        assert_eq!(state.hp_max, 100);
        assert!(state.is_alive());
        assert!(!state.active);
        assert!(state.boosts.is_clear());
    }

    #[test]
    fn test_species_matches_placeholder() {
        let placeholder = PokemonState::new("Urshifu-*", 100);
        assert!(placeholder.species_matches("Urshifu-Rapid-Strike"));
        assert!(!placeholder.species_matches("Garchomp"));

        let state = PokemonState::new("Great Tusk", 100);
        assert!(state.species_matches("greattusk"));
    }

    #[test]
    fn test_apply_hp_clamps_and_keeps_status() {
        let mut state = PokemonState::new("Test", 100);
        state.apply_hp(&hp("80/100 brn"));
        assert_eq!(state.hp_current, 80);
        assert_eq!(state.status, Some(Status::Burn));

        state.apply_hp(&hp("60/100"));
        assert_eq!(state.hp_current, 60);
        assert_eq!(state.status, Some(Status::Burn));

        state.apply_hp(&hp("500/100"));
        assert_eq!(state.hp_current, 100);

        state.apply_hp(&hp("0 fnt"));
        assert_eq!(state.hp_current, 0);
        assert_eq!(state.hp_max, 100);
        assert!(!state.is_alive());
    }

    #[test]
    fn test_switch_clears_transient_state() {
        let mut state = PokemonState::new("Test", 100);
        state.active = true;
        state.boosts.set(Stat::Atk, 2);
        state.volatiles.insert(Volatile::Confusion);
        state.item = Some("Leftovers".to_string());
        state.mega_evolved = true;
        state.record_move("Thunderbolt", 24, true);

        state.switch_out();
        assert!(!state.active);
        assert!(state.boosts.is_clear());
        assert!(state.volatiles.is_empty());
        assert!(state.last_move.is_none());

        state.switch_in();
        assert!(state.active);
        assert_eq!(state.item.as_deref(), Some("Leftovers"));
        assert!(state.mega_evolved);
        assert_eq!(state.moves.len(), 1);
    }

    #[test]
    fn test_record_move() {
        let mut state = PokemonState::new("Test", 100);
        state.record_move("Thunderbolt", 24, true);
        state.record_move("Quick Attack", 0, true);
        state.record_move("Thunderbolt", 24, true);
        state.record_move("Thunderbolt", 24, false);

        assert_eq!(state.moves.len(), 2);
        let tbolt = state.find_move("thunderbolt").unwrap();
        assert_eq!(tbolt.current_pp, 22);
        assert_eq!(tbolt.name, "Thunderbolt");
        assert!(state.find_move("quickattack").unwrap().is_usable());
        assert_eq!(state.last_move.as_deref(), Some("thunderbolt"));
    }

    #[test]
    fn test_pp_floors_at_zero() {
        let mut state = PokemonState::new("Test", 100);
        state.record_move("Hyper Beam", 1, true);
        state.record_move("Hyper Beam", 1, true);
        let beam = state.find_move("hyperbeam").unwrap();
        assert_eq!(beam.current_pp, 0);
        assert!(!beam.is_usable());
        assert_eq!(state.usable_moves().count(), 0);
    }
}
