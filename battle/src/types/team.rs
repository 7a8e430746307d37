//! Team (one side's) state

use std::collections::BTreeMap;
use std::sync::Arc;

use volley_protocol::{Player, PokemonIdent};

use super::conditions::SideCondition;
use super::pokemon::PokemonState;

/// Roster size assumed until `teamsize` says otherwise
pub const MAX_TEAM_SIZE: usize = 6;

/// One player's side of the battle.
///
/// Roster members sit behind `Arc` so a reduced state shares every member
/// it did not touch with its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamState {
    /// Player identifier (P1, P2)
    pub player: Player,

    /// Player's username
    pub username: String,

    /// Pokemon on this side, in reveal order
    pub pokemon: Vec<Arc<PokemonState>>,

    /// Roster index of the active Pokemon, None until the first switch-in
    pub active_index: Option<usize>,

    /// Side conditions. Hazards map to their layer count, timed conditions
    /// to their remaining turns.
    pub conditions: BTreeMap<SideCondition, u8>,

    /// Team size announced by `teamsize`
    pub team_size: Option<usize>,
}

impl TeamState {
    /// Create a new side state
    pub fn new(player: Player) -> Self {
        Self {
            player,
            username: String::new(),
            pokemon: Vec::new(),
            active_index: None,
            conditions: BTreeMap::new(),
            team_size: None,
        }
    }

    /// The active Pokemon
    pub fn active(&self) -> Option<&PokemonState> {
        self.active_index
            .and_then(|idx| self.pokemon.get(idx))
            .map(Arc::as_ref)
    }

    /// Find a Pokemon by name (nickname or species)
    pub fn find_pokemon(&self, name: &str) -> Option<usize> {
        self.pokemon.iter().position(|p| p.matches(name))
    }

    /// Resolve a protocol ident to a roster index.
    ///
    /// A positioned ident ("p1a: X") prefers the active Pokemon when its
    /// name matches, since a benched Pokemon may share the species.
    pub fn locate(&self, ident: &PokemonIdent) -> Option<usize> {
        if ident.position.is_some() {
            if let Some(idx) = self.active_index {
                if self.pokemon.get(idx).is_some_and(|p| p.matches(&ident.name)) {
                    return Some(idx);
                }
            }
        }

        self.find_pokemon(&ident.name)
    }

    /// Apply `f` to the Pokemon at `idx`, cloning it only if it is shared
    pub fn update<R>(&mut self, idx: usize, f: impl FnOnce(&mut PokemonState) -> R) -> Option<R> {
        self.pokemon.get_mut(idx).map(|p| f(Arc::make_mut(p)))
    }

    /// Add a Pokemon to the roster, returning its index
    pub fn push(&mut self, pokemon: PokemonState) -> usize {
        self.pokemon.push(Arc::new(pokemon));
        self.pokemon.len() - 1
    }

    /// Mark the active Pokemon as switched out and clear the active slot
    pub fn clear_active(&mut self) {
        if let Some(idx) = self.active_index.take() {
            self.update(idx, PokemonState::switch_out);
        }
    }

    /// Iterate over bench Pokemon (not active, not fainted)
    pub fn bench(&self) -> impl Iterator<Item = (usize, &PokemonState)> {
        let active = self.active_index;
        self.pokemon
            .iter()
            .enumerate()
            .filter(move |(idx, p)| Some(*idx) != active && p.is_alive())
            .map(|(idx, p)| (idx, p.as_ref()))
    }

    /// Count non-fainted Pokemon
    pub fn alive_count(&self) -> usize {
        self.pokemon.iter().filter(|p| p.is_alive()).count()
    }

    /// Every member has fainted. Unrevealed members count as standing, so
    /// this needs the full roster (`team_size`, else 6) to be known.
    pub fn all_fainted(&self) -> bool {
        let roster_known = self.pokemon.len() >= self.team_size.unwrap_or(MAX_TEAM_SIZE);
        roster_known && self.pokemon.iter().all(|p| !p.is_alive())
    }

    /// Check if side has a condition
    pub fn has_condition(&self, cond: SideCondition) -> bool {
        self.conditions.contains_key(&cond)
    }

    /// Get layers for a condition (0 if not present)
    pub fn condition_layers(&self, cond: SideCondition) -> u8 {
        self.conditions.get(&cond).copied().unwrap_or(0)
    }

    /// Add a side condition. Hazards gain a layer up to their cap; timed
    /// conditions (re)start their duration. Returns false if nothing changed.
    pub fn add_condition(&mut self, cond: SideCondition) -> bool {
        let value = self.conditions.entry(cond).or_insert(0);
        let before = *value;

        *value = match cond.duration() {
            Some(turns) => turns,
            None => before.saturating_add(1).min(cond.max_layers()),
        };

        *value != before
    }

    /// Remove a side condition. Removing an absent condition is a no-op.
    pub fn remove_condition(&mut self, cond: SideCondition) -> bool {
        self.conditions.remove(&cond).is_some()
    }

    /// End-of-turn tick for timed conditions. Expiry still waits for the
    /// server's explicit end message.
    pub fn upkeep(&mut self) {
        for (cond, turns) in self.conditions.iter_mut() {
            if cond.duration().is_some() {
                *turns = turns.saturating_sub(1);
            }
        }
    }

    /// Check if any hazards are set
    pub fn has_hazards(&self) -> bool {
        self.conditions.keys().any(|c| c.is_hazard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team_with(names: &[&str]) -> TeamState {
        let mut team = TeamState::new(Player::P1);
        for name in names {
            team.push(PokemonState::new(*name, 100));
        }
        team
    }

    #[test]
    fn test_locate_prefers_active() {
        let mut team = team_with(&["Rotom", "Rotom"]);
        team.active_index = Some(1);

        let active = PokemonIdent::parse("p1a: Rotom").unwrap();
        assert_eq!(team.locate(&active), Some(1));

        let benched = PokemonIdent::parse("p1: Rotom").unwrap();
        assert_eq!(team.locate(&benched), Some(0));

        let missing = PokemonIdent::parse("p1a: Someone Else").unwrap();
        assert_eq!(team.locate(&missing), None);
    }

    #[test]
    fn test_hazard_layers_are_capped() {
        let mut team = TeamState::new(Player::P2);
        for _ in 0..5 {
            team.add_condition(SideCondition::Spikes);
            team.add_condition(SideCondition::ToxicSpikes);
            team.add_condition(SideCondition::StealthRock);
        }
        assert_eq!(team.condition_layers(SideCondition::Spikes), 3);
        assert_eq!(team.condition_layers(SideCondition::ToxicSpikes), 2);
        assert_eq!(team.condition_layers(SideCondition::StealthRock), 1);
        assert!(!team.add_condition(SideCondition::Spikes));
    }

    #[test]
    fn test_timed_conditions_tick_down() {
        let mut team = TeamState::new(Player::P1);
        team.add_condition(SideCondition::Reflect);
        team.add_condition(SideCondition::Spikes);
        team.upkeep();
        assert_eq!(team.condition_layers(SideCondition::Reflect), 4);
        assert_eq!(team.condition_layers(SideCondition::Spikes), 1);

        for _ in 0..10 {
            team.upkeep();
        }
        assert_eq!(team.condition_layers(SideCondition::Reflect), 0);
        assert!(team.has_condition(SideCondition::Reflect));

        assert!(team.remove_condition(SideCondition::Reflect));
        assert!(!team.remove_condition(SideCondition::Reflect));
    }

    #[test]
    fn test_update_shares_untouched_members() {
        let team = team_with(&["Pikachu", "Garchomp"]);
        let mut next = team.clone();
        next.update(0, |p| p.hp_current = 50);

        assert_eq!(team.pokemon[0].hp_current, 100);
        assert_eq!(next.pokemon[0].hp_current, 50);
        assert!(Arc::ptr_eq(&team.pokemon[1], &next.pokemon[1]));
        assert!(!Arc::ptr_eq(&team.pokemon[0], &next.pokemon[0]));
    }

    #[test]
    fn test_all_fainted_needs_full_roster() {
        let mut team = TeamState::new(Player::P1);
        team.team_size = Some(2);
        assert!(!team.all_fainted());

        team.push(PokemonState::new("Pikachu", 100));
        team.update(0, PokemonState::faint);
        assert!(!team.all_fainted());

        team.push(PokemonState::new("Raichu", 100));
        team.update(1, PokemonState::faint);
        assert!(team.all_fainted());
    }

    #[test]
    fn test_unrevealed_members_count_as_standing() {
        let mut team = TeamState::new(Player::P2);
        team.push(PokemonState::new("Garchomp", 100));
        team.update(0, PokemonState::faint);
        assert!(!team.all_fainted());
    }
}
