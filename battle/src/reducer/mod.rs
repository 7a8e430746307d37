//! The pure battle reducer.
//!
//! [`Reducer::apply`] folds one [`BattleEvent`] into a [`BattleState`] and
//! returns the next state. The input is never modified: the reducer works on
//! a shallow clone and `Arc::make_mut` copies only the team, Pokemon or
//! field it actually changes.

mod inference;
mod request;

use std::sync::Arc;

use volley_protocol::{
    BattleEvent, EventKind, HpStatus, PokemonDetails, PokemonIdent, to_id,
};

use crate::ReduceError;
use crate::dex::{Dex, MoveTable};
use crate::types::{
    BattleState, PokemonIdentity, PokemonState, SideCondition, Status, TeamState, Volatile,
};

pub use inference::{infer_moves, infer_switches};

/// Applies battle events to states, with an injected move data source
#[derive(Clone)]
pub struct Reducer {
    dex: Arc<dyn Dex>,
}

impl std::fmt::Debug for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reducer").finish_non_exhaustive()
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new(Arc::new(MoveTable::new()))
    }
}

impl Reducer {
    pub fn new(dex: Arc<dyn Dex>) -> Self {
        Self { dex }
    }

    /// Apply every event in order, stopping at the first failure
    pub fn apply_all<'a>(
        &self,
        state: &BattleState,
        events: impl IntoIterator<Item = &'a BattleEvent>,
    ) -> Result<BattleState, ReduceError> {
        let mut current = state.clone();
        for event in events {
            current = self.apply(&current, event)?;
        }
        Ok(current)
    }

    /// Apply one event, returning the next state
    pub fn apply(&self, state: &BattleState, event: &BattleEvent) -> Result<BattleState, ReduceError> {
        let mut next = state.clone();

        match &event.kind {
            // === Battle progress ===
            EventKind::Turn { number } => next.field_mut().set_turn(*number),

            EventKind::Upkeep => {
                next.field_mut().upkeep();
                for team in next.teams_mut() {
                    team.upkeep();
                }
            }

            EventKind::Win { winner } => {
                next.ended = true;
                next.winner = Some(winner.clone());
            }

            EventKind::Tie => {
                next.ended = true;
                next.tie = true;
            }

            EventKind::Request { json } => self.apply_request(&mut next, json),

            // === Battle initialization ===
            EventKind::Player { side, username, .. } => {
                next.team_mut(*side)?.username = username.clone();
            }

            EventKind::TeamSize { side, size } => {
                next.team_mut(*side)?.team_size = Some(*size as usize);
            }

            EventKind::Gen(generation) => next.format_mut().generation = *generation,

            EventKind::Tier(tier) => next.format_mut().tier = tier.clone(),

            EventKind::GameType(game_type) => next.format_mut().game_type = Some(*game_type),

            EventKind::Poke { side, details, .. } => {
                let team = next.team_mut(*side)?;
                if !team.pokemon.iter().any(|p| p.species_matches(&details.species)) {
                    team.push(PokemonState::from_protocol(details, ""));
                }
            }

            // === Major actions ===
            EventKind::Switch { pokemon, details, hp } | EventKind::Drag { pokemon, details, hp } => {
                switch_in(&mut next, pokemon, details, hp.as_ref())?;
            }

            EventKind::Replace { pokemon, details, hp } => {
                replace(&mut next, pokemon, details, hp.as_ref())?;
            }

            EventKind::DetailsChange { pokemon, details, hp } => {
                update_pokemon(&mut next, pokemon, |p| {
                    p.identity.reveal(details);
                    if let Some(hp) = hp {
                        p.apply_hp(hp);
                    }
                })?;
                deactivate_if_fainted(&mut next, pokemon)?;
            }

            EventKind::Faint { pokemon } => {
                update_pokemon(&mut next, pokemon, PokemonState::faint)?;
                deactivate_if_fainted(&mut next, pokemon)?;
            }

            EventKind::Move {
                pokemon, move_name, from, ..
            } => {
                // Moves called through another effect (Sleep Talk, Magic
                // Bounce, ...) are not part of the moveset. Locked repeats
                // are, but cost no PP.
                let spend = match from.as_deref().map(to_id) {
                    None => true,
                    Some(source) if source == "lockedmove" => false,
                    Some(_) => return Ok(next),
                };
                let max_pp = self.dex.max_pp(move_name).unwrap_or(0);
                update_pokemon(&mut next, pokemon, |p| {
                    p.record_move(move_name, max_pp, spend);
                    let id = to_id(move_name);
                    p.volatiles.remove(&Volatile::TwoTurnMove(id));
                })?;
            }

            EventKind::Cant { pokemon, reason, .. } => {
                if to_id(reason) == "recharge" {
                    update_pokemon(&mut next, pokemon, |p| {
                        p.volatiles.remove(&Volatile::Recharging);
                    })?;
                }
            }

            // === HP and status ===
            EventKind::Damage { pokemon, hp, .. }
            | EventKind::Heal { pokemon, hp, .. }
            | EventKind::SetHp { pokemon, hp } => {
                if let Some(hp) = hp {
                    update_pokemon(&mut next, pokemon, |p| p.apply_hp(hp))?;
                    deactivate_if_fainted(&mut next, pokemon)?;
                }
            }

            EventKind::Status { pokemon, status, .. } => {
                let status = Status::from_protocol(status);
                update_pokemon(&mut next, pokemon, |p| p.status = status)?;
            }

            EventKind::CureStatus { pokemon, .. } => {
                update_pokemon(&mut next, pokemon, |p| p.status = None)?;
            }

            EventKind::CureTeam { pokemon } => {
                let team = next.team_mut(pokemon.side)?;
                for idx in 0..team.pokemon.len() {
                    if team.pokemon[idx].status.is_some() {
                        team.update(idx, |p| p.status = None);
                    }
                }
            }

            // === Stat stages ===
            EventKind::Boost { pokemon, stat, amount } => {
                update_pokemon(&mut next, pokemon, |p| {
                    p.boosts.boost(*stat, *amount);
                })?;
            }

            EventKind::Unboost { pokemon, stat, amount } => {
                update_pokemon(&mut next, pokemon, |p| {
                    p.boosts.unboost(*stat, *amount);
                })?;
            }

            EventKind::SetBoost { pokemon, stat, stage } => {
                update_pokemon(&mut next, pokemon, |p| p.boosts.set(*stat, *stage))?;
            }

            EventKind::ClearBoost { pokemon } => {
                update_pokemon(&mut next, pokemon, |p| p.boosts.clear())?;
            }

            EventKind::ClearPositiveBoost { pokemon } => {
                update_pokemon(&mut next, pokemon, |p| p.boosts.clear_positive())?;
            }

            EventKind::ClearNegativeBoost { pokemon } => {
                update_pokemon(&mut next, pokemon, |p| p.boosts.clear_negative())?;
            }

            EventKind::InvertBoost { pokemon } => {
                update_pokemon(&mut next, pokemon, |p| p.boosts.invert())?;
            }

            EventKind::ClearAllBoost => {
                for team in next.teams_mut() {
                    for idx in 0..team.pokemon.len() {
                        if !team.pokemon[idx].boosts.is_clear() {
                            team.update(idx, |p| p.boosts.clear());
                        }
                    }
                }
            }

            // === Revealed information ===
            EventKind::Ability { pokemon, ability, .. } => {
                let known = locate(&next, pokemon)
                    .map(|(team, idx)| team.pokemon[idx].ability.is_some())?;
                if !known {
                    update_pokemon(&mut next, pokemon, |p| p.ability = Some(ability.clone()))?;
                }
            }

            EventKind::EndAbility { pokemon } => {
                update_pokemon(&mut next, pokemon, |p| {
                    p.volatiles.insert(Volatile::GastroAcid);
                })?;
            }

            EventKind::Item { pokemon, item, .. } => {
                update_pokemon(&mut next, pokemon, |p| p.item = Some(item.clone()))?;
            }

            EventKind::EndItem { pokemon, .. } => {
                update_pokemon(&mut next, pokemon, |p| p.item = None)?;
            }

            // === Volatile conditions ===
            EventKind::StartVolatile { pokemon, effect, .. } => {
                update_pokemon(&mut next, pokemon, |p| {
                    p.volatiles.insert(Volatile::from_protocol(effect));
                })?;
            }

            EventKind::EndVolatile { pokemon, effect, .. } => {
                update_pokemon(&mut next, pokemon, |p| {
                    p.volatiles.remove(&Volatile::from_protocol(effect));
                })?;
            }

            EventKind::Prepare { pokemon, move_name, .. } => {
                update_pokemon(&mut next, pokemon, |p| {
                    p.volatiles.insert(Volatile::TwoTurnMove(to_id(move_name)));
                })?;
            }

            // === Field ===
            EventKind::Weather { weather, upkeep, .. } => {
                // "[upkeep]" only announces that the weather continues
                if !*upkeep {
                    next.field_mut().set_weather(weather);
                }
            }

            EventKind::FieldStart { condition, .. } => next.field_mut().start(condition),

            EventKind::FieldEnd { condition } => next.field_mut().end(condition),

            EventKind::SideStart { side, condition } => match SideCondition::from_protocol(condition) {
                Some(cond) => {
                    next.team_mut(*side)?.add_condition(cond);
                }
                None => tracing::warn!(%side, condition, "Unknown side condition"),
            },

            EventKind::SideEnd { side, condition, .. } => {
                if let Some(cond) = SideCondition::from_protocol(condition) {
                    // Ending is idempotent whatever removed the condition
                    if next.team(*side).is_some_and(|t| t.has_condition(cond)) {
                        next.team_mut(*side)?.remove_condition(cond);
                    }
                }
            }

            // === Transformations ===
            EventKind::Terastallize { pokemon, tera_type } => {
                update_pokemon(&mut next, pokemon, |p| {
                    p.terastallized = true;
                    p.tera_type = Some(tera_type.clone());
                })?;
            }

            EventKind::FormeChange { pokemon, species, hp } => {
                update_pokemon(&mut next, pokemon, |p| {
                    p.identity.set_species(species);
                    if let Some(hp) = hp {
                        p.apply_hp(hp);
                    }
                })?;
            }

            EventKind::Transform { pokemon, target } => {
                let species = locate(&next, target)
                    .map(|(team, idx)| team.pokemon[idx].identity.species.clone())
                    .unwrap_or_else(|_| target.name.clone());
                update_pokemon(&mut next, pokemon, |p| p.transformed = Some(species))?;
            }

            EventKind::Mega { pokemon, .. } => {
                update_pokemon(&mut next, pokemon, |p| p.mega_evolved = true)?;
            }

            // === Informational, no state change ===
            EventKind::Start
            | EventKind::TeamPreview { .. }
            | EventKind::ClearPoke
            | EventKind::SingleTurn { .. }
            | EventKind::SingleMove { .. }
            | EventKind::Activate { .. }
            | EventKind::SuperEffective { .. }
            | EventKind::Resisted { .. }
            | EventKind::Immune { .. }
            | EventKind::Crit { .. }
            | EventKind::Miss { .. }
            | EventKind::Fail { .. }
            | EventKind::HitCount { .. }
            | EventKind::PrivateMessage { .. }
            | EventKind::Popup { .. }
            | EventKind::Error { .. }
            | EventKind::Ignored => {}

            EventKind::Unknown { tag } => {
                tracing::debug!(tag, raw = %event.raw, "Passing through unknown event");
            }
        }

        Ok(next)
    }
}

/// Resolve an ident against the current state
fn locate<'a>(
    state: &'a BattleState,
    ident: &PokemonIdent,
) -> Result<(&'a TeamState, usize), ReduceError> {
    let team = state
        .team(ident.side)
        .ok_or_else(|| ReduceError::SideNotFound(ident.side.to_string()))?;
    let idx = team.locate(ident).ok_or_else(|| not_found(ident))?;
    Ok((team, idx))
}

fn not_found(ident: &PokemonIdent) -> ReduceError {
    ReduceError::PokemonNotFound {
        side: ident.side.to_string(),
        name: ident.name.clone(),
    }
}

/// Apply `f` to the Pokemon `ident` refers to
fn update_pokemon(
    state: &mut BattleState,
    ident: &PokemonIdent,
    f: impl FnOnce(&mut PokemonState),
) -> Result<(), ReduceError> {
    let team = state.team_mut(ident.side)?;
    let idx = team.locate(ident).ok_or_else(|| not_found(ident))?;
    team.update(idx, f);
    Ok(())
}

/// A Pokemon at zero HP leaves the active slot
fn deactivate_if_fainted(state: &mut BattleState, ident: &PokemonIdent) -> Result<(), ReduceError> {
    let (team, idx) = locate(state, ident)?;
    let member = &team.pokemon[idx];
    if member.is_alive() || (!member.active && team.active_index != Some(idx)) {
        return Ok(());
    }

    let team = state.team_mut(ident.side)?;
    team.update(idx, PokemonState::faint);
    if team.active_index == Some(idx) {
        team.active_index = None;
    }
    Ok(())
}

/// `switch` and `drag`: the previous active Pokemon leaves and the incoming
/// one enters with no boosts and no volatiles
fn switch_in(
    state: &mut BattleState,
    ident: &PokemonIdent,
    details: &PokemonDetails,
    hp: Option<&HpStatus>,
) -> Result<(), ReduceError> {
    let team = state.team_mut(ident.side)?;
    team.clear_active();

    let existing = team
        .find_pokemon(&ident.name)
        .or_else(|| team.pokemon.iter().position(|p| p.species_matches(&details.species)));

    let enter = |p: &mut PokemonState| {
        let nickname = p.identity.nickname.clone();
        p.identity.reveal(details);
        p.identity.nickname = nickname.or_else(|| {
            (ident.name != details.species).then(|| ident.name.clone())
        });
        if let Some(hp) = hp {
            p.apply_hp(hp);
        }
        p.switch_in();
    };

    let idx = match existing {
        Some(idx) => {
            team.update(idx, enter);
            idx
        }
        None => {
            let mut incoming = PokemonState::from_protocol(details, &ident.name);
            enter(&mut incoming);
            team.push(incoming)
        }
    };

    if team.pokemon[idx].is_alive() {
        team.active_index = Some(idx);
    } else {
        team.update(idx, PokemonState::faint);
    }
    Ok(())
}

/// `replace`: the active Pokemon's true identity is revealed (Illusion).
/// Unlike a switch, boosts and volatiles stay.
fn replace(
    state: &mut BattleState,
    ident: &PokemonIdent,
    details: &PokemonDetails,
    hp: Option<&HpStatus>,
) -> Result<(), ReduceError> {
    let team = state.team_mut(ident.side)?;
    let idx = team.active_index.ok_or_else(|| not_found(ident))?;
    let revealed = PokemonIdentity::from_protocol(details, &ident.name);

    team.update(idx, |p| {
        p.identity = revealed;
        if let Some(hp) = hp {
            p.apply_hp(hp);
        }
    });

    // A benched entry for the revealed Pokemon (from team preview or an
    // earlier switch) now duplicates the active one
    let active = Arc::clone(&team.pokemon[idx]);
    let mut i = 0;
    team.pokemon.retain(|p| {
        let keep = i == idx || !(p.matches(&ident.name) && p.species_matches(&active.identity.species));
        i += 1;
        keep
    });
    team.active_index = team.pokemon.iter().position(|p| Arc::ptr_eq(p, &active));
    Ok(())
}
