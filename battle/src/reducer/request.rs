//! The `|request|` arm of the reducer

use std::collections::BTreeSet;
use std::sync::Arc;

use volley_protocol::{BattleRequest, Player, SidePokemon, to_id};

use super::Reducer;
use super::inference::{infer_moves, infer_switches};
use crate::types::{
    BattleState, LegalActions, MoveOption, MoveState, PokemonIdentity, PokemonState, Status,
    SwitchOption, TeamState, Volatile,
};

const CHOICE_ITEMS: [&str; 3] = ["choiceband", "choicescarf", "choicespecs"];

impl Reducer {
    /// Fold a request payload into the state.
    ///
    /// The payload is the authority on our own team and on what we may do
    /// next. A payload that does not parse leaves the state untouched.
    pub(super) fn apply_request(&self, next: &mut BattleState, json: &str) {
        if json.trim().is_empty() {
            tracing::debug!("Empty request");
            return;
        }

        let request = match BattleRequest::parse(json) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unparseable request");
                return;
            }
        };

        if request.wait {
            tracing::debug!("Wait request, opponent is choosing");
            next.legal = Arc::new(LegalActions {
                waiting: true,
                ..LegalActions::default()
            });
            return;
        }

        let player = request.player().unwrap_or(Player::P1);
        if next.our_side.is_none() {
            next.our_side = Some(player);
        }

        let legal = legal_actions(&request);
        if let Some(team) = next.team(player) {
            cross_check(team, &request, &legal);
        }

        if let Ok(team) = next.team_mut(player) {
            if let Some(side) = &request.side {
                self.rebuild_roster(team, &side.pokemon);
            }
            sync_active(team, &request);
        }

        if next.our_side == Some(player) {
            next.legal = Arc::new(legal);
            next.rqid = request.rqid;
        }
    }

    /// Replace the roster with the request's, carrying over what the request
    /// does not know (volatiles, boosts, last move) from matching members
    fn rebuild_roster(&self, team: &mut TeamState, members: &[SidePokemon]) {
        let mut claimed = vec![false; team.pokemon.len()];
        let mut roster = Vec::with_capacity(members.len());

        for member in members {
            let details = member.details();
            let name = member.name();

            let existing = (0..team.pokemon.len()).find(|&i| {
                let p = &team.pokemon[i];
                !claimed[i]
                    && p.species_matches(&details.species)
                    && (p.matches(name) || p.identity.nickname.is_none())
            });

            let mut rebuilt = match existing {
                Some(i) => {
                    claimed[i] = true;
                    (*team.pokemon[i]).clone()
                }
                None => PokemonState::from_protocol(&details, name),
            };

            rebuilt.identity = PokemonIdentity::from_protocol(&details, name);
            if let Some(hp) = member.hp_status() {
                rebuilt.apply_hp(&hp);
                rebuilt.status = hp.ailment().and_then(Status::from_protocol);
            }
            rebuilt.item = non_empty(&member.item);
            rebuilt.ability = non_empty(&member.ability).or_else(|| non_empty(&member.base_ability));
            if member.tera_type.is_some() {
                rebuilt.tera_type = member.tera_type.clone();
            }
            rebuilt.terastallized = member.terastallized.as_deref().is_some_and(|t| !t.is_empty());
            rebuilt.moves = member
                .moves
                .iter()
                .map(|id| {
                    rebuilt
                        .find_move(&to_id(id))
                        .cloned()
                        .unwrap_or_else(|| MoveState::new(id, self.dex.max_pp(id).unwrap_or(0)))
                })
                .collect();
            rebuilt.active = member.active && rebuilt.is_alive();

            let arc = match existing {
                Some(i) if *team.pokemon[i] == rebuilt => Arc::clone(&team.pokemon[i]),
                _ => Arc::new(rebuilt),
            };
            roster.push(arc);
        }

        team.active_index = roster.iter().position(|p| p.active);
        team.pokemon = roster;
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// What the request says we may do
fn legal_actions(request: &BattleRequest) -> LegalActions {
    let mut legal = LegalActions {
        force_switch: request.is_force_switch(),
        team_preview: request.team_preview,
        ..LegalActions::default()
    };

    if let Some(active) = request.first_active() {
        if !legal.force_switch && !legal.team_preview {
            legal.moves = active
                .enabled_moves()
                .map(|(slot, m)| MoveOption {
                    slot,
                    id: m.move_id(),
                    name: m.name.clone(),
                })
                .collect();
        }
        legal.can_mega = active.can_mega_evo;
        legal.can_tera = active.can_terastallize.clone();
        legal.can_dynamax = active.can_dynamax;
        legal.trapped = active.trapped;
    }

    if !legal.trapped || legal.force_switch {
        legal.switches = request
            .available_switches()
            .into_iter()
            .map(|(slot, p)| SwitchOption {
                slot,
                species: p.species().to_string(),
            })
            .collect();
    }

    legal
}

/// Log where the tracked state disagrees with the server
fn cross_check(team: &TeamState, request: &BattleRequest, legal: &LegalActions) {
    if team.active().is_none() {
        return;
    }

    if request.first_active().is_some() && !legal.team_preview && !legal.force_switch {
        let inferred: BTreeSet<String> = infer_moves(team).into_iter().collect();
        let actual: BTreeSet<String> = legal.moves.iter().map(|m| m.id.clone()).collect();
        if inferred != actual {
            tracing::info!(side = %team.player, ?inferred, ?actual, "Move inference differs from request");
        }
    }

    if !legal.team_preview {
        let inferred: BTreeSet<String> =
            infer_switches(team, legal.force_switch).into_iter().collect();
        let actual: BTreeSet<String> = legal.switches.iter().map(|s| to_id(&s.species)).collect();
        if inferred != actual {
            tracing::info!(side = %team.player, ?inferred, ?actual, "Switch inference differs from request");
        }
    }
}

/// Copy exact PP from the active slot and track choice locks
fn sync_active(team: &mut TeamState, request: &BattleRequest) {
    let (Some(idx), Some(active)) = (team.active_index, request.first_active()) else {
        return;
    };

    let mut synced = (*team.pokemon[idx]).clone();
    for slot in active.moves.iter().filter(|m| m.max_pp > 0) {
        let id = slot.move_id();
        match synced.moves.iter_mut().find(|m| m.id == id) {
            Some(known) => {
                known.current_pp = slot.pp;
                known.max_pp = slot.max_pp;
            }
            None => {
                let mut known = MoveState::new(&slot.name, slot.max_pp);
                known.current_pp = slot.pp;
                synced.moves.push(known);
            }
        }
    }

    synced.volatiles.retain(|v| !matches!(v, Volatile::ChoiceLock(_)));
    let holds_choice_item = synced
        .item
        .as_deref()
        .is_some_and(|item| CHOICE_ITEMS.contains(&to_id(item).as_str()));
    let mut enabled = active.enabled_moves();
    if let (true, Some((_, only)), None) = (holds_choice_item, enabled.next(), enabled.next()) {
        synced.volatiles.insert(Volatile::ChoiceLock(only.move_id()));
    }

    // Keep sharing the member with the previous state when nothing moved
    if *team.pokemon[idx] != synced {
        team.pokemon[idx] = Arc::new(synced);
    }
}
